use fc_core::{CoreError, Tick, VehicleId, VehicleTypeId};
use fc_infra::InfraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("{vehicle}: tasks starting at {first} and {second} overlap")]
    OverlappingTasks {
        vehicle: VehicleId,
        first:   Tick,
        second:  Tick,
    },

    #[error("{vehicle}: task starting at {start} ends at {end}, not after its start")]
    EmptyTask {
        vehicle: VehicleId,
        start:   Tick,
        end:     Tick,
    },

    #[error("{vehicle}: drive at {start} needs {required:.3} SOC but at most {available:.3} is usable")]
    InsufficientEnergy {
        vehicle:   VehicleId,
        start:     Tick,
        required:  f64,
        available: f64,
    },

    #[error("{vehicle} at {tick}: drive needs {required:.3} SOC, SOC is {soc:.3} with minimum {soc_min:.3}")]
    InfeasibleSchedule {
        vehicle:  VehicleId,
        tick:     Tick,
        soc:      f64,
        required: f64,
        soc_min:  f64,
    },

    #[error("vehicle type {0} not found")]
    VehicleTypeNotFound(VehicleTypeId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("unknown vehicle {0:?}")]
    UnknownVehicle(String),

    #[error("unknown vehicle type {0:?}")]
    UnknownVehicleType(String),

    #[error("duplicate {what} name {name:?}")]
    DuplicateName { what: &'static str, name: String },

    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    #[error("{0}: tasks can only be changed before the run starts")]
    TasksLocked(VehicleId),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Task-list problems detected before the run.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::OverlappingTasks { .. } | Self::EmptyTask { .. } | Self::InsufficientEnergy { .. }
        )
    }

    /// References to entities absent from the fleet or infrastructure.
    pub fn is_unknown_reference(&self) -> bool {
        match self {
            Self::VehicleTypeNotFound(_)
            | Self::VehicleNotFound(_)
            | Self::UnknownVehicle(_)
            | Self::UnknownVehicleType(_) => true,
            Self::Infra(e) => e.is_unknown_reference(),
            _ => false,
        }
    }
}

pub type FleetResult<T> = Result<T, FleetError>;
