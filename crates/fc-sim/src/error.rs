use std::fmt;

use fc_charge::ChargeError;
use fc_core::{CoreError, Tick, VehicleId};
use fc_fleet::FleetError;
use fc_infra::InfraError;
use thiserror::Error;

/// When an error can occur.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Before the first step: scenario and task-list checks.
    PreRun,
    /// While stepping.
    InRun,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreRun => "pre-run",
            Self::InRun => "in-run",
        })
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("task list validation failed: {0}")]
    Validation(FleetError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("grid data out of range: {0}")]
    DataRange(InfraError),

    #[error(
        "infeasible schedule: {vehicle} at {tick} needs {required:.3} SOC with {soc:.3} left (minimum {soc_min:.3})"
    )]
    InfeasibleSchedule {
        vehicle:  VehicleId,
        tick:     Tick,
        soc:      f64,
        required: f64,
        soc_min:  f64,
    },

    #[error("charging oracle contract violated: {0}")]
    Oracle(ChargeError),

    #[error("run aborted before {0}")]
    Aborted(Tick),
}

impl SimError {
    pub fn phase(&self) -> ErrorPhase {
        match self {
            Self::Validation(_) | Self::Configuration(_) => ErrorPhase::PreRun,
            _ => ErrorPhase::InRun,
        }
    }

    /// The vehicle that triggered the error, where one is known.
    pub fn vehicle(&self) -> Option<VehicleId> {
        match self {
            Self::InfeasibleSchedule { vehicle, .. } => Some(*vehicle),
            Self::Validation(
                FleetError::OverlappingTasks { vehicle, .. }
                | FleetError::EmptyTask { vehicle, .. }
                | FleetError::InsufficientEnergy { vehicle, .. },
            ) => Some(*vehicle),
            Self::Oracle(
                ChargeError::OracleOverDelivery { vehicle, .. } | ChargeError::OracleInvalid { vehicle, .. },
            ) => Some(*vehicle),
            _ => None,
        }
    }
}

impl From<InfraError> for SimError {
    fn from(e: InfraError) -> Self {
        match e {
            InfraError::OutOfRange { .. } => Self::DataRange(e),
            other => Self::Configuration(other.to_string()),
        }
    }
}

impl From<FleetError> for SimError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::InfeasibleSchedule { vehicle, tick, soc, required, soc_min } => {
                Self::InfeasibleSchedule { vehicle, tick, soc, required, soc_min }
            }
            FleetError::Infra(inner) => inner.into(),
            e if e.is_validation() => Self::Validation(e),
            other => Self::Configuration(other.to_string()),
        }
    }
}

impl From<ChargeError> for SimError {
    fn from(e: ChargeError) -> Self {
        match e {
            ChargeError::Infra(inner) => inner.into(),
            ChargeError::Fleet(inner) => inner.into(),
            e if e.is_oracle_violation() => Self::Oracle(e),
            other => Self::Configuration(other.to_string()),
        }
    }
}

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        Self::Configuration(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
