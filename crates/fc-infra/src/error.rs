use fc_core::{ChargerId, CoreError, LocationId, PointId, Tick, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("unknown location {0:?}")]
    UnknownLocation(String),

    #[error("location {0} not found")]
    LocationNotFound(LocationId),

    #[error("charger {0} not found")]
    ChargerNotFound(ChargerId),

    #[error("charging point {0} not found")]
    PointNotFound(PointId),

    #[error("unknown plug type {0:?}")]
    UnknownPlugType(String),

    #[error("duplicate {what} name {name:?}")]
    DuplicateName { what: &'static str, name: String },

    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },

    #[error("too many {0} for the id type")]
    TooMany(&'static str),

    #[error("charging point {point} is fully occupied; cannot attach {vehicle}")]
    PointOccupied { point: PointId, vehicle: VehicleId },

    #[error("grid data for {location} does not cover {tick}")]
    OutOfRange { location: LocationId, tick: Tick },

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InfraError {
    /// `true` for errors caused by a reference to an entity that is not part
    /// of the infrastructure model.
    pub fn is_unknown_reference(&self) -> bool {
        matches!(
            self,
            Self::UnknownLocation(_)
                | Self::LocationNotFound(_)
                | Self::ChargerNotFound(_)
                | Self::PointNotFound(_)
                | Self::UnknownPlugType(_)
        )
    }
}

pub type InfraResult<T> = Result<T, InfraError>;
