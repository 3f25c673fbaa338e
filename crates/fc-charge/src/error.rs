use fc_core::VehicleId;
use fc_fleet::FleetError;
use fc_infra::InfraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChargeError {
    #[error("unknown selection criterion {0:?}")]
    UnknownCriterion(String),

    #[error("invalid weight {value} for criterion {criterion}")]
    InvalidWeight { criterion: String, value: f64 },

    #[error("charging oracle returned {got} deliveries for {expected} requests")]
    OracleShape { expected: usize, got: usize },

    #[error("charging oracle delivered {delivered:.3} kW to {vehicle}, above the {requested:.3} kW requested")]
    OracleOverDelivery {
        vehicle:   VehicleId,
        requested: f64,
        delivered: f64,
    },

    #[error("charging oracle result for {vehicle} is invalid: {reason}")]
    OracleInvalid { vehicle: VehicleId, reason: String },

    #[error("charging oracle location split is invalid: {0}")]
    OracleDraw(String),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Fleet(#[from] FleetError),
}

impl ChargeError {
    pub fn is_oracle_violation(&self) -> bool {
        matches!(
            self,
            Self::OracleShape { .. }
                | Self::OracleOverDelivery { .. }
                | Self::OracleInvalid { .. }
                | Self::OracleDraw(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownCriterion(_) | Self::InvalidWeight { .. })
    }
}

pub type ChargeResult<T> = Result<T, ChargeError>;
