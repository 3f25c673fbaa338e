//! `fc-fleet`: vehicles and what they are scheduled to do.
//!
//! # Per-step state machine
//!
//! ```text
//!            ┌──────── Drive ────────┐
//!   Idle ────┼──────── Park/Break ───┼──── task end ──▶ Idle
//!            └── Charge ─▶ Parked ───┘
//!                   │  (point found)
//!                   ▼
//!               Charging ── SOC full / force-release ──▶ Idle
//! ```
//!
//! [`Vehicle::advance`] is evaluated once per step.  Entering a Charge task
//! leaves the vehicle `Parked` until the location selector attaches it to a
//! point; it keeps asking on every step until one is found or the task ends.
//!
//! | Module            | Contents                                             |
//! |-------------------|------------------------------------------------------|
//! | [`vehicle_type`]  | `VehicleType`, `ChargingCurve`                       |
//! | [`task`]          | `Task`, `TaskKind`, `DriveTask`, `TaskList`          |
//! | [`consumption`]   | `ConsumptionModel` trait, `LinearConsumption`        |
//! | [`vehicle`]       | `Vehicle`, `VehicleState`, `VehicleRecord`, `StepOutcome` |
//! | [`fleet`]         | `Fleet` arena                                        |
//! | [`validate`]      | `has_valid_task_list`, `validate_fleet`              |
//! | [`loader`]        | schedule CSV loading                                 |

pub mod consumption;
pub mod error;
pub mod fleet;
pub mod loader;
pub mod task;
pub mod validate;
pub mod vehicle;
pub mod vehicle_type;

#[cfg(test)]
mod tests;

pub use consumption::{ConsumptionModel, LinearConsumption};
pub use error::{FleetError, FleetResult};
pub use fleet::Fleet;
pub use loader::{load_schedule_csv, load_schedule_reader};
pub use task::{DriveTask, Task, TaskKind, TaskList};
pub use validate::{has_valid_task_list, validate_fleet};
pub use vehicle::{SocDeficit, StepContext, StepOutcome, Vehicle, VehicleRecord, VehicleState};
pub use vehicle_type::{ChargingCurve, VehicleType};
