//! `fc-sim`: the step loop that ties fleet, infrastructure and charging
//! together.
//!
//! # Four-phase step
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Advance     every vehicle's task state machine, ascending VehicleId.
//!                 Released points are freed; vehicles in a Charge task
//!                 without a point are collected.
//!   ② Select      LocationSelector for each collected vehicle (id order).
//!                 No candidate → SchedulingShortfall warning, retry next step.
//!   ③ Allocate    ChargeAllocator over every (vehicle, point) pair, one
//!                 oracle call.
//!   ④ Commit      ResultAggregator snapshot + per-vehicle records.
//! ```
//!
//! A step either commits fully or the run fails; a failed run keeps every
//! record up to the last committed step.  Aborts take effect between steps.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `run_batch` executes jobs on a Rayon pool                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use fc_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, fleet, infra, grid)
//!     .distances(distances)
//!     .weights(weights)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! let report = sim.report();
//! ```

pub mod aggregate;
pub mod batch;
pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use aggregate::{
    LocationRecord, LocationSummary, ResultAggregator, RunReport, RunStatus, VehicleSummary, Warning,
};
pub use batch::run_batch;
pub use builder::SimBuilder;
pub use error::{ErrorPhase, SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, StepStats};
pub use sim::{AbortHandle, Sim};
