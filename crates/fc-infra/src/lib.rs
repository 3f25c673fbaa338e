//! `fc-infra`: the static charging topology and its time-varying context.
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`plug`]       | `PlugType`                                                 |
//! | [`topology`]   | `Location`, `Charger`, `ChargingPoint`, `Infrastructure` arena and builder |
//! | [`output`]     | `LocationOutput` per-step accumulator                      |
//! | [`grid`]       | `GridContext` trait, `GridSample`, `GridSeries` + CSV loader |
//! | [`distance`]   | `DistanceTable` between locations                          |
//! | [`error`]      | `InfraError`, `InfraResult`                                |
//!
//! Topology never changes during a run.  Only two things mutate: each
//! point's occupant list (a transient, index-based association with a
//! vehicle) and each location's output accumulator.

pub mod distance;
pub mod error;
pub mod grid;
pub mod output;
pub mod plug;
pub mod topology;


pub use distance::DistanceTable;
pub use error::{InfraError, InfraResult};
pub use grid::{ConstantGrid, GridContext, GridSample, GridSeries, load_grid_csv, load_grid_reader};
pub use output::LocationOutput;
pub use plug::PlugType;
pub use topology::{
    Charger, ChargingPoint, Infrastructure, InfrastructureBuilder, Location, LocationKind,
};
