//! `fc-core`: foundational types for the fleetcharge simulation engine.
//!
//! Every other `fc-*` crate depends on this one.  It has no `fc-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module    | Contents                                                          |
//! |-----------|-------------------------------------------------------------------|
//! | [`ids`]   | `VehicleId`, `VehicleTypeId`, `LocationId`, `ChargerId`, `PointId`, `PlugTypeId` |
//! | [`time`]  | `Tick`, `SimClock`, `SimConfig`, timestamp parsing                |
//! | [`rng`]   | `SimRng` (seeded tie-breaks and repeat seeds)                     |
//! | [`error`] | `CoreError`, `CoreResult`                                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and config.   |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{ChargerId, LocationId, PlugTypeId, PointId, VehicleId, VehicleTypeId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick, format_timestamp, parse_timestamp};

/// Tolerance used for SOC and power comparisons throughout the engine.
pub const EPSILON: f64 = 1e-9;
