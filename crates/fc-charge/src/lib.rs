//! `fc-charge`: who charges where, and how much power they get.
//!
//! # Per-step flow
//!
//! ```text
//!   vehicles needing a point ──▶ LocationSelector::select  (one at a time, id order)
//!                                        │ (location, point)
//!                                        ▼
//!   all (vehicle, point) pairs ─▶ ChargeAllocator::allocate
//!                                   ① desired  = curve(SOC), 0 below threshold
//!                                   ② clip     point → charger → location ceiling
//!                                                (ascending PointId)
//!                                   ③ settle   ChargingOracle::settle (one batch)
//!                                   ④ apply    SOC, location energy/cost/emission
//! ```
//!
//! Capacity is enforced entirely in step ②.  The oracle may deliver less than
//! requested but never more; a result that does is rejected as a contract
//! violation.
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`criteria`]  | `Criterion`, `Weights`                               |
//! | [`selector`]  | `LocationSelector`, `SelectionContext`, `Selection`  |
//! | [`oracle`]    | `ChargingOracle` trait, batch types, `CurveOracle`   |
//! | [`allocator`] | `ChargeAllocator`, `Settlement`                      |

pub mod allocator;
pub mod criteria;
pub mod error;
pub mod oracle;
pub mod selector;


pub use allocator::{ChargeAllocator, Settlement, desired_power_kw};
pub use criteria::{Criterion, Weights};
pub use error::{ChargeError, ChargeResult};
pub use oracle::{ChargingOracle, CurveOracle, Delivery, LocationDraw, OracleBatch, OracleRequest, OracleResult};
pub use selector::{Candidate, DEFAULT_DETOUR_SPEED_KMH, LocationSelector, Selection, SelectionContext};
