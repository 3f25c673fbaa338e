//! The charging oracle: the boundary to whatever turns requested power into
//! delivered energy.
//!
//! The allocator hands over one [`OracleBatch`] per step holding every
//! connected vehicle, already clipped to point, charger and location
//! capacity.  An implementation returns one [`Delivery`] per request (same
//! order) and one [`LocationDraw`] per location in the batch's grid list.
//!
//! Contract:
//! - `delivered_kw <= requested_kw` for every request
//! - `delivered_kwh <= requested_kw × step_hours`
//! - `soc` never drops below the request's SOC and never exceeds 1
//! - a location's `grid_kwh + feed_in_kwh` equals the energy delivered there

use std::collections::BTreeMap;

use fc_core::{LocationId, PointId, VehicleId};
use fc_fleet::VehicleType;
use fc_infra::GridSample;

use crate::ChargeResult;

/// One vehicle's clipped request for this step.
#[derive(Clone, Debug)]
pub struct OracleRequest<'a> {
    pub vehicle:        VehicleId,
    pub location:       LocationId,
    pub point:          PointId,
    pub vehicle_type:   &'a VehicleType,
    pub soc:            f64,
    pub point_rated_kw: f64,
    /// Upper bound on what may be delivered (kW).
    pub requested_kw:   f64,
}

#[derive(Clone, Debug)]
pub struct OracleBatch<'a> {
    pub step_hours: f64,
    pub requests:   Vec<OracleRequest<'a>>,
    /// Grid conditions for every location that has a request, ascending.
    pub grid:       Vec<(LocationId, GridSample)>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Delivery {
    pub vehicle:       VehicleId,
    pub delivered_kw:  f64,
    pub delivered_kwh: f64,
    pub soc:           f64,
}

/// Where a location's delivered energy came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocationDraw {
    pub location:    LocationId,
    pub grid_kwh:    f64,
    pub feed_in_kwh: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OracleResult {
    pub deliveries: Vec<Delivery>,
    pub draws:      Vec<LocationDraw>,
}

pub trait ChargingOracle: Send + Sync {
    fn settle(&self, batch: &OracleBatch<'_>) -> ChargeResult<OracleResult>;
}

// ── CurveOracle ───────────────────────────────────────────────────────────────

/// Reference oracle: integrates each vehicle's charging curve over the step
/// in `substeps` slices, so power tapers as SOC rises within the step.
///
/// Delivered energy at a location is covered by local feed-in first and by
/// the grid for the rest.
#[derive(Clone, Debug)]
pub struct CurveOracle {
    pub substeps: u32,
}

impl Default for CurveOracle {
    fn default() -> Self {
        Self { substeps: 10 }
    }
}

impl CurveOracle {
    pub fn new(substeps: u32) -> Self {
        Self { substeps: substeps.max(1) }
    }

    fn deliver(&self, req: &OracleRequest<'_>, step_hours: f64) -> Delivery {
        let capacity = req.vehicle_type.battery_capacity_kwh;
        let substeps = self.substeps.max(1);
        let dt = step_hours / f64::from(substeps);
        let mut soc = req.soc;
        let mut energy = 0.0;

        if req.requested_kw > 0.0 && dt > 0.0 && capacity > 0.0 {
            for _ in 0..substeps {
                let room_kwh = (1.0 - soc).max(0.0) * capacity;
                if room_kwh <= 0.0 {
                    break;
                }
                let kw = req
                    .requested_kw
                    .min(req.vehicle_type.charging_curve.power_at(soc))
                    .max(0.0);
                let e = (kw * dt).min(room_kwh);
                energy += e;
                soc += e / capacity;
            }
        }

        let delivered_kw = if step_hours > 0.0 {
            (energy / step_hours).min(req.requested_kw.max(0.0))
        } else {
            0.0
        };
        Delivery {
            vehicle: req.vehicle,
            delivered_kw,
            delivered_kwh: energy,
            soc: soc.min(1.0),
        }
    }
}

impl ChargingOracle for CurveOracle {
    fn settle(&self, batch: &OracleBatch<'_>) -> ChargeResult<OracleResult> {
        let deliveries: Vec<Delivery> = batch
            .requests
            .iter()
            .map(|r| self.deliver(r, batch.step_hours))
            .collect();

        let mut per_location: BTreeMap<LocationId, f64> = BTreeMap::new();
        for (req, d) in batch.requests.iter().zip(&deliveries) {
            *per_location.entry(req.location).or_insert(0.0) += d.delivered_kwh;
        }

        let draws = batch
            .grid
            .iter()
            .map(|&(location, sample)| {
                let total = per_location.get(&location).copied().unwrap_or(0.0);
                let feed_in_kwh = total.min(sample.feed_in_kwh.max(0.0));
                LocationDraw { location, grid_kwh: total - feed_in_kwh, feed_in_kwh }
            })
            .collect();

        Ok(OracleResult { deliveries, draws })
    }
}
