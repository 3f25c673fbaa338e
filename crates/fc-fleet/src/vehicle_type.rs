//! Immutable per-type vehicle specifications.

use fc_core::{PlugTypeId, VehicleTypeId};

use crate::{FleetError, FleetResult};

// ── ChargingCurve ─────────────────────────────────────────────────────────────

/// Maximum charging power as a piecewise-linear function of SOC.
///
/// Points are `(soc, kW)` sorted by SOC.  Outside the first and last point
/// the curve is flat.
#[derive(Clone, Debug, PartialEq)]
pub struct ChargingCurve {
    points: Vec<(f64, f64)>,
}

impl ChargingCurve {
    pub fn new(mut points: Vec<(f64, f64)>) -> FleetResult<Self> {
        if points.is_empty() {
            return Err(FleetError::Invalid {
                what:   "charging curve",
                reason: "needs at least one point".into(),
            });
        }
        for &(soc, kw) in &points {
            if !(0.0..=1.0).contains(&soc) || !kw.is_finite() || kw < 0.0 {
                return Err(FleetError::Invalid {
                    what:   "charging curve",
                    reason: format!("point ({soc}, {kw}) out of range"),
                });
            }
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if points.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(FleetError::Invalid {
                what:   "charging curve",
                reason: "duplicate SOC breakpoint".into(),
            });
        }
        Ok(Self { points })
    }

    /// A flat curve: `kw` at every SOC.
    pub fn constant(kw: f64) -> Self {
        Self { points: vec![(0.0, kw), (1.0, kw)] }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Power (kW) the battery accepts at `soc`.
    pub fn power_at(&self, soc: f64) -> f64 {
        let soc = soc.clamp(0.0, 1.0);
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if soc <= first.0 {
            return first.1;
        }
        if soc >= last.0 {
            return last.1;
        }
        let i = self.points.partition_point(|p| p.0 <= soc);
        let (x0, y0) = self.points[i - 1];
        let (x1, y1) = self.points[i];
        y0 + (y1 - y0) * (soc - x0) / (x1 - x0)
    }

    pub fn max_power_kw(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }
}

// ── VehicleType ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct VehicleType {
    pub id:                          VehicleTypeId,
    pub name:                        String,
    pub battery_capacity_kwh:        f64,
    /// Consumption at reference conditions (kWh/km).
    pub base_consumption_kwh_per_km: f64,
    pub charging_curve:              ChargingCurve,
    pub soc_min:                     f64,
    /// Below this the allocator requests nothing (kW).
    pub min_charging_power_kw:       f64,
    pub plugs:                       Vec<PlugTypeId>,
}

impl VehicleType {
    pub fn validate(&self) -> FleetResult<()> {
        let invalid = |reason: String| FleetError::Invalid { what: "vehicle type", reason };
        if self.battery_capacity_kwh.is_nan() || self.battery_capacity_kwh <= 0.0 {
            return Err(invalid(format!(
                "{}: battery capacity {} must be positive",
                self.name, self.battery_capacity_kwh
            )));
        }
        if !(0.0..1.0).contains(&self.soc_min) {
            return Err(invalid(format!("{}: soc_min {} must lie in [0, 1)", self.name, self.soc_min)));
        }
        if self.base_consumption_kwh_per_km < 0.0 || self.min_charging_power_kw < 0.0 {
            return Err(invalid(format!("{}: negative consumption or power threshold", self.name)));
        }
        if self.plugs.is_empty() {
            return Err(invalid(format!("{}: no compatible plug types", self.name)));
        }
        Ok(())
    }

    /// Energy expressed as a fraction of this type's battery.
    #[inline]
    pub fn soc_of(&self, kwh: f64) -> f64 {
        kwh / self.battery_capacity_kwh
    }
}
