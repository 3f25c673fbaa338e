//! Drive energy models.
//!
//! The engine only needs "kWh for this trip".  Where that number comes from
//! (lookup tables, a physics model, measured data) is behind
//! [`ConsumptionModel`].

use crate::{DriveTask, VehicleType};

/// Ambient temperature assumed when a drive carries none and no grid sample
/// is available, e.g. when validating without a grid.
pub const REFERENCE_TEMPERATURE_C: f64 = 20.0;

pub trait ConsumptionModel: Send + Sync {
    /// Energy (kWh) `vehicle_type` uses for `drive` at `temperature_c`.
    fn energy_kwh(&self, vehicle_type: &VehicleType, drive: &DriveTask, temperature_c: f64) -> f64;
}

/// Base consumption × distance, with penalties for temperatures outside a
/// comfort band (cabin heating/cooling) and for speeds above a reference.
#[derive(Clone, Debug)]
pub struct LinearConsumption {
    pub comfort_low_c:         f64,
    pub comfort_high_c:        f64,
    /// Relative increase per °C below `comfort_low_c`.
    pub cold_penalty_per_c:    f64,
    /// Relative increase per °C above `comfort_high_c`.
    pub heat_penalty_per_c:    f64,
    pub reference_speed_kmh:   f64,
    /// Relative increase per km/h above `reference_speed_kmh`.
    pub speed_penalty_per_kmh: f64,
}

impl Default for LinearConsumption {
    fn default() -> Self {
        Self {
            comfort_low_c:         15.0,
            comfort_high_c:        25.0,
            cold_penalty_per_c:    0.015,
            heat_penalty_per_c:    0.01,
            reference_speed_kmh:   60.0,
            speed_penalty_per_kmh: 0.004,
        }
    }
}

impl LinearConsumption {
    /// Pure base consumption, no temperature or speed effects.
    pub fn flat() -> Self {
        Self {
            cold_penalty_per_c: 0.0,
            heat_penalty_per_c: 0.0,
            speed_penalty_per_kmh: 0.0,
            ..Self::default()
        }
    }

    fn factor(&self, speed_kmh: f64, temperature_c: f64) -> f64 {
        let cold = (self.comfort_low_c - temperature_c).max(0.0) * self.cold_penalty_per_c;
        let heat = (temperature_c - self.comfort_high_c).max(0.0) * self.heat_penalty_per_c;
        let speed = (speed_kmh - self.reference_speed_kmh).max(0.0) * self.speed_penalty_per_kmh;
        1.0 + cold + heat + speed
    }
}

impl ConsumptionModel for LinearConsumption {
    fn energy_kwh(&self, vehicle_type: &VehicleType, drive: &DriveTask, temperature_c: f64) -> f64 {
        vehicle_type.base_consumption_kwh_per_km
            * drive.distance_km.max(0.0)
            * self.factor(drive.speed_kmh, temperature_c)
    }
}
