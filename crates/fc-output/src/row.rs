//! Flat row types written by output backends.

use fc_core::{LocationId, VehicleId};
use fc_fleet::VehicleRecord;
use fc_sim::LocationRecord;

/// One vehicle at one committed step.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRow {
    pub vehicle_id:        u32,
    pub tick:              u64,
    pub unix_time_secs:    i64,
    pub state:             &'static str,
    pub soc:               f64,
    pub location_id:       u32,
    /// `None` while not attached to a charging point.
    pub point_id:          Option<u32>,
    pub charging_power_kw: f64,
}

impl VehicleRow {
    pub fn new(vehicle: VehicleId, r: &VehicleRecord) -> Self {
        Self {
            vehicle_id:        vehicle.0,
            tick:              r.tick.0,
            unix_time_secs:    r.unix_secs,
            state:             r.state.as_str(),
            soc:               r.soc,
            location_id:       r.location.0,
            point_id:          r.point.map(|p| p.0),
            charging_power_kw: r.charging_power_kw,
        }
    }
}

/// One location at one committed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRow {
    pub location_id:        u32,
    pub tick:               u64,
    pub unix_time_secs:     i64,
    pub power_kw:           f64,
    pub energy_kwh:         f64,
    pub grid_kwh:           f64,
    pub feed_in_kwh:        f64,
    pub cost:               f64,
    pub emission_g:         f64,
    pub connected_vehicles: u32,
}

impl LocationRow {
    pub fn new(location: LocationId, r: &LocationRecord) -> Self {
        Self {
            location_id:        location.0,
            tick:               r.tick.0,
            unix_time_secs:     r.unix_secs,
            power_kw:           r.power_kw,
            energy_kwh:         r.energy_kwh,
            grid_kwh:           r.grid_kwh,
            feed_in_kwh:        r.feed_in_kwh,
            cost:               r.cost,
            emission_g:         r.emission_g,
            connected_vehicles: r.connected_vehicles,
        }
    }
}
