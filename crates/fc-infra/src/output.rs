//! Per-step location accumulator.

/// What one location delivered during the current step.
///
/// Reset at the start of every step and filled by the charge allocator.  The
/// result aggregator copies it into the location's time series when the step
/// is committed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocationOutput {
    /// Sum of delivered power over all points (kW).
    pub power_kw:           f64,
    pub energy_kwh:         f64,
    pub grid_kwh:           f64,
    pub feed_in_kwh:        f64,
    pub cost:               f64,
    /// Grams of CO₂-equivalent attributed to grid energy.
    pub emission_g:         f64,
    pub connected_vehicles: u32,
}

impl LocationOutput {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
