//! Observer hooks for progress reporting and streaming output.

use fc_core::Tick;
use fc_fleet::Fleet;
use fc_infra::Infrastructure;

use crate::RunStatus;

/// Counters for one committed step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Vehicles that received a point this step.
    pub assigned:     usize,
    /// Vehicles that needed a point and found none.
    pub shortfalls:   usize,
    /// Connected (vehicle, point) pairs settled by the allocator.
    pub connected:    usize,
    /// Sum of delivered power over all locations (kW).
    pub delivered_kw: f64,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at step boundaries.
///
/// All methods default to no-ops.
pub trait SimObserver {
    /// Before any processing of `tick`.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// After `tick` is committed.
    fn on_step_end(&mut self, _tick: Tick, _stats: &StepStats) {}

    /// Every `config.output_interval_ticks` committed steps.
    ///
    /// The fleet's latest vehicle records and the locations' outputs both
    /// describe `tick`.
    fn on_snapshot(
        &mut self,
        _tick:      Tick,
        _unix_secs: i64,
        _fleet:     &Fleet,
        _infra:     &Infrastructure,
    ) {}

    /// Once, when the run completes, fails or is aborted.
    fn on_sim_end(&mut self, _final_tick: Tick, _status: &RunStatus) {}
}

pub struct NoopObserver;

impl SimObserver for NoopObserver {}
