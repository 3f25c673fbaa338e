//! The `Sim` struct and its step loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fc_charge::{ChargeAllocator, ChargingOracle, CurveOracle, LocationSelector, SelectionContext};
use fc_core::{PointId, SimClock, SimConfig, SimRng, Tick, VehicleId};
use fc_fleet::{ConsumptionModel, Fleet, FleetError, LinearConsumption, StepContext};
use fc_infra::{DistanceTable, GridContext, Infrastructure};

use crate::{ResultAggregator, RunReport, RunStatus, SimError, SimObserver, SimResult, StepStats, Warning};

/// Cloneable flag that stops a run at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// One simulation run.
///
/// Owns all mutable state: nothing is shared between two `Sim`s, so
/// independent runs can go to different threads (see
/// [`run_batch`][crate::run_batch]).
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<G: GridContext, O: ChargingOracle = CurveOracle, C: ConsumptionModel = LinearConsumption> {
    pub config:      SimConfig,
    pub clock:       SimClock,
    pub fleet:       Fleet,
    pub infra:       Infrastructure,
    pub distances:   DistanceTable,
    pub grid:        G,
    pub consumption: C,
    pub selector:    LocationSelector,
    pub allocator:   ChargeAllocator<O>,
    pub aggregator:  ResultAggregator,

    /// Only consulted for exact selector ties.
    pub(crate) rng:    Option<SimRng>,
    pub(crate) abort:  AbortHandle,
    pub(crate) status: RunStatus,
}

impl<G: GridContext, O: ChargingOracle, C: ConsumptionModel> Sim<G, O, C> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    ///
    /// On a fatal error the run stops, its status becomes
    /// [`RunStatus::Failed`] and the error is returned; everything committed
    /// before the failing step stays in the aggregator and vehicle histories.
    pub fn run<W: SimObserver>(&mut self, observer: &mut W) -> SimResult<()> {
        tracing::info!(
            vehicles = self.fleet.len(),
            locations = self.infra.locations().len(),
            ticks = self.config.total_ticks,
            start = %self.clock,
            "run started"
        );
        self.status = RunStatus::Running;
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer)?;
        }
        let final_tick = self.clock.current_tick;
        self.status = RunStatus::Completed { final_tick };
        observer.on_sim_end(final_tick, &self.status);
        tracing::info!(
            steps = self.aggregator.steps_committed(),
            shortfalls = self.aggregator.shortfalls(),
            "run finished"
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_tick`).
    pub fn run_ticks<W: SimObserver>(&mut self, n: u64, observer: &mut W) -> SimResult<()> {
        self.status = RunStatus::Running;
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Stop before the next step.  The run then fails with
    /// [`SimError::Aborted`].
    pub fn request_abort(&self) {
        self.abort.request();
    }

    /// A handle that can abort this run from an observer or another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Free `point` between steps.  Its vehicles finish their Charge task on
    /// the next step.
    pub fn force_release(&mut self, point: PointId) -> SimResult<Vec<VehicleId>> {
        let vehicles = self.infra.force_release(point)?;
        for &id in &vehicles {
            self.fleet.vehicle_mut(id)?.mark_force_released();
        }
        tracing::debug!(point = %point, released = vehicles.len(), "point force-released");
        Ok(vehicles)
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn report(&self) -> RunReport {
        self.aggregator.report(self.status.clone(), &self.fleet, &self.infra)
    }

    // ── Step processing ───────────────────────────────────────────────────

    fn step<W: SimObserver>(&mut self, observer: &mut W) -> SimResult<()> {
        let now = self.clock.current_tick;
        if self.abort.is_requested() {
            return Err(self.fail(SimError::Aborted(now), observer));
        }

        observer.on_step_start(now);
        let stats = match self.process_step(now) {
            Ok(stats) => stats,
            Err(e) => return Err(self.fail(e, observer)),
        };
        observer.on_step_end(now, &stats);

        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.0.is_multiple_of(interval) {
            observer.on_snapshot(now, self.clock.unix_secs_at(now), &self.fleet, &self.infra);
        }
        self.clock.advance();
        Ok(())
    }

    fn fail<W: SimObserver>(&mut self, err: SimError, observer: &mut W) -> SimError {
        let last_committed = self.aggregator.last_committed();
        tracing::error!(
            tick = %self.clock.current_tick,
            phase = %err.phase(),
            error = %err,
            "run failed"
        );
        self.status = RunStatus::Failed {
            last_committed,
            vehicle: err.vehicle(),
            phase: err.phase(),
            reason: err.to_string(),
        };
        observer.on_sim_end(self.clock.current_tick, &self.status);
        err
    }

    fn process_step(&mut self, now: Tick) -> SimResult<StepStats> {
        self.infra.reset_outputs();
        let mut stats = StepStats::default();

        // ── Phase 1: advance every vehicle (ascending id) ─────────────────
        let mut needs_point: Vec<VehicleId> = Vec::new();
        {
            let (types, vehicles) = self.fleet.split_mut();
            for vehicle in vehicles.iter_mut() {
                let vehicle_type = types
                    .get(vehicle.vehicle_type.index())
                    .ok_or(FleetError::VehicleTypeNotFound(vehicle.vehicle_type))?;
                let ctx = StepContext {
                    vehicle_type,
                    consumption: &self.consumption,
                    grid: &self.grid,
                    ignore_warnings: self.config.ignore_warnings,
                };
                let outcome = vehicle.advance(now, &ctx)?;

                if let Some(point) = outcome.released {
                    self.infra.release(point, vehicle.id);
                }
                if outcome.needs_point {
                    needs_point.push(vehicle.id);
                }
                if let Some(d) = outcome.degraded {
                    tracing::warn!(
                        vehicle = %vehicle.id,
                        tick = %now,
                        soc = d.soc,
                        required = d.required,
                        "drive started below minimum SOC"
                    );
                    self.aggregator.warn(Warning::DegradedSoc {
                        tick: now,
                        vehicle: vehicle.id,
                        soc: d.soc,
                        required: d.required,
                        soc_min: d.soc_min,
                    });
                }
            }
        }

        // ── Phase 2: resolve new charging assignments ─────────────────────
        for id in needs_point {
            let selection = {
                let vehicle = self.fleet.vehicle(id)?;
                let vehicle_type = self.fleet.vehicle_type(vehicle.vehicle_type)?;
                let ctx = SelectionContext {
                    infra:       &self.infra,
                    distances:   &self.distances,
                    grid:        &self.grid,
                    consumption: &self.consumption,
                    now,
                    step_hours:  self.clock.step_hours(),
                    window_end:  vehicle.active_task().map(|t| t.end),
                };
                self.selector.select(vehicle, vehicle_type, &ctx, self.rng.as_mut())?
            };

            match selection {
                Some(sel) => {
                    self.infra.assign(sel.point, id)?;
                    let (types, vehicles) = self.fleet.split_mut();
                    let vehicle = vehicles.get_mut(id.index()).ok_or(FleetError::VehicleNotFound(id))?;
                    let vehicle_type = types
                        .get(vehicle.vehicle_type.index())
                        .ok_or(FleetError::VehicleTypeNotFound(vehicle.vehicle_type))?;
                    vehicle.attach(sel.point, sel.location, sel.detour_kwh, vehicle_type);
                    stats.assigned += 1;
                }
                None => {
                    tracing::warn!(vehicle = %id, tick = %now, "no free charging point reachable");
                    self.aggregator.warn(Warning::SchedulingShortfall { tick: now, vehicle: id });
                    stats.shortfalls += 1;
                }
            }
        }

        // ── Phase 3: allocate and settle ──────────────────────────────────
        let pairs: Vec<(VehicleId, PointId)> = self
            .fleet
            .vehicles()
            .iter()
            .filter(|v| v.is_charging())
            .filter_map(|v| v.point.map(|p| (v.id, p)))
            .collect();
        let settlements = self.allocator.allocate(
            &pairs,
            &mut self.fleet,
            &mut self.infra,
            &self.grid,
            now,
            self.clock.step_hours(),
            self.config.feed_in_price_per_kwh,
        )?;
        stats.connected = settlements.len();
        stats.delivered_kw = settlements.iter().map(|s| s.delivered_kw).sum();

        // ── Phase 4: commit ───────────────────────────────────────────────
        let unix_secs = self.clock.unix_secs_at(now);
        self.aggregator.commit(now, unix_secs, &self.infra);
        for vehicle in self.fleet.split_mut().1.iter_mut() {
            vehicle.record(now, unix_secs);
        }

        tracing::debug!(
            tick = %now,
            assigned = stats.assigned,
            shortfalls = stats.shortfalls,
            connected = stats.connected,
            delivered_kw = stats.delivered_kw,
            "step committed"
        );
        Ok(stats)
    }
}
