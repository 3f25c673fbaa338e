//! The vehicle and its per-step task state machine.

use std::fmt;

use fc_core::{EPSILON, LocationId, PointId, Tick, VehicleId, VehicleTypeId};
use fc_infra::GridContext;

use crate::{ConsumptionModel, FleetError, FleetResult, Task, TaskKind, TaskList, VehicleType};

// ── State and records ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum VehicleState {
    #[default]
    Idle,
    Driving,
    Parked,
    Charging,
}

impl VehicleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Driving => "driving",
            Self::Parked => "parked",
            Self::Charging => "charging",
        }
    }
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed step of a vehicle's time series.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleRecord {
    pub tick:              Tick,
    pub unix_secs:         i64,
    pub state:             VehicleState,
    pub soc:               f64,
    pub location:          LocationId,
    pub point:             Option<PointId>,
    pub charging_power_kw: f64,
}

/// A drive that was allowed to start below the minimum SOC.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SocDeficit {
    pub soc:      f64,
    pub required: f64,
    pub soc_min:  f64,
}

/// What [`Vehicle::advance`] asks of the simulation for this step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    /// A point the vehicle let go of and that must be freed.
    pub released:    Option<PointId>,
    /// The vehicle is in a Charge task without a point.
    pub needs_point: bool,
    /// Set when a drive started below minimum SOC in ignore-warnings mode.
    pub degraded:    Option<SocDeficit>,
}

/// Read-only inputs shared by every vehicle's `advance` in one step.
pub struct StepContext<'a> {
    pub vehicle_type:    &'a VehicleType,
    pub consumption:     &'a dyn ConsumptionModel,
    pub grid:            &'a dyn GridContext,
    pub ignore_warnings: bool,
}

#[derive(Clone, Debug)]
struct ActiveTask {
    index:          usize,
    task:           Task,
    /// Total drive energy, fixed when the drive starts.
    drive_kwh:      f64,
    drive_used_kwh: f64,
    charge_done:    bool,
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id:           VehicleId,
    pub name:         String,
    pub vehicle_type: VehicleTypeId,
    pub soc:          f64,
    pub location:     LocationId,
    pub state:        VehicleState,
    pub point:        Option<PointId>,
    /// Lifetime energy received from chargers (kWh).
    pub charged_kwh:  f64,
    /// Lifetime energy used for driving, detours included (kWh).
    pub consumed_kwh: f64,

    tasks:             TaskList,
    active:            Option<ActiveTask>,
    charging_power_kw: f64,
    force_released:    bool,
    started:           bool,
    history:           Vec<VehicleRecord>,
}

impl Vehicle {
    pub fn new(
        id:           VehicleId,
        name:         &str,
        vehicle_type: VehicleTypeId,
        soc:          f64,
        location:     LocationId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            vehicle_type,
            soc,
            location,
            state: VehicleState::Idle,
            point: None,
            charged_kwh: 0.0,
            consumed_kwh: 0.0,
            tasks: TaskList::new(),
            active: None,
            charging_power_kw: 0.0,
            force_released: false,
            started: false,
            history: Vec::new(),
        }
    }

    // ── Task list (pre-run only) ──────────────────────────────────────────

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn add_task(&mut self, task: Task) -> FleetResult<usize> {
        if self.started {
            return Err(FleetError::TasksLocked(self.id));
        }
        Ok(self.tasks.insert(task))
    }

    pub fn remove_task(&mut self, index: usize) -> FleetResult<Option<Task>> {
        if self.started {
            return Err(FleetError::TasksLocked(self.id));
        }
        Ok(self.tasks.remove(index))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn history(&self) -> &[VehicleRecord] {
        &self.history
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref().map(|a| &a.task)
    }

    /// Power delivered to this vehicle in the current step.
    pub fn charging_power_kw(&self) -> f64 {
        self.charging_power_kw
    }

    /// Attached to a point and drawing (or eligible to draw) power.
    pub fn is_charging(&self) -> bool {
        self.state == VehicleState::Charging && self.point.is_some()
    }

    // ── State machine ─────────────────────────────────────────────────────

    /// Advance the task state machine to step `now`.
    ///
    /// Completes the task whose window closed, enters the task whose window
    /// opened, and applies this step's share of any drive energy.
    pub fn advance(&mut self, now: Tick, ctx: &StepContext<'_>) -> FleetResult<StepOutcome> {
        self.started = true;
        self.charging_power_kw = 0.0;
        let mut out = StepOutcome::default();

        // ── Close the running task ────────────────────────────────────────
        if self.active.as_ref().is_some_and(|a| now >= a.task.end) {
            self.complete_active(ctx.vehicle_type, &mut out);
        }

        // ── Early charge completion ───────────────────────────────────────
        if let Some(active) = &mut self.active {
            if active.task.kind == TaskKind::Charge && !active.charge_done {
                let full = self.soc >= 1.0 - EPSILON;
                if full || self.force_released {
                    active.charge_done = true;
                    out.released = self.point.take();
                    self.state = VehicleState::Idle;
                }
            }
        }
        self.force_released = false;

        // ── Open the next task ────────────────────────────────────────────
        if self.active.is_none() {
            match self.tasks.active_index(now) {
                Some(index) => self.enter(index, now, ctx, &mut out)?,
                None => self.state = VehicleState::Idle,
            }
        }

        // ── Per-step effects of the running task ──────────────────────────
        if let Some(active) = &mut self.active {
            match active.task.kind {
                TaskKind::Drive(_) => {
                    let steps_left = active.task.end.since(now).max(1);
                    let slice = (active.drive_kwh - active.drive_used_kwh) / steps_left as f64;
                    active.drive_used_kwh += slice;
                    self.consumed_kwh += slice;
                    self.soc = (self.soc - ctx.vehicle_type.soc_of(slice)).max(0.0);
                }
                TaskKind::Charge if !active.charge_done && self.point.is_none() => {
                    self.state = VehicleState::Parked;
                    out.needs_point = true;
                }
                _ => {}
            }
        }

        Ok(out)
    }

    fn enter(
        &mut self,
        index: usize,
        now:   Tick,
        ctx:   &StepContext<'_>,
        out:   &mut StepOutcome,
    ) -> FleetResult<()> {
        let Some(&task) = self.tasks.get(index) else {
            return Ok(());
        };
        let mut active = ActiveTask {
            index,
            task,
            drive_kwh: 0.0,
            drive_used_kwh: 0.0,
            charge_done: false,
        };

        match task.kind {
            TaskKind::Drive(drive) => {
                let temperature_c = match drive.temperature_c {
                    Some(t) => t,
                    None => ctx.grid.sample(self.location, now)?.temperature_c,
                };
                let vt = ctx.vehicle_type;
                active.drive_kwh = ctx.consumption.energy_kwh(vt, &drive, temperature_c);
                let required = vt.soc_of(active.drive_kwh);
                if self.soc - required < vt.soc_min - EPSILON {
                    if !ctx.ignore_warnings {
                        return Err(FleetError::InfeasibleSchedule {
                            vehicle: self.id,
                            tick: now,
                            soc: self.soc,
                            required,
                            soc_min: vt.soc_min,
                        });
                    }
                    out.degraded = Some(SocDeficit { soc: self.soc, required, soc_min: vt.soc_min });
                }
                self.state = VehicleState::Driving;
            }
            TaskKind::Park | TaskKind::Break => self.state = VehicleState::Parked,
            TaskKind::Charge => {
                if self.soc >= 1.0 - EPSILON {
                    active.charge_done = true;
                    self.state = VehicleState::Idle;
                } else {
                    self.state = VehicleState::Parked;
                }
            }
        }

        self.active = Some(active);
        Ok(())
    }

    fn complete_active(&mut self, vt: &VehicleType, out: &mut StepOutcome) {
        let Some(active) = self.active.take() else {
            return;
        };
        match active.task.kind {
            TaskKind::Drive(drive) => {
                let rest = active.drive_kwh - active.drive_used_kwh;
                if rest > 0.0 {
                    self.consumed_kwh += rest;
                    self.soc = (self.soc - vt.soc_of(rest)).max(0.0);
                }
                self.location = drive.destination;
            }
            TaskKind::Charge => {
                if let Some(point) = self.point.take() {
                    out.released = Some(point);
                }
            }
            TaskKind::Park | TaskKind::Break => {}
        }
        self.state = VehicleState::Idle;
        tracing::trace!(vehicle = %self.id, task = active.index, "task complete");
    }

    // ── Hooks used by the selector and allocator ──────────────────────────

    /// Attach to `point` at `location`, paying `detour_kwh` to get there.
    pub fn attach(&mut self, point: PointId, location: LocationId, detour_kwh: f64, vt: &VehicleType) {
        if detour_kwh > 0.0 {
            self.consumed_kwh += detour_kwh;
            self.soc = (self.soc - vt.soc_of(detour_kwh)).max(0.0);
        }
        self.point = Some(point);
        self.location = location;
        self.state = VehicleState::Charging;
    }

    /// Mark the point as withdrawn; the Charge task ends on the next step.
    pub fn mark_force_released(&mut self) {
        self.force_released = true;
    }

    /// Record a settled charge for this step.
    pub fn apply_charge(&mut self, delivered_kw: f64, delivered_kwh: f64, soc: f64) {
        self.charging_power_kw = delivered_kw;
        self.charged_kwh += delivered_kwh;
        self.soc = soc;
    }

    /// Append this step's state to the time series.
    pub fn record(&mut self, tick: Tick, unix_secs: i64) {
        self.history.push(VehicleRecord {
            tick,
            unix_secs,
            state: self.state,
            soc: self.soc,
            location: self.location,
            point: self.point,
            charging_power_kw: self.charging_power_kw,
        });
    }
}
