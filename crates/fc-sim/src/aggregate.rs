//! Result aggregation: per-location time series, warnings and the run report.

use std::fmt;

use fc_core::{LocationId, Tick, VehicleId, format_timestamp};
use fc_fleet::Fleet;
use fc_infra::Infrastructure;

use crate::ErrorPhase;

// ── Records and warnings ──────────────────────────────────────────────────────

/// One committed step of a location's output.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRecord {
    pub tick:               Tick,
    pub unix_secs:          i64,
    pub power_kw:           f64,
    pub energy_kwh:         f64,
    pub grid_kwh:           f64,
    pub feed_in_kwh:        f64,
    pub cost:               f64,
    pub emission_g:         f64,
    pub connected_vehicles: u32,
}

/// Recoverable conditions surfaced in the final report.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    /// A vehicle needed a charging point and none was free and reachable.
    SchedulingShortfall { tick: Tick, vehicle: VehicleId },
    /// A drive started below minimum SOC because warnings are ignored.
    DegradedSoc {
        tick:     Tick,
        vehicle:  VehicleId,
        soc:      f64,
        required: f64,
        soc_min:  f64,
    },
}

impl Warning {
    pub fn tick(&self) -> Tick {
        match self {
            Self::SchedulingShortfall { tick, .. } | Self::DegradedSoc { tick, .. } => *tick,
        }
    }

    pub fn vehicle(&self) -> VehicleId {
        match self {
            Self::SchedulingShortfall { vehicle, .. } | Self::DegradedSoc { vehicle, .. } => *vehicle,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchedulingShortfall { tick, vehicle } => {
                write!(f, "{tick}: {vehicle} found no free charging point")
            }
            Self::DegradedSoc { tick, vehicle, soc, required, soc_min } => write!(
                f,
                "{tick}: {vehicle} drove with SOC {soc:.3} needing {required:.3} (minimum {soc_min:.3})"
            ),
        }
    }
}

// ── Run status ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed { final_tick: Tick },
    Failed {
        /// Last step whose outputs were committed; `None` if none were.
        last_committed: Option<Tick>,
        vehicle:        Option<VehicleId>,
        phase:          ErrorPhase,
        reason:         String,
    },
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Running => f.write_str("running"),
            Self::Completed { final_tick } => write!(f, "completed at {final_tick}"),
            Self::Failed { last_committed, vehicle, phase, reason } => {
                write!(f, "failed ({phase})")?;
                if let Some(v) = vehicle {
                    write!(f, " for {v}")?;
                }
                match last_committed {
                    Some(t) => write!(f, " after {t}")?,
                    None => f.write_str(" before the first step")?,
                }
                write!(f, ": {reason}")
            }
        }
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct LocationSummary {
    pub location:      LocationId,
    pub name:          String,
    pub energy_kwh:    f64,
    pub grid_kwh:      f64,
    pub feed_in_kwh:   f64,
    pub cost:          f64,
    pub emission_g:    f64,
    pub peak_power_kw: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSummary {
    pub vehicle:      VehicleId,
    pub name:         String,
    pub charged_kwh:  f64,
    pub consumed_kwh: f64,
    pub min_soc:      f64,
    pub final_soc:    f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub status:          RunStatus,
    pub steps_committed: usize,
    pub shortfalls:      usize,
    pub warnings:        Vec<Warning>,
    pub locations:       Vec<LocationSummary>,
    pub vehicles:        Vec<VehicleSummary>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status: {}", self.status)?;
        writeln!(f, "steps committed: {}", self.steps_committed)?;
        writeln!(f, "scheduling shortfalls: {}", self.shortfalls)?;
        for l in &self.locations {
            writeln!(
                f,
                "  {:<16} {:>10.2} kWh  peak {:>8.2} kW  cost {:>10.2}  {:>12.1} g",
                l.name, l.energy_kwh, l.peak_power_kw, l.cost, l.emission_g
            )?;
        }
        for v in &self.vehicles {
            writeln!(
                f,
                "  {:<16} charged {:>8.2} kWh  driven {:>8.2} kWh  SOC min {:.3} final {:.3}",
                v.name, v.charged_kwh, v.consumed_kwh, v.min_soc, v.final_soc
            )?;
        }
        for w in self.warnings.iter().filter(|w| !matches!(w, Warning::SchedulingShortfall { .. })) {
            writeln!(f, "  warning: {w}")?;
        }
        Ok(())
    }
}

// ── ResultAggregator ──────────────────────────────────────────────────────────

/// Collects committed location outputs and run warnings.
#[derive(Clone, Debug, Default)]
pub struct ResultAggregator {
    series:         Vec<Vec<LocationRecord>>,
    warnings:       Vec<Warning>,
    last_committed: Option<Tick>,
    steps:          usize,
}

impl ResultAggregator {
    pub fn new(location_count: usize) -> Self {
        Self {
            series: vec![Vec::new(); location_count],
            warnings: Vec::new(),
            last_committed: None,
            steps: 0,
        }
    }

    /// Copy every location's current output into its series.
    pub fn commit(&mut self, tick: Tick, unix_secs: i64, infra: &Infrastructure) {
        if self.series.len() < infra.locations().len() {
            self.series.resize(infra.locations().len(), Vec::new());
        }
        for (series, location) in self.series.iter_mut().zip(infra.locations()) {
            let o = &location.output;
            series.push(LocationRecord {
                tick,
                unix_secs,
                power_kw: o.power_kw,
                energy_kwh: o.energy_kwh,
                grid_kwh: o.grid_kwh,
                feed_in_kwh: o.feed_in_kwh,
                cost: o.cost,
                emission_g: o.emission_g,
                connected_vehicles: o.connected_vehicles,
            });
        }
        self.last_committed = Some(tick);
        self.steps += 1;
        tracing::trace!(tick = %tick, at = %format_timestamp(unix_secs), "step committed");
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn series(&self, location: LocationId) -> &[LocationRecord] {
        self.series.get(location.index()).map_or(&[], Vec::as_slice)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn shortfalls(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::SchedulingShortfall { .. }))
            .count()
    }

    pub fn last_committed(&self) -> Option<Tick> {
        self.last_committed
    }

    pub fn steps_committed(&self) -> usize {
        self.steps
    }

    pub fn report(&self, status: RunStatus, fleet: &Fleet, infra: &Infrastructure) -> RunReport {
        let locations = infra
            .locations()
            .iter()
            .map(|loc| {
                let series = self.series(loc.id);
                LocationSummary {
                    location:      loc.id,
                    name:          loc.name.clone(),
                    energy_kwh:    series.iter().map(|r| r.energy_kwh).sum(),
                    grid_kwh:      series.iter().map(|r| r.grid_kwh).sum(),
                    feed_in_kwh:   series.iter().map(|r| r.feed_in_kwh).sum(),
                    cost:          series.iter().map(|r| r.cost).sum(),
                    emission_g:    series.iter().map(|r| r.emission_g).sum(),
                    peak_power_kw: series.iter().map(|r| r.power_kw).fold(0.0, f64::max),
                }
            })
            .collect();

        let vehicles = fleet
            .vehicles()
            .iter()
            .map(|v| VehicleSummary {
                vehicle:      v.id,
                name:         v.name.clone(),
                charged_kwh:  v.charged_kwh,
                consumed_kwh: v.consumed_kwh,
                min_soc:      v.history().iter().map(|r| r.soc).reduce(f64::min).unwrap_or(v.soc),
                final_soc:    v.history().last().map_or(v.soc, |r| r.soc),
            })
            .collect();

        RunReport {
            status,
            steps_committed: self.steps_committed(),
            shortfalls: self.shortfalls(),
            warnings: self.warnings.clone(),
            locations,
            vehicles,
        }
    }
}
