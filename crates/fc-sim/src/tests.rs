//! Scenario tests for fc-sim.

use fc_charge::{Criterion, Weights};
use fc_core::{EPSILON, LocationId, PlugTypeId, PointId, SimConfig, Tick, VehicleId, VehicleTypeId};
use fc_fleet::{ChargingCurve, DriveTask, Fleet, Task, TaskKind, VehicleState, VehicleType};
use fc_infra::{ConstantGrid, DistanceTable, GridSample, Infrastructure, InfrastructureBuilder, LocationKind};

use crate::{
    AbortHandle, ErrorPhase, NoopObserver, RunStatus, Sim, SimBuilder, SimError, SimObserver, StepStats,
    Warning, run_batch,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DEPOT: LocationId = LocationId(0);
const STATION: LocationId = LocationId(1);
const CCS: PlugTypeId = PlugTypeId(0);
const TYPE2: PlugTypeId = PlugTypeId(1);
const V0: VehicleId = VehicleId(0);
const V1: VehicleId = VehicleId(1);

fn config(total_ticks: u64) -> SimConfig {
    SimConfig {
        tick_duration_secs: 900,
        total_ticks,
        ..SimConfig::default()
    }
}

/// `depot_points` × 50 kW at the depot, one 50 kW point at the station.
/// A `type2` plug type exists but no point carries it.
fn infra(depot_points: usize, depot_ceiling: Option<f64>) -> Infrastructure {
    let mut b = InfrastructureBuilder::new();
    let ccs = b.add_plug_type("ccs", 50.0).unwrap();
    b.add_plug_type("type2", 22.0).unwrap();
    let depot = b.add_location("depot", LocationKind::Depot, depot_ceiling).unwrap();
    let station = b.add_location("station", LocationKind::Station, None).unwrap();
    let d = b.add_charger(depot, "d0").unwrap();
    for _ in 0..depot_points {
        b.add_point(d, &[ccs], 1).unwrap();
    }
    let s = b.add_charger(station, "s0").unwrap();
    b.add_point(s, &[ccs], 1).unwrap();
    b.build()
}

/// 100 kWh, 0.2 kWh/km, flat 40 kW curve, soc_min 0.1.
fn van(plug: PlugTypeId) -> VehicleType {
    VehicleType {
        id:                          VehicleTypeId(0),
        name:                        "van".into(),
        battery_capacity_kwh:        100.0,
        base_consumption_kwh_per_km: 0.2,
        charging_curve:              ChargingCurve::constant(40.0),
        soc_min:                     0.1,
        min_charging_power_kw:       1.0,
        plugs:                       vec![plug],
    }
}

fn fleet(plug: PlugTypeId, vehicles: Vec<(f64, Vec<Task>)>) -> Fleet {
    let mut f = Fleet::new();
    let vt = f.add_vehicle_type(van(plug)).unwrap();
    for (i, (soc, tasks)) in vehicles.into_iter().enumerate() {
        let id = f.add_vehicle(&format!("v{i}"), vt, soc, DEPOT).unwrap();
        for t in tasks {
            f.vehicle_mut(id).unwrap().add_task(t).unwrap();
        }
    }
    f
}

fn grid() -> ConstantGrid {
    ConstantGrid::new(GridSample {
        feed_in_kwh:        0.0,
        price_per_kwh:      0.3,
        emission_g_per_kwh: 400.0,
        temperature_c:      20.0,
    })
}

fn distances() -> DistanceTable {
    let mut d = DistanceTable::new();
    d.insert(DEPOT, STATION, 10.0).unwrap();
    d
}

fn charge(start: u64, end: u64) -> Task {
    Task::new(Tick(start), Tick(end), TaskKind::Charge)
}

fn drive(start: u64, end: u64, to: LocationId, km: f64) -> Task {
    Task::new(
        Tick(start),
        Tick(end),
        TaskKind::Drive(DriveTask { destination: to, distance_km: km, speed_kmh: 50.0, temperature_c: None }),
    )
}

fn build(config: SimConfig, fleet: Fleet, infra: Infrastructure) -> Sim<ConstantGrid> {
    SimBuilder::new(config, fleet, infra, grid())
        .distances(distances())
        .build()
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[derive(Default)]
struct Recorder {
    starts:      Vec<Tick>,
    ends:        Vec<(Tick, StepStats)>,
    snapshots:   Vec<(Tick, i64)>,
    finished:    Vec<RunStatus>,
    abort_after: Option<(Tick, AbortHandle)>,
}

impl SimObserver for Recorder {
    fn on_step_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }

    fn on_step_end(&mut self, tick: Tick, stats: &StepStats) {
        self.ends.push((tick, stats.clone()));
        if let Some((at, handle)) = &self.abort_after {
            if tick >= *at {
                handle.request();
            }
        }
    }

    fn on_snapshot(&mut self, tick: Tick, unix_secs: i64, _fleet: &Fleet, _infra: &Infrastructure) {
        self.snapshots.push((tick, unix_secs));
    }

    fn on_sim_end(&mut self, _final_tick: Tick, status: &RunStatus) {
        self.finished.push(status.clone());
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_and_starts_pending() {
        let sim = build(config(4), fleet(CCS, vec![(0.5, vec![charge(0, 4)])]), infra(1, None));
        assert_eq!(*sim.status(), RunStatus::Pending);
        assert_eq!(sim.clock.current_tick, Tick(0));
    }

    #[test]
    fn invalid_config_is_pre_run() {
        let mut cfg = config(4);
        cfg.tick_duration_secs = 0;
        let err = SimBuilder::new(cfg, fleet(CCS, vec![]), infra(1, None), grid())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::Configuration(_)));
        assert_eq!(err.phase(), ErrorPhase::PreRun);
    }

    #[test]
    fn overlapping_tasks_fail_validation() {
        // 10:00–11:00 and 10:30–11:30 at 15-minute steps.
        let f = fleet(
            CCS,
            vec![(0.9, vec![Task::new(Tick(40), Tick(44), TaskKind::Park), Task::new(Tick(42), Tick(46), TaskKind::Park)])],
        );
        let err = SimBuilder::new(config(96), f, infra(1, None), grid()).build().err().unwrap();
        assert!(matches!(err, SimError::Validation(_)));
        assert_eq!(err.phase(), ErrorPhase::PreRun);
        assert_eq!(err.vehicle(), Some(V0));
    }

    #[test]
    fn unknown_destination_is_configuration_error() {
        let f = fleet(CCS, vec![(0.9, vec![drive(0, 2, LocationId(7), 5.0)])]);
        let err = SimBuilder::new(config(4), f, infra(1, None), grid()).build().err().unwrap();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn drive_beyond_usable_soc_without_charge_fails_validation() {
        // 0.15 − 0.20 < 0.10 and nothing charges before the drive.
        let f = fleet(CCS, vec![(0.15, vec![drive(2, 4, STATION, 100.0)])]);
        let err = SimBuilder::new(config(4), f, infra(1, None), grid()).build().err().unwrap();
        assert!(matches!(err, SimError::Validation(_)));
    }
}

// ── Allocation scenarios ──────────────────────────────────────────────────────

#[cfg(test)]
mod allocation {
    use super::*;

    #[test]
    fn unclipped_request_is_delivered() {
        let mut sim = build(config(4), fleet(CCS, vec![(0.5, vec![charge(0, 4)])]), infra(1, None));
        sim.run(&mut NoopObserver).unwrap();

        let h = sim.fleet.vehicle(V0).unwrap().history();
        assert_eq!(h.len(), 4);
        assert!(close(h[0].charging_power_kw, 40.0));
        assert!(close(h[0].soc, 0.6));
        assert_eq!(h[0].state, VehicleState::Charging);
        assert_eq!(h[0].point, Some(PointId(0)));
        assert!(close(sim.aggregator.series(DEPOT)[0].power_kw, 40.0));
        assert!(close(sim.aggregator.series(DEPOT)[0].cost, 10.0 * 0.3));
    }

    #[test]
    fn ceiling_is_never_exceeded() {
        let f = fleet(CCS, vec![(0.2, vec![charge(0, 8)]), (0.2, vec![charge(0, 8)])]);
        let mut sim = build(config(8), f, infra(2, Some(50.0)));
        sim.run(&mut NoopObserver).unwrap();

        for r in sim.aggregator.series(DEPOT) {
            assert!(r.power_kw <= 50.0 + EPSILON, "{} kW at {}", r.power_kw, r.tick);
        }
        // Lower point id settles first: 40 kW, then the 10 kW left.
        let first = &sim.aggregator.series(DEPOT)[0];
        assert!(close(first.power_kw, 50.0));
        assert!(close(sim.fleet.vehicle(V0).unwrap().history()[0].charging_power_kw, 40.0));
        assert!(close(sim.fleet.vehicle(V1).unwrap().history()[0].charging_power_kw, 10.0));
        assert_eq!(first.connected_vehicles, 2);
    }

    #[test]
    fn point_freed_when_full() {
        let f = fleet(CCS, vec![(0.9, vec![charge(0, 8)])]);
        let mut sim = build(config(8), f, infra(1, None));
        sim.run(&mut NoopObserver).unwrap();

        let h = sim.fleet.vehicle(V0).unwrap().history();
        assert!(close(h[0].soc, 1.0));
        assert_eq!(h[1].state, VehicleState::Idle);
        assert_eq!(h[1].point, None);
        assert!(sim.infra.point(PointId(0)).unwrap().is_free());
    }

    #[test]
    fn remote_location_charges_after_detour() {
        let f = fleet(CCS, vec![(0.5, vec![charge(0, 2)])]);
        let mut sim = build(config(2), f, infra(0, None));
        sim.run(&mut NoopObserver).unwrap();

        let v = sim.fleet.vehicle(V0).unwrap();
        assert_eq!(v.location, STATION);
        // 10 km detour (0.02) then one step at 40 kW (0.10).
        assert!(close(v.history()[0].soc, 0.58));
        assert!(close(v.consumed_kwh, 2.0));
        assert!(close(sim.aggregator.series(STATION)[0].power_kw, 40.0));
    }

    #[test]
    fn shortfall_retries_until_point_frees() {
        // v0 fills up in one step and leaves the only depot point to v1.
        let f = fleet(CCS, vec![(0.95, vec![charge(0, 4)]), (0.5, vec![charge(0, 4)])]);
        let mut sim = SimBuilder::new(config(4), f, infra(1, None), grid()).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.ends[0].1.shortfalls, 1);
        assert_eq!(rec.ends[1].1.assigned, 1);
        let report = sim.report();
        assert_eq!(report.shortfalls, 1);
        assert!(matches!(report.warnings[0], Warning::SchedulingShortfall { vehicle, .. } if vehicle == V1));
        assert!(sim.fleet.vehicle(V1).unwrap().history()[1].charging_power_kw > 0.0);
    }

    #[test]
    fn force_release_ends_charge_next_step() {
        let f = fleet(CCS, vec![(0.2, vec![charge(0, 8)])]);
        let mut sim = build(config(8), f, infra(1, None));
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.force_release(PointId(0)).unwrap(), vec![V0]);
        assert!(sim.infra.point(PointId(0)).unwrap().is_free());

        sim.run_ticks(1, &mut NoopObserver).unwrap();
        let last = sim.fleet.vehicle(V0).unwrap().history().last().unwrap().clone();
        assert_eq!(last.state, VehicleState::Idle);
        assert_eq!(last.point, None);
        assert_eq!(last.charging_power_kw, 0.0);
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use super::*;

    /// Two vans out to the station and back, charging in between.
    fn round_trip(seed: Option<u64>) -> Sim<ConstantGrid> {
        let tasks = || vec![drive(0, 4, STATION, 50.0), charge(4, 12), drive(12, 16, DEPOT, 50.0), charge(16, 24)];
        let f = fleet(CCS, vec![(0.8, tasks()), (0.7, tasks())]);
        let mut cfg = config(24);
        cfg.seed = seed;
        let mut d = DistanceTable::new();
        d.insert(DEPOT, STATION, 50.0).unwrap();
        SimBuilder::new(cfg, f, infra(1, Some(60.0)), grid())
            .distances(d)
            .weights(Weights::zero().with(Criterion::Distance, 1.0))
            .build()
            .unwrap()
    }

    #[test]
    fn soc_stays_in_bounds() {
        let mut sim = round_trip(None);
        sim.run(&mut NoopObserver).unwrap();
        for v in sim.fleet.vehicles() {
            for r in v.history() {
                assert!(r.soc >= 0.1 - EPSILON && r.soc <= 1.0 + EPSILON, "{} SOC {} at {}", v.name, r.soc, r.tick);
            }
        }
        assert!(matches!(sim.status(), RunStatus::Completed { final_tick } if *final_tick == Tick(24)));
    }

    #[test]
    fn identical_runs_are_identical() {
        let mut a = round_trip(Some(7));
        let mut b = round_trip(Some(7));
        a.run(&mut NoopObserver).unwrap();
        b.run(&mut NoopObserver).unwrap();
        for loc in [DEPOT, STATION] {
            assert_eq!(a.aggregator.series(loc), b.aggregator.series(loc));
        }
        for (va, vb) in a.fleet.vehicles().iter().zip(b.fleet.vehicles()) {
            assert_eq!(va.history(), vb.history());
        }
        assert_eq!(a.report(), b.report());
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;

    /// Charge then a 0.20-SOC drive, but no point takes the van's plug.
    /// The drive ends at tick 4, inside the five-step horizon.
    fn stranded(ignore_warnings: bool) -> Sim<ConstantGrid> {
        let f = fleet(TYPE2, vec![(0.15, vec![charge(0, 2), drive(2, 4, STATION, 100.0)])]);
        let mut cfg = config(5);
        cfg.ignore_warnings = ignore_warnings;
        build(cfg, f, infra(1, None))
    }

    #[test]
    fn no_capacity_before_drive_is_infeasible() {
        let mut sim = stranded(false);
        let mut rec = Recorder::default();
        let err = sim.run(&mut rec).unwrap_err();

        assert!(matches!(err, SimError::InfeasibleSchedule { vehicle, tick, .. } if vehicle == V0 && tick == Tick(2)));
        assert_eq!(err.phase(), ErrorPhase::InRun);
        match sim.status() {
            RunStatus::Failed { last_committed, vehicle, phase, .. } => {
                assert_eq!(*last_committed, Some(Tick(1)));
                assert_eq!(*vehicle, Some(V0));
                assert_eq!(*phase, ErrorPhase::InRun);
            }
            other => panic!("unexpected status {other:?}"),
        }
        // Both committed steps survive the failure.
        assert_eq!(sim.fleet.vehicle(V0).unwrap().history().len(), 2);
        assert_eq!(sim.aggregator.steps_committed(), 2);
        assert_eq!(rec.finished.len(), 1);
        assert!(rec.finished[0].is_failed());
    }

    #[test]
    fn ignore_warnings_degrades_instead() {
        let mut sim = stranded(true);
        sim.run(&mut NoopObserver).unwrap();
        let report = sim.report();
        assert_eq!(report.shortfalls, 2);
        assert!(report.warnings.iter().any(|w| matches!(w, Warning::DegradedSoc { tick, .. } if *tick == Tick(2))));
        assert_eq!(sim.fleet.vehicle(V0).unwrap().location, STATION);
    }

    #[test]
    fn grid_gap_is_data_range() {
        let mut g = grid();
        g.horizon = Some(Tick(2));
        let f = fleet(CCS, vec![(0.2, vec![charge(0, 4)])]);
        let mut sim = SimBuilder::new(config(4), f, infra(1, None), g).build().unwrap();
        let err = sim.run(&mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::DataRange(_)));
        assert_eq!(sim.aggregator.last_committed(), Some(Tick(1)));
    }

    #[test]
    fn abort_between_steps_keeps_outputs() {
        let f = fleet(CCS, vec![(0.2, vec![charge(0, 8)])]);
        let mut sim = build(config(8), f, infra(1, None));
        let mut rec = Recorder { abort_after: Some((Tick(2), sim.abort_handle())), ..Recorder::default() };
        let err = sim.run(&mut rec).unwrap_err();

        assert!(matches!(err, SimError::Aborted(t) if t == Tick(3)));
        assert_eq!(sim.aggregator.steps_committed(), 3);
        assert_eq!(sim.fleet.vehicle(V0).unwrap().history().len(), 3);
        assert!(sim.status().is_failed());
        assert_eq!(rec.starts.len(), 3);
    }

    #[test]
    fn request_abort_before_run() {
        let mut sim = build(config(4), fleet(CCS, vec![]), infra(1, None));
        sim.request_abort();
        let err = sim.run(&mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::Aborted(t) if t == Tick(0)));
        assert!(matches!(sim.status(), RunStatus::Failed { last_committed: None, .. }));
    }
}

// ── Observer and batch ────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_and_batch {
    use super::*;

    #[test]
    fn hooks_fire_per_step() {
        let mut cfg = config(5);
        cfg.output_interval_ticks = 2;
        cfg.start_unix_secs = 1_700_000_000;
        let mut sim = build(cfg, fleet(CCS, vec![(0.5, vec![charge(0, 5)])]), infra(1, None));
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.starts, (0..5).map(Tick).collect::<Vec<_>>());
        assert_eq!(rec.ends.len(), 5);
        assert_eq!(
            rec.snapshots,
            vec![(Tick(0), 1_700_000_000), (Tick(2), 1_700_001_800), (Tick(4), 1_700_003_600)]
        );
        assert_eq!(rec.finished, vec![RunStatus::Completed { final_tick: Tick(5) }]);
    }

    #[test]
    fn batch_results_in_job_order() {
        let jobs: Vec<u64> = vec![3, 1, 2];
        let results = run_batch(jobs, Some(2), |i, ticks| {
            let mut sim = build(config(ticks), fleet(CCS, vec![(0.5, vec![charge(0, 4)])]), infra(1, None));
            sim.run(&mut NoopObserver).map(|_| (i, sim.report().steps_committed))
        })
        .unwrap();
        let got: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(got, vec![(0, 3), (1, 1), (2, 2)]);
    }

    #[test]
    fn batch_rejects_zero_threads() {
        let err = run_batch(vec![1], Some(0), |_, x: i32| x).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }
}
