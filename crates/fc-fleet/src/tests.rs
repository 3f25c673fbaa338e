//! Unit tests for fc-fleet.

use std::io::Cursor;

use fc_core::{LocationId, PlugTypeId, PointId, SimClock, Tick, VehicleTypeId, parse_timestamp};
use fc_infra::{ConstantGrid, GridContext, GridSample, Infrastructure, InfrastructureBuilder, LocationKind};

use crate::{
    ChargingCurve, ConsumptionModel, DriveTask, Fleet, FleetError, LinearConsumption, StepContext,
    Task, TaskKind, TaskList, Vehicle, VehicleState, VehicleType, has_valid_task_list,
    load_schedule_reader,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DEPOT: LocationId = LocationId(0);
const STATION: LocationId = LocationId(1);

fn infra() -> Infrastructure {
    let mut b = InfrastructureBuilder::new();
    let ccs = b.add_plug_type("ccs", 50.0).unwrap();
    let depot = b.add_location("depot", LocationKind::Depot, None).unwrap();
    b.add_location("station", LocationKind::Station, None).unwrap();
    let c = b.add_charger(depot, "c").unwrap();
    b.add_point(c, &[ccs], 1).unwrap();
    b.build()
}

/// 100 kWh battery, 0.2 kWh/km → 100 km costs 0.2 SOC.
fn van() -> VehicleType {
    VehicleType {
        id:                          VehicleTypeId(0),
        name:                        "van".into(),
        battery_capacity_kwh:        100.0,
        base_consumption_kwh_per_km: 0.2,
        charging_curve:              ChargingCurve::constant(40.0),
        soc_min:                     0.1,
        min_charging_power_kw:       1.0,
        plugs:                       vec![PlugTypeId(0)],
    }
}

fn drive(to: LocationId, km: f64) -> TaskKind {
    TaskKind::Drive(DriveTask { destination: to, distance_km: km, speed_kmh: 50.0, temperature_c: Some(20.0) })
}

fn vehicle(soc: f64, tasks: Vec<Task>) -> Vehicle {
    let mut v = Vehicle::new(fc_core::VehicleId(0), "v0", VehicleTypeId(0), soc, DEPOT);
    for t in tasks {
        v.add_task(t).unwrap();
    }
    v
}

struct Env {
    vt:          VehicleType,
    consumption: LinearConsumption,
    grid:        ConstantGrid,
}

impl Env {
    fn new() -> Self {
        Self {
            vt:          van(),
            consumption: LinearConsumption::flat(),
            grid:        ConstantGrid::new(GridSample { temperature_c: 20.0, ..GridSample::default() }),
        }
    }

    fn ctx(&self, ignore_warnings: bool) -> StepContext<'_> {
        StepContext {
            vehicle_type: &self.vt,
            consumption: &self.consumption,
            grid: &self.grid,
            ignore_warnings,
        }
    }
}

fn t(start: u64, end: u64, kind: TaskKind) -> Task {
    Task::new(Tick(start), Tick(end), kind)
}

// ── Charging curve ────────────────────────────────────────────────────────────

#[cfg(test)]
mod curve {
    use super::*;

    #[test]
    fn interpolates_between_points() {
        let c = ChargingCurve::new(vec![(0.8, 20.0), (0.0, 100.0), (1.0, 0.0)]).unwrap();
        assert_eq!(c.power_at(0.0), 100.0);
        assert!((c.power_at(0.4) - 60.0).abs() < 1e-9);
        assert!((c.power_at(0.9) - 10.0).abs() < 1e-9);
        assert_eq!(c.power_at(1.0), 0.0);
        assert_eq!(c.max_power_kw(), 100.0);
    }

    #[test]
    fn flat_outside_breakpoints() {
        let c = ChargingCurve::new(vec![(0.2, 50.0), (0.6, 30.0)]).unwrap();
        assert_eq!(c.power_at(0.05), 50.0);
        assert_eq!(c.power_at(0.95), 30.0);
        assert_eq!(c.power_at(-3.0), 50.0);
    }

    #[test]
    fn rejects_bad_points() {
        assert!(ChargingCurve::new(vec![]).is_err());
        assert!(ChargingCurve::new(vec![(1.2, 10.0)]).is_err());
        assert!(ChargingCurve::new(vec![(0.5, -1.0)]).is_err());
        assert!(ChargingCurve::new(vec![(0.5, 1.0), (0.5, 2.0)]).is_err());
    }

    #[test]
    fn vehicle_type_validation() {
        let mut vt = van();
        assert!(vt.validate().is_ok());
        vt.plugs.clear();
        assert!(vt.validate().is_err());
        let vt = VehicleType { battery_capacity_kwh: 0.0, ..van() };
        assert!(vt.validate().is_err());
    }
}

// ── TaskList ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod task_list {
    use super::*;

    #[test]
    fn insert_keeps_start_order() {
        let mut list = TaskList::new();
        list.insert(t(10, 12, TaskKind::Park));
        list.insert(t(0, 4, TaskKind::Charge));
        let idx = list.insert(t(5, 8, TaskKind::Break));
        assert_eq!(idx, 1);
        let starts: Vec<_> = list.iter().map(|t| t.start.0).collect();
        assert_eq!(starts, [0, 5, 10]);
    }

    #[test]
    fn active_index_respects_half_open_windows() {
        let list = TaskList::from_tasks(vec![t(0, 4, TaskKind::Park), t(4, 6, TaskKind::Charge), t(8, 9, TaskKind::Park)]);
        assert_eq!(list.active_index(Tick(0)), Some(0));
        assert_eq!(list.active_index(Tick(3)), Some(0));
        assert_eq!(list.active_index(Tick(4)), Some(1));
        assert_eq!(list.active_index(Tick(6)), None);
        assert_eq!(list.active_index(Tick(8)), Some(2));
        assert_eq!(list.active_index(Tick(9)), None);
    }

    #[test]
    fn overlap_detection() {
        let list = TaskList::from_tasks(vec![t(0, 4, TaskKind::Park), t(4, 6, TaskKind::Park)]);
        assert_eq!(list.first_overlap(), None);
        let list = TaskList::from_tasks(vec![t(0, 5, TaskKind::Park), t(4, 6, TaskKind::Park)]);
        assert_eq!(list.first_overlap(), Some((0, 1)));
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut list = TaskList::from_tasks(vec![t(0, 1, TaskKind::Park)]);
        assert!(list.remove(3).is_none());
        assert!(list.remove(0).is_some());
        assert!(list.is_empty());
    }
}

// ── Consumption ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod consumption {
    use super::*;

    #[test]
    fn flat_is_base_times_distance() {
        let d = DriveTask { destination: STATION, distance_km: 50.0, speed_kmh: 120.0, temperature_c: None };
        let e = LinearConsumption::flat().energy_kwh(&van(), &d, -10.0);
        assert!((e - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cold_and_speed_increase_energy() {
        let model = LinearConsumption::default();
        let d = DriveTask { destination: STATION, distance_km: 50.0, speed_kmh: 50.0, temperature_c: None };
        let mild = model.energy_kwh(&van(), &d, 20.0);
        let cold = model.energy_kwh(&van(), &d, -5.0);
        let fast = model.energy_kwh(&van(), &DriveTask { speed_kmh: 110.0, ..d }, 20.0);
        assert!((mild - 10.0).abs() < 1e-9);
        assert!(cold > mild);
        assert!(fast > mild);
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod validation {
    use super::*;

    fn clock() -> SimClock {
        SimClock::new(parse_timestamp("2023-01-01").unwrap(), 900)
    }

    fn at(clock: &SimClock, hhmm: &str) -> Tick {
        clock.tick_at(parse_timestamp(&format!("2023-01-01 {hhmm}")).unwrap()).unwrap()
    }

    #[test]
    fn overlapping_tasks_rejected() {
        let c = clock();
        let v = vehicle(0.9, vec![
            Task::new(at(&c, "10:00"), at(&c, "11:00"), TaskKind::Park),
            Task::new(at(&c, "10:30"), at(&c, "11:30"), TaskKind::Charge),
        ]);
        let err = has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, FleetError::OverlappingTasks { first, second, .. }
            if first == at(&c, "10:00") && second == at(&c, "10:30")));
    }

    #[test]
    fn back_to_back_tasks_accepted() {
        let v = vehicle(0.9, vec![t(0, 4, TaskKind::Park), t(4, 8, drive(STATION, 10.0))]);
        assert!(has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).is_ok());
    }

    #[test]
    fn empty_task_rejected() {
        let v = vehicle(0.9, vec![t(4, 4, TaskKind::Park)]);
        let err = has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).unwrap_err();
        assert!(matches!(err, FleetError::EmptyTask { .. }));
    }

    #[test]
    fn drive_beyond_usable_soc_rejected() {
        // 0.3 - 0.1 = 0.2 usable; 150 km needs 0.3.
        let v = vehicle(0.3, vec![t(0, 4, drive(STATION, 150.0))]);
        let err = has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).unwrap_err();
        assert!(matches!(err, FleetError::InsufficientEnergy { required, .. } if (required - 0.3).abs() < 1e-9));
    }

    #[test]
    fn charge_before_drive_lifts_bound() {
        let v = vehicle(0.3, vec![t(0, 4, TaskKind::Charge), t(4, 8, drive(STATION, 150.0))]);
        assert!(has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).is_ok());
    }

    #[test]
    fn cumulative_drives_checked() {
        // Two 0.4 drives from 0.9 land exactly on soc_min.
        let ok = vehicle(0.9, vec![t(0, 2, drive(STATION, 200.0)), t(2, 4, drive(DEPOT, 200.0))]);
        assert!(has_valid_task_list(&ok, &van(), &LinearConsumption::flat(), &infra(), None).is_ok());
        let bad = vehicle(0.9, vec![t(0, 2, drive(STATION, 200.0)), t(2, 4, drive(DEPOT, 205.0))]);
        assert!(has_valid_task_list(&bad, &van(), &LinearConsumption::flat(), &infra(), None).is_err());
    }

    #[test]
    fn drive_temperature_falls_back_to_grid() {
        // 180 km at 20 °C needs 0.36 of the 0.4 usable; at -15 °C it needs 0.522.
        let cold_drive = TaskKind::Drive(DriveTask {
            destination:   STATION,
            distance_km:   180.0,
            speed_kmh:     50.0,
            temperature_c: None,
        });
        let v = vehicle(0.5, vec![t(0, 4, cold_drive)]);
        let model = LinearConsumption::default();
        let mild = ConstantGrid::new(GridSample { temperature_c: 20.0, ..GridSample::default() });
        let cold = ConstantGrid::new(GridSample { temperature_c: -15.0, ..GridSample::default() });

        assert!(has_valid_task_list(&v, &van(), &model, &infra(), None).is_ok());
        assert!(has_valid_task_list(&v, &van(), &model, &infra(), Some(&mild as &dyn GridContext)).is_ok());
        let err = has_valid_task_list(&v, &van(), &model, &infra(), Some(&cold as &dyn GridContext)).unwrap_err();
        assert!(matches!(err, FleetError::InsufficientEnergy { required, .. } if (required - 0.522).abs() < 1e-9));
    }

    #[test]
    fn unknown_destination_is_reference_error() {
        let v = vehicle(0.9, vec![t(0, 4, drive(LocationId(9), 1.0))]);
        let err = has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).unwrap_err();
        assert!(!err.is_validation());
        assert!(err.is_unknown_reference());
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod state_machine {
    use super::*;

    #[test]
    fn starts_idle_without_tasks() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![]);
        let out = v.advance(Tick(0), &env.ctx(false)).unwrap();
        assert_eq!(out, Default::default());
        assert_eq!(v.state, VehicleState::Idle);
    }

    #[test]
    fn drive_spreads_energy_and_moves_at_end() {
        let env = Env::new();
        // 100 km = 0.2 SOC over 4 steps.
        let mut v = vehicle(0.9, vec![t(0, 4, drive(STATION, 100.0))]);
        let mut socs = Vec::new();
        for tick in 0..4 {
            v.advance(Tick(tick), &env.ctx(false)).unwrap();
            assert_eq!(v.state, VehicleState::Driving);
            assert_eq!(v.location, DEPOT, "location changes only at task end");
            socs.push(v.soc);
        }
        assert!((socs[0] - 0.85).abs() < 1e-9);
        assert!((socs[1] - 0.80).abs() < 1e-9);
        assert!((socs[3] - 0.70).abs() < 1e-9);

        v.advance(Tick(4), &env.ctx(false)).unwrap();
        assert_eq!(v.state, VehicleState::Idle);
        assert_eq!(v.location, STATION);
        assert!((v.consumed_kwh - 20.0).abs() < 1e-9);
    }

    #[test]
    fn drive_uses_grid_temperature_when_unset() {
        let mut env = Env::new();
        env.consumption = LinearConsumption::default();
        env.grid = ConstantGrid::new(GridSample { temperature_c: -5.0, ..GridSample::default() });
        let d = TaskKind::Drive(DriveTask { destination: STATION, distance_km: 100.0, speed_kmh: 50.0, temperature_c: None });
        let mut v = vehicle(0.9, vec![t(0, 1, d)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        // 20 °C below comfort band → +30 %.
        assert!((v.consumed_kwh - 26.0).abs() < 1e-9);
    }

    #[test]
    fn infeasible_drive_is_fatal() {
        let env = Env::new();
        // SOC 0.15, min 0.10, drive needs 0.20.
        let mut v = vehicle(0.15, vec![t(2, 4, drive(STATION, 100.0))]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        let err = v.advance(Tick(2), &env.ctx(false)).unwrap_err();
        match err {
            FleetError::InfeasibleSchedule { tick, soc, required, .. } => {
                assert_eq!(tick, Tick(2));
                assert!((soc - 0.15).abs() < 1e-9);
                assert!((required - 0.20).abs() < 1e-9);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn infeasible_drive_degrades_when_ignoring_warnings() {
        let env = Env::new();
        let mut v = vehicle(0.15, vec![t(0, 2, drive(STATION, 100.0))]);
        let out = v.advance(Tick(0), &env.ctx(true)).unwrap();
        let deficit = out.degraded.unwrap();
        assert!((deficit.required - 0.2).abs() < 1e-9);
        v.advance(Tick(1), &env.ctx(true)).unwrap();
        v.advance(Tick(2), &env.ctx(true)).unwrap();
        assert_eq!(v.soc, 0.0);
        assert_eq!(v.location, STATION);
    }

    #[test]
    fn charge_waits_parked_until_attached() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![t(0, 8, TaskKind::Charge)]);
        let out = v.advance(Tick(0), &env.ctx(false)).unwrap();
        assert!(out.needs_point);
        assert_eq!(v.state, VehicleState::Parked);

        // Still no point: asks again.
        let out = v.advance(Tick(1), &env.ctx(false)).unwrap();
        assert!(out.needs_point);

        v.attach(PointId(3), DEPOT, 0.0, &env.vt);
        assert_eq!(v.state, VehicleState::Charging);
        assert!(v.is_charging());
        let out = v.advance(Tick(2), &env.ctx(false)).unwrap();
        assert!(!out.needs_point);
        assert_eq!(v.state, VehicleState::Charging);
    }

    #[test]
    fn full_battery_releases_point_early() {
        let env = Env::new();
        let mut v = vehicle(0.9, vec![t(0, 8, TaskKind::Charge)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        v.attach(PointId(0), DEPOT, 0.0, &env.vt);
        v.apply_charge(40.0, 10.0, 1.0);
        assert!((v.charged_kwh - 10.0).abs() < 1e-9);

        let out = v.advance(Tick(1), &env.ctx(false)).unwrap();
        assert_eq!(out.released, Some(PointId(0)));
        assert!(!out.needs_point);
        assert_eq!(v.state, VehicleState::Idle);
        assert_eq!(v.point, None);

        // Task window still open, but no new request.
        let out = v.advance(Tick(2), &env.ctx(false)).unwrap();
        assert!(!out.needs_point);
    }

    #[test]
    fn charge_end_releases_point() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![t(0, 2, TaskKind::Charge), t(2, 3, TaskKind::Park)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        v.attach(PointId(1), DEPOT, 0.0, &env.vt);
        v.advance(Tick(1), &env.ctx(false)).unwrap();
        let out = v.advance(Tick(2), &env.ctx(false)).unwrap();
        assert_eq!(out.released, Some(PointId(1)));
        assert_eq!(v.state, VehicleState::Parked);
    }

    #[test]
    fn force_release_ends_charge() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![t(0, 8, TaskKind::Charge)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        v.attach(PointId(2), DEPOT, 0.0, &env.vt);
        v.mark_force_released();
        let out = v.advance(Tick(1), &env.ctx(false)).unwrap();
        assert_eq!(out.released, Some(PointId(2)));
        assert_eq!(v.state, VehicleState::Idle);
    }

    #[test]
    fn detour_is_paid_on_attach() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![]);
        v.attach(PointId(0), STATION, 10.0, &env.vt);
        assert!((v.soc - 0.4).abs() < 1e-9);
        assert_eq!(v.location, STATION);
    }

    #[test]
    fn tasks_locked_after_first_step() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![t(0, 2, TaskKind::Park)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        assert!(matches!(v.add_task(t(4, 5, TaskKind::Park)), Err(FleetError::TasksLocked(_))));
        assert!(v.remove_task(0).is_err());
    }

    #[test]
    fn record_appends_history() {
        let env = Env::new();
        let mut v = vehicle(0.5, vec![t(0, 2, TaskKind::Park)]);
        v.advance(Tick(0), &env.ctx(false)).unwrap();
        v.record(Tick(0), 3600);
        assert_eq!(v.history()[0].unix_secs, 3600);
        assert_eq!(v.history().len(), 1);
        assert_eq!(v.history()[0].state, VehicleState::Parked);
        assert_eq!(v.history()[0].soc, 0.5);
    }
}

// ── Fleet and loader ──────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use super::*;

    #[test]
    fn add_and_lookup() {
        let mut fleet = Fleet::new();
        let vt = fleet.add_vehicle_type(van()).unwrap();
        let a = fleet.add_vehicle("a", vt, 0.8, DEPOT).unwrap();
        let b = fleet.add_vehicle("b", vt, 0.6, STATION).unwrap();
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.vehicle_by_name("b").unwrap(), b);
        assert_eq!(fleet.type_of(a).unwrap().name, "van");
        assert!(fleet.add_vehicle("a", vt, 0.5, DEPOT).is_err());
        assert!(fleet.add_vehicle("c", vt, 1.5, DEPOT).is_err());
        assert!(fleet.add_vehicle("d", VehicleTypeId(4), 0.5, DEPOT).is_err());
    }

    #[test]
    fn schedule_for_unknown_vehicle_rejected() {
        let mut fleet = Fleet::new();
        fleet.add_vehicle_type(van()).unwrap();
        let mut schedule = std::collections::HashMap::new();
        schedule.insert("ghost".to_string(), vec![t(0, 1, TaskKind::Park)]);
        let err = fleet.assign_schedule(schedule).unwrap_err();
        assert!(err.is_unknown_reference());
    }
}

#[cfg(test)]
mod loader {
    use super::*;

    const CSV: &str = "\
vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c
bus_1,drive,2023-01-01 06:00:00,2023-01-01 07:00:00,station,40,,
bus_1,charge,2023-01-01 07:00:00,2023-01-01 09:00:00,,,,
bus_2,break,2023-01-01 06:10:00,2023-01-01 06:50:00,,,,
bus_2,drive,2023-01-01 07:00:00,2023-01-01 07:30:00,depot,12.5,30,-2.5
bus_2,park,2022-12-31 20:00:00,2022-12-31 23:00:00,,,,
";

    fn clock() -> SimClock {
        SimClock::new(parse_timestamp("2023-01-01").unwrap(), 900)
    }

    #[test]
    fn rows_grouped_and_converted() {
        let map = load_schedule_reader(Cursor::new(CSV), &clock(), &infra()).unwrap();
        let bus1 = &map["bus_1"];
        assert_eq!(bus1.len(), 2);
        assert_eq!(bus1[0].start, Tick(24));
        assert_eq!(bus1[0].end, Tick(28));
        let d = bus1[0].drive().unwrap();
        assert_eq!(d.destination, STATION);
        assert_eq!(d.speed_kmh, crate::loader::DEFAULT_SPEED_KMH);
        assert_eq!(d.temperature_c, None);
        assert_eq!(bus1[1].kind, TaskKind::Charge);

        // Row entirely before the start is dropped; starts floor, ends round up.
        let bus2 = &map["bus_2"];
        assert_eq!(bus2.len(), 2);
        assert_eq!(bus2[0].kind, TaskKind::Break);
        assert_eq!((bus2[0].start, bus2[0].end), (Tick(24), Tick(28)));
        assert_eq!(bus2[1].drive().unwrap().temperature_c, Some(-2.5));
    }

    #[test]
    fn task_shorter_than_a_step_keeps_one_step() {
        let csv = "vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c\n\
                   v0,park,2023-01-01 06:10:00,2023-01-01 07:00:00,,,,\n\
                   v0,drive,2023-01-01 06:00:00,2023-01-01 06:10:00,station,8,48,\n";
        let map = load_schedule_reader(Cursor::new(csv), &clock(), &infra()).unwrap();
        let tasks = &map["v0"];
        assert_eq!((tasks[0].start, tasks[0].end), (Tick(24), Tick(25)));
        assert_eq!(tasks[0].drive().unwrap().distance_km, 8.0);
        assert_eq!((tasks[1].start, tasks[1].end), (Tick(25), Tick(28)));
        assert_eq!(tasks[1].kind, TaskKind::Park);

        let v = vehicle(0.9, tasks.clone());
        assert!(has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).is_ok());
    }

    #[test]
    fn wall_clock_overlap_survives_snapping() {
        let csv = "vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c\n\
                   v0,park,2023-01-01 06:00:00,2023-01-01 07:00:00,,,,\n\
                   v0,charge,2023-01-01 06:30:00,2023-01-01 08:00:00,,,,\n";
        let map = load_schedule_reader(Cursor::new(csv), &clock(), &infra()).unwrap();
        let v = vehicle(0.9, map["v0"].clone());
        let err = has_valid_task_list(&v, &van(), &LinearConsumption::flat(), &infra(), None).unwrap_err();
        assert!(matches!(err, FleetError::OverlappingTasks { .. }));
    }

    #[test]
    fn unknown_destination_rejected() {
        let csv = "vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c\n\
                   v,drive,2023-01-01 06:00,2023-01-01 07:00,moon,1,,\n";
        let err = load_schedule_reader(Cursor::new(csv), &clock(), &infra()).unwrap_err();
        assert!(err.is_unknown_reference());
    }

    #[test]
    fn invalid_task_kind_rejected() {
        let csv = "vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c\n\
                   v,teleport,2023-01-01 06:00,2023-01-01 07:00,,,,\n";
        assert!(matches!(
            load_schedule_reader(Cursor::new(csv), &clock(), &infra()),
            Err(FleetError::Parse(_))
        ));
    }
}
