//! Pre-run task-list validation.

use fc_core::EPSILON;
use fc_infra::{GridContext, Infrastructure};

use crate::consumption::REFERENCE_TEMPERATURE_C;
use crate::{ConsumptionModel, Fleet, FleetError, FleetResult, TaskKind, Vehicle, VehicleType};

/// Check one vehicle's schedule before the run.
///
/// Fails on:
/// - a task whose end is not after its start, or two overlapping tasks;
/// - a drive to, or a vehicle parked at, a location absent from `infra`;
/// - a drive needing more energy than the vehicle can possibly hold above
///   its minimum SOC at that point.  The bound is the initial SOC until the
///   first Charge task and a full battery after it; whether the charge
///   actually happens is only known at run time.
///
/// A drive without its own temperature uses the `grid` temperature at the
/// planned departure location and start step, as the run does.  Without a
/// grid, or where the grid has no sample, [`REFERENCE_TEMPERATURE_C`] applies.
pub fn has_valid_task_list(
    vehicle:      &Vehicle,
    vehicle_type: &VehicleType,
    consumption:  &dyn ConsumptionModel,
    infra:        &Infrastructure,
    grid:         Option<&dyn GridContext>,
) -> FleetResult<()> {
    let tasks = vehicle.tasks();

    if let Some(task) = tasks.iter().find(|t| t.end <= t.start) {
        return Err(FleetError::EmptyTask { vehicle: vehicle.id, start: task.start, end: task.end });
    }
    if let Some((a, b)) = tasks.first_overlap() {
        let slice = tasks.as_slice();
        return Err(FleetError::OverlappingTasks {
            vehicle: vehicle.id,
            first:   slice[a].start,
            second:  slice[b].start,
        });
    }

    infra.location(vehicle.location)?;

    let mut soc_bound = vehicle.soc;
    let mut location = vehicle.location;
    for task in tasks.iter() {
        match &task.kind {
            TaskKind::Charge => soc_bound = 1.0,
            TaskKind::Drive(drive) => {
                infra.location(drive.destination)?;
                let temperature = drive.temperature_c.unwrap_or_else(|| {
                    grid.and_then(|g| g.sample(location, task.start).ok())
                        .map_or(REFERENCE_TEMPERATURE_C, |s| s.temperature_c)
                });
                let required = vehicle_type.soc_of(consumption.energy_kwh(vehicle_type, drive, temperature));
                if soc_bound - required < vehicle_type.soc_min - EPSILON {
                    return Err(FleetError::InsufficientEnergy {
                        vehicle:   vehicle.id,
                        start:     task.start,
                        required,
                        available: (soc_bound - vehicle_type.soc_min).max(0.0),
                    });
                }
                soc_bound -= required;
                location = drive.destination;
            }
            TaskKind::Park | TaskKind::Break => {}
        }
    }
    Ok(())
}

/// Validate every vehicle in id order, stopping at the first failure.
pub fn validate_fleet(
    fleet:       &Fleet,
    consumption: &dyn ConsumptionModel,
    infra:       &Infrastructure,
    grid:        Option<&dyn GridContext>,
) -> FleetResult<()> {
    for vehicle in fleet.vehicles() {
        let vt = fleet.vehicle_type(vehicle.vehicle_type)?;
        has_valid_task_list(vehicle, vt, consumption, infra, grid)?;
    }
    Ok(())
}
