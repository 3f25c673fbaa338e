//! Schedule CSV loader.
//!
//! # CSV format
//!
//! One row per task.  Drive-only columns are left empty for other tasks.
//!
//! ```csv
//! vehicle,task,start_time,end_time,destination,distance_km,speed_kmh,temperature_c
//! bus_1,drive,2023-01-01 06:00:00,2023-01-01 07:00:00,station,40,45,
//! bus_1,charge,2023-01-01 07:00:00,2023-01-01 09:00:00,,,,
//! bus_1,break,2023-01-01 09:00:00,2023-01-01 09:30:00,,,,
//! ```
//!
//! | `task`              | Kind                |
//! |---------------------|---------------------|
//! | `drive`             | `TaskKind::Drive`   |
//! | `park`, `parking`   | `TaskKind::Park`    |
//! | `break`             | `TaskKind::Break`   |
//! | `charge`, `charging`| `TaskKind::Charge`  |
//!
//! Start times are floored and end times rounded up onto the step grid, so
//! every task covers at least one step.  When snapping makes a task run into
//! the next one, the later task is pushed back to start where the earlier
//! one ends; rows that overlap in wall-clock time are left as they are and
//! rejected by validation.  Tasks ending at or before the simulation start
//! are dropped; tasks straddling it are clipped to tick 0.
//! An empty `temperature_c` defers to the grid context at run time, and an
//! empty `speed_kmh` uses [`DEFAULT_SPEED_KMH`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use fc_core::{SimClock, Tick, parse_timestamp};
use fc_infra::Infrastructure;

use crate::{DriveTask, FleetError, FleetResult, Task, TaskKind};

pub const DEFAULT_SPEED_KMH: f64 = 50.0;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TaskRecord {
    #[serde(alias = "vehicle_id")]
    vehicle:       String,
    task:          String,
    start_time:    String,
    end_time:      String,
    destination:   Option<String>,
    distance_km:   Option<f64>,
    speed_kmh:     Option<f64>,
    temperature_c: Option<f64>,
}

/// A task with the wall-clock span it was read from.
struct Row {
    start: i64,
    end:   i64,
    task:  Task,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load tasks grouped by vehicle name.
pub fn load_schedule_csv(
    path:  &Path,
    clock: &SimClock,
    infra: &Infrastructure,
) -> FleetResult<HashMap<String, Vec<Task>>> {
    let file = std::fs::File::open(path)?;
    load_schedule_reader(file, clock, infra)
}

/// Like [`load_schedule_csv`] but accepts any `Read` source.
pub fn load_schedule_reader<R: Read>(
    reader: R,
    clock:  &SimClock,
    infra:  &Infrastructure,
) -> FleetResult<HashMap<String, Vec<Task>>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_vehicle: HashMap<String, Vec<Row>> = HashMap::new();
    let mut dropped = 0usize;

    for (line, result) in csv_reader.deserialize::<TaskRecord>().enumerate() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let start = parse_timestamp(&row.start_time)?;
        let end = parse_timestamp(&row.end_time)?;

        if end <= clock.start_unix_secs {
            dropped += 1;
            continue;
        }
        let start_tick = clock.tick_at(start).unwrap_or(Tick::ZERO);
        let end_tick = clock.tick_at_or_after(end).unwrap_or(Tick::ZERO);

        let kind = parse_kind(&row, line + 2, infra)?;
        by_vehicle
            .entry(row.vehicle.trim().to_string())
            .or_default()
            .push(Row { start, end, task: Task::new(start_tick, end_tick, kind) });
    }

    if dropped > 0 {
        debug!(dropped, "schedule rows ending before simulation start ignored");
    }
    Ok(by_vehicle
        .into_iter()
        .map(|(name, rows)| (name, snap_rows(rows)))
        .collect())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Give every task at least one step and resolve overlaps introduced by
/// rounding onto the step grid.
fn snap_rows(mut rows: Vec<Row>) -> Vec<Task> {
    rows.sort_by_key(|r| (r.start, r.end));
    let mut tasks: Vec<Task> = Vec::with_capacity(rows.len());
    let mut prev: Option<(i64, Tick)> = None;
    for Row { start, end, mut task } in rows {
        if let Some((prev_end, prev_tick)) = prev {
            if start >= prev_end && task.start < prev_tick {
                task.start = prev_tick;
            }
        }
        if task.end <= task.start {
            task.end = Tick(task.start.0 + 1);
        }
        prev = Some((end, task.end));
        tasks.push(task);
    }
    tasks
}

fn parse_kind(row: &TaskRecord, line: usize, infra: &Infrastructure) -> FleetResult<TaskKind> {
    match row.task.trim().to_ascii_lowercase().as_str() {
        "drive" | "driving" => {
            let destination = row
                .destination
                .as_deref()
                .ok_or_else(|| FleetError::Parse(format!("line {line}: drive without destination")))?;
            let distance_km = row
                .distance_km
                .ok_or_else(|| FleetError::Parse(format!("line {line}: drive without distance_km")))?;
            if distance_km < 0.0 {
                return Err(FleetError::Parse(format!("line {line}: negative distance {distance_km}")));
            }
            Ok(TaskKind::Drive(DriveTask {
                destination: infra.location_by_name(destination)?,
                distance_km,
                speed_kmh: row.speed_kmh.unwrap_or(DEFAULT_SPEED_KMH),
                temperature_c: row.temperature_c,
            }))
        }
        "park" | "parking" => Ok(TaskKind::Park),
        "break" => Ok(TaskKind::Break),
        "charge" | "charging" => Ok(TaskKind::Charge),
        other => Err(FleetError::Parse(format!(
            "line {line}: invalid task {other:?}: expected drive, park, break or charge"
        ))),
    }
}
