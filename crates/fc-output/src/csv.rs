//! CSV output backend.
//!
//! Creates two files in the output directory:
//! - `vehicle_records.csv`
//! - `location_records.csv`
//!
//! Floats are written with fixed precision so identical runs produce
//! byte-identical files.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use fc_core::format_timestamp;

use crate::writer::OutputWriter;
use crate::{LocationRow, OutputResult, VehicleRow};

const VEHICLE_HEADER: [&str; 9] = [
    "vehicle_id",
    "tick",
    "unix_time_secs",
    "timestamp",
    "state",
    "soc",
    "location_id",
    "point_id",
    "charging_power_kw",
];

const LOCATION_HEADER: [&str; 11] = [
    "location_id",
    "tick",
    "unix_time_secs",
    "timestamp",
    "power_kw",
    "energy_kwh",
    "grid_kwh",
    "feed_in_kwh",
    "cost",
    "emission_g",
    "connected_vehicles",
];

fn fixed(v: f64) -> String {
    format!("{v:.6}")
}

pub struct CsvWriter {
    vehicles:  Writer<File>,
    locations: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create (or truncate) the two CSV files in `dir` and write the headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut vehicles = Writer::from_path(dir.join("vehicle_records.csv"))?;
        vehicles.write_record(VEHICLE_HEADER)?;

        let mut locations = Writer::from_path(dir.join("location_records.csv"))?;
        locations.write_record(LOCATION_HEADER)?;

        Ok(Self { vehicles, locations, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_vehicle_rows(&mut self, rows: &[VehicleRow]) -> OutputResult<()> {
        for row in rows {
            self.vehicles.write_record(&[
                row.vehicle_id.to_string(),
                row.tick.to_string(),
                row.unix_time_secs.to_string(),
                format_timestamp(row.unix_time_secs),
                row.state.to_string(),
                fixed(row.soc),
                row.location_id.to_string(),
                row.point_id.map(|p| p.to_string()).unwrap_or_default(),
                fixed(row.charging_power_kw),
            ])?;
        }
        Ok(())
    }

    fn write_location_rows(&mut self, rows: &[LocationRow]) -> OutputResult<()> {
        for row in rows {
            self.locations.write_record(&[
                row.location_id.to_string(),
                row.tick.to_string(),
                row.unix_time_secs.to_string(),
                format_timestamp(row.unix_time_secs),
                fixed(row.power_kw),
                fixed(row.energy_kwh),
                fixed(row.grid_kwh),
                fixed(row.feed_in_kwh),
                fixed(row.cost),
                fixed(row.emission_g),
                row.connected_vehicles.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.vehicles.flush()?;
        self.locations.flush()?;
        Ok(())
    }
}
