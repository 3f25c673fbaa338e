//! Parquet output backend (feature `parquet`).
//!
//! Creates `vehicle_records.parquet` and `location_records.parquet` in the
//! output directory.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{LocationRow, OutputResult, VehicleRow};

fn vehicle_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("vehicle_id",        DataType::UInt32,  false),
        Field::new("tick",              DataType::UInt64,  false),
        Field::new("unix_time_secs",    DataType::Int64,   false),
        Field::new("state",             DataType::Utf8,    false),
        Field::new("soc",               DataType::Float64, false),
        Field::new("location_id",       DataType::UInt32,  false),
        Field::new("point_id",          DataType::UInt32,  true),
        Field::new("charging_power_kw", DataType::Float64, false),
    ]))
}

fn location_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("location_id",        DataType::UInt32,  false),
        Field::new("tick",               DataType::UInt64,  false),
        Field::new("unix_time_secs",     DataType::Int64,   false),
        Field::new("power_kw",           DataType::Float64, false),
        Field::new("energy_kwh",         DataType::Float64, false),
        Field::new("grid_kwh",           DataType::Float64, false),
        Field::new("feed_in_kwh",        DataType::Float64, false),
        Field::new("cost",               DataType::Float64, false),
        Field::new("emission_g",         DataType::Float64, false),
        Field::new("connected_vehicles", DataType::UInt32,  false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes vehicle and location records to two Parquet files.
///
/// The file footers are written by `finish()`; without it the files cannot
/// be read back.
pub struct ParquetWriter {
    vehicles:        Option<ArrowWriter<File>>,
    locations:       Option<ArrowWriter<File>>,
    vehicle_schema:  Arc<Schema>,
    location_schema: Arc<Schema>,
}

impl ParquetWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let vehicle_schema = vehicle_schema();
        let location_schema = location_schema();

        let vehicles = ArrowWriter::try_new(
            File::create(dir.join("vehicle_records.parquet"))?,
            Arc::clone(&vehicle_schema),
            Some(snappy_props()),
        )?;
        let locations = ArrowWriter::try_new(
            File::create(dir.join("location_records.parquet"))?,
            Arc::clone(&location_schema),
            Some(snappy_props()),
        )?;

        Ok(Self {
            vehicles: Some(vehicles),
            locations: Some(locations),
            vehicle_schema,
            location_schema,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_vehicle_rows(&mut self, rows: &[VehicleRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.vehicles.as_mut() else {
            return Ok(());
        };

        let mut vehicle_ids = UInt32Builder::new();
        let mut ticks       = UInt64Builder::new();
        let mut unix_times  = Int64Builder::new();
        let mut states      = StringBuilder::new();
        let mut socs        = Float64Builder::new();
        let mut locations   = UInt32Builder::new();
        let mut points      = UInt32Builder::new();
        let mut powers      = Float64Builder::new();

        for row in rows {
            vehicle_ids.append_value(row.vehicle_id);
            ticks.append_value(row.tick);
            unix_times.append_value(row.unix_time_secs);
            states.append_value(row.state);
            socs.append_value(row.soc);
            locations.append_value(row.location_id);
            points.append_option(row.point_id);
            powers.append_value(row.charging_power_kw);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.vehicle_schema),
            vec![
                Arc::new(vehicle_ids.finish()),
                Arc::new(ticks.finish()),
                Arc::new(unix_times.finish()),
                Arc::new(states.finish()),
                Arc::new(socs.finish()),
                Arc::new(locations.finish()),
                Arc::new(points.finish()),
                Arc::new(powers.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_location_rows(&mut self, rows: &[LocationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.locations.as_mut() else {
            return Ok(());
        };

        let mut location_ids = UInt32Builder::new();
        let mut ticks        = UInt64Builder::new();
        let mut unix_times   = Int64Builder::new();
        let mut powers       = Float64Builder::new();
        let mut energies     = Float64Builder::new();
        let mut grid         = Float64Builder::new();
        let mut feed_in      = Float64Builder::new();
        let mut costs        = Float64Builder::new();
        let mut emissions    = Float64Builder::new();
        let mut connected    = UInt32Builder::new();

        for row in rows {
            location_ids.append_value(row.location_id);
            ticks.append_value(row.tick);
            unix_times.append_value(row.unix_time_secs);
            powers.append_value(row.power_kw);
            energies.append_value(row.energy_kwh);
            grid.append_value(row.grid_kwh);
            feed_in.append_value(row.feed_in_kwh);
            costs.append_value(row.cost);
            emissions.append_value(row.emission_g);
            connected.append_value(row.connected_vehicles);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.location_schema),
            vec![
                Arc::new(location_ids.finish()),
                Arc::new(ticks.finish()),
                Arc::new(unix_times.finish()),
                Arc::new(powers.finish()),
                Arc::new(energies.finish()),
                Arc::new(grid.finish()),
                Arc::new(feed_in.finish()),
                Arc::new(costs.finish()),
                Arc::new(emissions.finish()),
                Arc::new(connected.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if let Some(w) = self.vehicles.take() {
            w.close()?;
        }
        if let Some(w) = self.locations.take() {
            w.close()?;
        }
        Ok(())
    }
}
