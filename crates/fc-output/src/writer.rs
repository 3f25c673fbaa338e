//! The `OutputWriter` trait implemented by all backend writers.

use crate::{LocationRow, OutputResult, VehicleRow};

/// Implemented by the CSV, SQLite and Parquet writers.
pub trait OutputWriter {
    fn write_vehicle_rows(&mut self, rows: &[VehicleRow]) -> OutputResult<()>;

    fn write_location_rows(&mut self, rows: &[LocationRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
