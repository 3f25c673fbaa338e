//! `fc-output`: export of vehicle and location time series.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                       |
//! |-----------|---------|-----------------------------------------------------|
//! | *(none)*  | CSV     | `vehicle_records.csv`, `location_records.csv`       |
//! | `sqlite`  | SQLite  | `output.db`                                         |
//! | `parquet` | Parquet | `vehicle_records.parquet`, `location_records.parquet` |
//!
//! All backends implement [`OutputWriter`].  Rows reach a writer either
//! streamed during the run through [`SimOutputObserver`], or all at once
//! after it through [`export_run`].  Both emit rows ordered by tick, then id,
//! so the files are the same either way.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fc_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! let result = sim.run(&mut obs);
//! if let Some(e) = obs.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod export;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use export::export_run;
pub use observer::SimOutputObserver;
pub use row::{LocationRow, VehicleRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
