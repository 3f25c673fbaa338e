//! SQLite output backend (feature `sqlite`).
//!
//! Creates `output.db` in the output directory with two tables:
//! `vehicle_records` and `location_records`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{LocationRow, OutputResult, VehicleRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS vehicle_records (
                 vehicle_id        INTEGER NOT NULL,
                 tick              INTEGER NOT NULL,
                 unix_time_secs    INTEGER NOT NULL,
                 state             TEXT    NOT NULL,
                 soc               REAL    NOT NULL,
                 location_id       INTEGER NOT NULL,
                 point_id          INTEGER,
                 charging_power_kw REAL    NOT NULL,
                 PRIMARY KEY (vehicle_id, tick)
             );
             CREATE TABLE IF NOT EXISTS location_records (
                 location_id        INTEGER NOT NULL,
                 tick               INTEGER NOT NULL,
                 unix_time_secs     INTEGER NOT NULL,
                 power_kw           REAL    NOT NULL,
                 energy_kwh         REAL    NOT NULL,
                 grid_kwh           REAL    NOT NULL,
                 feed_in_kwh        REAL    NOT NULL,
                 cost               REAL    NOT NULL,
                 emission_g         REAL    NOT NULL,
                 connected_vehicles INTEGER NOT NULL,
                 PRIMARY KEY (location_id, tick)
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_vehicle_rows(&mut self, rows: &[VehicleRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO vehicle_records \
                 (vehicle_id, tick, unix_time_secs, state, soc, location_id, point_id, charging_power_kw) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.vehicle_id,
                    row.tick as i64,
                    row.unix_time_secs,
                    row.state,
                    row.soc,
                    row.location_id,
                    row.point_id,
                    row.charging_power_kw,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_location_rows(&mut self, rows: &[LocationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO location_records \
                 (location_id, tick, unix_time_secs, power_kw, energy_kwh, grid_kwh, feed_in_kwh, \
                  cost, emission_g, connected_vehicles) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.location_id,
                    row.tick as i64,
                    row.unix_time_secs,
                    row.power_kw,
                    row.energy_kwh,
                    row.grid_kwh,
                    row.feed_in_kwh,
                    row.cost,
                    row.emission_g,
                    row.connected_vehicles,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
