//! `SimOutputObserver<W>`: streams snapshots into an `OutputWriter`.

use fc_core::{LocationId, Tick};
use fc_fleet::Fleet;
use fc_infra::{Infrastructure, LocationOutput};
use fc_sim::{RunStatus, SimObserver};

use crate::row::{LocationRow, VehicleRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes one vehicle row per vehicle and one location
/// row per location at every snapshot.
///
/// `SimObserver` methods cannot fail, so the first write error is kept and
/// can be collected with [`take_error`][Self::take_error] after the run.
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::error!(error = %e, "output write failed");
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_snapshot(&mut self, tick: Tick, unix_secs: i64, fleet: &Fleet, infra: &Infrastructure) {
        let vehicles: Vec<VehicleRow> = fleet
            .vehicles()
            .iter()
            .filter_map(|v| {
                v.history()
                    .last()
                    .filter(|r| r.tick == tick)
                    .map(|r| VehicleRow::new(v.id, r))
            })
            .collect();
        let result = self.writer.write_vehicle_rows(&vehicles);
        self.store_err(result);

        let locations: Vec<LocationRow> = infra
            .locations()
            .iter()
            .map(|l| location_row(l.id, tick, unix_secs, &l.output))
            .collect();
        let result = self.writer.write_location_rows(&locations);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick, _status: &RunStatus) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}

fn location_row(
    location:  LocationId,
    tick:      Tick,
    unix_secs: i64,
    o:         &LocationOutput,
) -> LocationRow {
    LocationRow {
        location_id:        location.0,
        tick:               tick.0,
        unix_time_secs:     unix_secs,
        power_kw:           o.power_kw,
        energy_kwh:         o.energy_kwh,
        grid_kwh:           o.grid_kwh,
        feed_in_kwh:        o.feed_in_kwh,
        cost:               o.cost,
        emission_g:         o.emission_g,
        connected_vehicles: o.connected_vehicles,
    }
}
