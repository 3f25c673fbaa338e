//! Post-run export of the full time series.

use fc_fleet::Fleet;
use fc_infra::Infrastructure;
use fc_sim::ResultAggregator;

use crate::row::{LocationRow, VehicleRow};
use crate::writer::OutputWriter;
use crate::OutputResult;

/// Write every committed vehicle and location record, ordered by tick and
/// then id, and finish the writer.
pub fn export_run<W: OutputWriter + ?Sized>(
    writer:     &mut W,
    fleet:      &Fleet,
    infra:      &Infrastructure,
    aggregator: &ResultAggregator,
) -> OutputResult<()> {
    let mut vehicles: Vec<VehicleRow> = fleet
        .vehicles()
        .iter()
        .flat_map(|v| v.history().iter().map(move |r| VehicleRow::new(v.id, r)))
        .collect();
    vehicles.sort_by_key(|r| (r.tick, r.vehicle_id));

    let mut locations: Vec<LocationRow> = infra
        .locations()
        .iter()
        .flat_map(|l| aggregator.series(l.id).iter().map(move |r| LocationRow::new(l.id, r)))
        .collect();
    locations.sort_by_key(|r| (r.tick, r.location_id));

    writer.write_vehicle_rows(&vehicles)?;
    writer.write_location_rows(&locations)?;
    writer.finish()?;
    tracing::info!(
        vehicle_rows = vehicles.len(),
        location_rows = locations.len(),
        "run exported"
    );
    Ok(())
}
