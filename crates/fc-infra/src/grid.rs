//! Time-varying grid context per location.
//!
//! # CSV format
//!
//! One row per location and step.  `*` in the `location` column supplies a
//! default series used for every location without its own row at that step.
//!
//! ```csv
//! timestamp,location,feed_in_kwh,price_per_kwh,emission_g_per_kwh,temperature_c
//! 2023-01-01 00:00:00,*,0.0,0.30,420,4.5
//! 2023-01-01 00:00:00,depot,2.5,0.28,380,4.5
//! ```
//!
//! Timestamps are floored onto the step grid.  Rows before tick 0 are
//! skipped.  A lookup for a step the data doesn't cover is an
//! [`InfraError::OutOfRange`], which the simulation treats as fatal.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use fc_core::{LocationId, SimClock, Tick, parse_timestamp};

use crate::{InfraError, InfraResult, Infrastructure};

/// Grid values for one location during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridSample {
    /// Locally generated energy available during the step (kWh).
    pub feed_in_kwh:        f64,
    pub price_per_kwh:      f64,
    pub emission_g_per_kwh: f64,
    pub temperature_c:      f64,
}

/// Read-only source of grid context, queried by location and step.
pub trait GridContext: Send + Sync {
    fn sample(&self, location: LocationId, tick: Tick) -> InfraResult<GridSample>;
}

// ── ConstantGrid ──────────────────────────────────────────────────────────────

/// The same sample everywhere, optionally only up to `horizon` (exclusive).
#[derive(Clone, Debug)]
pub struct ConstantGrid {
    pub sample:  GridSample,
    pub horizon: Option<Tick>,
}

impl ConstantGrid {
    pub fn new(sample: GridSample) -> Self {
        Self { sample, horizon: None }
    }
}

impl GridContext for ConstantGrid {
    fn sample(&self, location: LocationId, tick: Tick) -> InfraResult<GridSample> {
        match self.horizon {
            Some(h) if tick >= h => Err(InfraError::OutOfRange { location, tick }),
            _ => Ok(self.sample),
        }
    }
}

// ── GridSeries ────────────────────────────────────────────────────────────────

/// Step-indexed grid data, per location with a shared fallback series.
#[derive(Clone, Debug, Default)]
pub struct GridSeries {
    per_location: FxHashMap<LocationId, Vec<Option<GridSample>>>,
    fallback:     Vec<Option<GridSample>>,
}

impl GridSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample for `location` (or the fallback when `None`) at `tick`.
    pub fn insert(&mut self, location: Option<LocationId>, tick: Tick, sample: GridSample) {
        let series = match location {
            Some(id) => self.per_location.entry(id).or_default(),
            None => &mut self.fallback,
        };
        let idx = tick.0 as usize;
        if series.len() <= idx {
            series.resize(idx + 1, None);
        }
        series[idx] = Some(sample);
    }

    /// One past the last step holding any sample.
    pub fn covered_ticks(&self) -> u64 {
        self.per_location
            .values()
            .map(Vec::len)
            .chain(std::iter::once(self.fallback.len()))
            .max()
            .unwrap_or(0) as u64
    }

    /// First step at which `location` has no data, scanning from tick 0.
    pub fn first_gap(&self, location: LocationId, total_ticks: u64) -> Option<Tick> {
        (0..total_ticks)
            .map(Tick)
            .find(|&t| self.lookup(location, t).is_none())
    }

    fn lookup(&self, location: LocationId, tick: Tick) -> Option<GridSample> {
        let idx = tick.0 as usize;
        self.per_location
            .get(&location)
            .and_then(|s| s.get(idx).copied().flatten())
            .or_else(|| self.fallback.get(idx).copied().flatten())
    }
}

impl GridContext for GridSeries {
    fn sample(&self, location: LocationId, tick: Tick) -> InfraResult<GridSample> {
        self.lookup(location, tick)
            .ok_or(InfraError::OutOfRange { location, tick })
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GridRecord {
    timestamp:          String,
    location:           String,
    feed_in_kwh:        f64,
    price_per_kwh:      f64,
    emission_g_per_kwh: f64,
    temperature_c:      f64,
}

/// Load grid rows for steps `0..total_ticks`.  Rows outside that window are
/// counted and dropped.
pub fn load_grid_csv(
    path:        &Path,
    clock:       &SimClock,
    total_ticks: u64,
    infra:       &Infrastructure,
) -> InfraResult<GridSeries> {
    let file = std::fs::File::open(path)?;
    load_grid_reader(file, clock, total_ticks, infra)
}

/// Like [`load_grid_csv`] but accepts any `Read` source.
pub fn load_grid_reader<R: Read>(
    reader:      R,
    clock:       &SimClock,
    total_ticks: u64,
    infra:       &Infrastructure,
) -> InfraResult<GridSeries> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut series = GridSeries::new();
    let mut skipped = 0usize;
    let mut past_end = 0usize;

    for result in csv_reader.deserialize::<GridRecord>() {
        let row = result.map_err(|e| InfraError::Parse(e.to_string()))?;
        let unix = parse_timestamp(&row.timestamp)?;
        let Some(tick) = clock.tick_at(unix) else {
            skipped += 1;
            continue;
        };
        if tick.0 >= total_ticks {
            past_end += 1;
            continue;
        }
        let location = match row.location.trim() {
            "*" => None,
            name => Some(infra.location_by_name(name)?),
        };
        series.insert(
            location,
            tick,
            GridSample {
                feed_in_kwh:        row.feed_in_kwh,
                price_per_kwh:      row.price_per_kwh,
                emission_g_per_kwh: row.emission_g_per_kwh,
                temperature_c:      row.temperature_c,
            },
        );
    }

    if skipped > 0 || past_end > 0 {
        debug!(skipped, past_end, "grid rows outside the simulation window ignored");
    }
    Ok(series)
}
