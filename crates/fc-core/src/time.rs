//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  The mapping to
//! wall-clock time is held in `SimClock`:
//!
//!   wall_time = start_unix_secs + tick * tick_duration_secs
//!
//! Task boundaries, grid data and output records are all keyed by tick, so
//! schedule arithmetic is exact.  A task occupying `[start, end)` is active
//! during every step `t` with `start <= t < end`.
//!
//! Calendar timestamps (`start_date`, schedule rows, grid rows) are parsed as
//! naive UTC datetimes with `chrono` and floored onto the step grid.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Steps elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a calendar timestamp into Unix seconds (interpreted as UTC).
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the same with a `T` separator, or a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> CoreResult<i64> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| CoreError::Parse(format!("invalid timestamp {s:?}")))
}

/// Format Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and Unix wall-clock seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of tick 0.
    pub start_unix_secs: i64,
    /// How many real seconds one step represents.
    pub tick_duration_secs: u32,
    /// The current tick, advanced by `SimClock::advance()` each step.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, tick_duration_secs: u32) -> Self {
        Self {
            start_unix_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Unix timestamp at the start of `tick`.
    #[inline]
    pub fn unix_secs_at(&self, tick: Tick) -> i64 {
        self.start_unix_secs + tick.0 as i64 * self.tick_duration_secs as i64
    }

    #[inline]
    pub fn current_unix_secs(&self) -> i64 {
        self.unix_secs_at(self.current_tick)
    }

    /// The step containing `unix_secs`, or `None` before tick 0.
    pub fn tick_at(&self, unix_secs: i64) -> Option<Tick> {
        if unix_secs < self.start_unix_secs || self.tick_duration_secs == 0 {
            return None;
        }
        let elapsed = (unix_secs - self.start_unix_secs) as u64;
        Some(Tick(elapsed / self.tick_duration_secs as u64))
    }

    /// First step boundary at or after `unix_secs`, or `None` before tick 0.
    pub fn tick_at_or_after(&self, unix_secs: i64) -> Option<Tick> {
        if unix_secs < self.start_unix_secs || self.tick_duration_secs == 0 {
            return None;
        }
        let elapsed = (unix_secs - self.start_unix_secs) as u64;
        Some(Tick(elapsed.div_ceil(self.tick_duration_secs as u64)))
    }

    /// Step duration in hours, the unit used for kW → kWh conversion.
    #[inline]
    pub fn step_hours(&self) -> f64 {
        self.tick_duration_secs as f64 / 3_600.0
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.current_tick,
            format_timestamp(self.current_unix_secs())
        )
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run configuration consumed by the engine.
///
/// Usually built from a scenario file by the application via
/// [`SimConfig::from_dates`] and then adjusted field by field.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Unix timestamp for tick 0 (`start_date`).
    pub start_unix_secs: i64,

    /// Seconds per step (`step_size`, given in minutes in scenario files).
    pub tick_duration_secs: u32,

    /// Number of steps to simulate.  `end_date` is exclusive.
    pub total_ticks: u64,

    /// `rng_seed`.  Only used to break exact score ties in location selection.
    pub seed: Option<u64>,

    /// Worker count for independent parallel runs.  `None` uses all cores.
    pub num_threads: Option<usize>,

    /// Emit an observer snapshot every N steps.  1 = every step.
    pub output_interval_ticks: u64,

    /// Default minimum SOC fraction for vehicle types that don't set one.
    pub soc_min: f64,

    /// Default minimum charging power (kW) below which no power is requested.
    pub min_charging_power_kw: f64,

    /// Price charged per kWh taken from local feed-in.
    pub feed_in_price_per_kwh: f64,

    /// Log SOC shortfalls at drive start instead of aborting the run.
    pub ignore_warnings: bool,
}

impl SimConfig {
    pub const DEFAULT_SOC_MIN: f64 = 0.2;

    /// Build a configuration spanning `[start, end)` with steps of
    /// `step_minutes`.  All other fields take their defaults.
    pub fn from_dates(start: &str, end: &str, step_minutes: u32) -> CoreResult<Self> {
        if step_minutes == 0 {
            return Err(CoreError::Config("step_size must be positive".into()));
        }
        let start_unix_secs = parse_timestamp(start)?;
        let end_unix_secs = parse_timestamp(end)?;
        if end_unix_secs <= start_unix_secs {
            return Err(CoreError::Config(format!(
                "end_date {end:?} is not after start_date {start:?}"
            )));
        }
        let tick_duration_secs = step_minutes * 60;
        let span = (end_unix_secs - start_unix_secs) as u64;
        Ok(Self {
            start_unix_secs,
            tick_duration_secs,
            total_ticks: span.div_ceil(tick_duration_secs as u64),
            ..Self::default()
        })
    }

    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_duration_secs)
    }

    #[inline]
    pub fn step_hours(&self) -> f64 {
        self.tick_duration_secs as f64 / 3_600.0
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(CoreError::Config("tick_duration_secs must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.soc_min) {
            return Err(CoreError::Config(format!(
                "soc_min {} must lie in [0, 1)",
                self.soc_min
            )));
        }
        if self.min_charging_power_kw < 0.0 {
            return Err(CoreError::Config(format!(
                "min_charging_power {} must not be negative",
                self.min_charging_power_kw
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs:       0,
            tick_duration_secs:    900,
            total_ticks:           96,
            seed:                  None,
            num_threads:           None,
            output_interval_ticks: 1,
            soc_min:               Self::DEFAULT_SOC_MIN,
            min_charging_power_kw: 0.0,
            feed_in_price_per_kwh: 0.0,
            ignore_warnings:       false,
        }
    }
}
