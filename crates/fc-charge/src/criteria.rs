//! Selection criteria and their weights.

use std::fmt;
use std::str::FromStr;

use crate::{ChargeError, ChargeResult};

/// One scoring dimension of a charging candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Criterion {
    /// Road distance from the vehicle (km).  Lower is better.
    Distance,
    /// Unreserved capacity of the location's grid connection (kW).
    GridHeadroom,
    /// Energy price (per kWh).  Lower is better.
    Price,
    /// Grid emission factor (g/kWh).  Lower is better.
    Emission,
    /// Local feed-in energy available this step (kWh).
    FeedIn,
    /// Rated power of the point for this vehicle (kW).
    Power,
    /// Round-trip detour time as a share of the remaining charge window,
    /// capped at 1.  Lower is better.
    Time,
    /// The vehicle's current SOC.  Scored on a fixed scale (`1 - soc`)
    /// rather than across candidates, so an emptier battery raises every
    /// candidate's score.
    Soc,
}

impl Criterion {
    pub const ALL: [Criterion; 8] = [
        Self::Distance,
        Self::GridHeadroom,
        Self::Price,
        Self::Emission,
        Self::FeedIn,
        Self::Power,
        Self::Time,
        Self::Soc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::GridHeadroom => "grid_headroom",
            Self::Price => "price",
            Self::Emission => "emission",
            Self::FeedIn => "feed_in",
            Self::Power => "power",
            Self::Time => "time",
            Self::Soc => "soc",
        }
    }

    pub fn higher_is_better(self) -> bool {
        matches!(self, Self::GridHeadroom | Self::FeedIn | Self::Power)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Criterion {
    type Err = ChargeError;

    /// Canonical names, plus the `*_factor` names of older scenario files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "distance" => Ok(Self::Distance),
            "grid_headroom" | "headroom" => Ok(Self::GridHeadroom),
            "price" | "cost_factor" => Ok(Self::Price),
            "emission" => Ok(Self::Emission),
            "feed_in" | "local_renewables_factor" => Ok(Self::FeedIn),
            "power" | "energy_factor" => Ok(Self::Power),
            "time" | "time_factor" => Ok(Self::Time),
            "soc" | "soc_factor" => Ok(Self::Soc),
            other => Err(ChargeError::UnknownCriterion(other.to_string())),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Weights ───────────────────────────────────────────────────────────────────

/// Non-negative weight per criterion.  Zero-weight criteria are skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct Weights {
    values: [f64; Criterion::ALL.len()],
}

impl Weights {
    /// All weights zero: every candidate scores the same.
    pub fn zero() -> Self {
        Self { values: [0.0; Criterion::ALL.len()] }
    }

    pub fn with(mut self, criterion: Criterion, weight: f64) -> Self {
        self.values[criterion.index()] = weight.max(0.0);
        self
    }

    pub fn set(&mut self, criterion: Criterion, weight: f64) -> ChargeResult<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ChargeError::InvalidWeight { criterion: criterion.to_string(), value: weight });
        }
        self.values[criterion.index()] = weight;
        Ok(())
    }

    #[inline]
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.values[criterion.index()]
    }

    /// Build from `name → weight` pairs.  Criteria not named keep weight 0.
    pub fn from_pairs<I, S>(pairs: I) -> ChargeResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut weights = Self::zero();
        for (name, weight) in pairs {
            let criterion: Criterion = name.as_ref().parse()?;
            weights.set(criterion, weight)?;
        }
        Ok(weights)
    }

    /// Criteria with a positive weight, in [`Criterion::ALL`] order.
    pub fn active(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        Criterion::ALL
            .into_iter()
            .map(|c| (c, self.get(c)))
            .filter(|&(_, w)| w > 0.0)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::zero()
            .with(Criterion::Distance, 1.0)
            .with(Criterion::Price, 1.0)
            .with(Criterion::FeedIn, 1.0)
            .with(Criterion::Power, 1.0)
    }
}
