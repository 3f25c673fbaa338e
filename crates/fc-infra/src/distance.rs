//! Symmetric location-to-location road distances.
//!
//! Distances are input data; nothing here computes routes.  A location is at
//! distance zero from itself, and a pair without an entry is unreachable.

use rustc_hash::FxHashMap;

use fc_core::LocationId;

use crate::{InfraError, InfraResult};

#[derive(Clone, Debug, Default)]
pub struct DistanceTable {
    km: FxHashMap<(LocationId, LocationId), f64>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the distance between `a` and `b` in both directions.
    pub fn insert(&mut self, a: LocationId, b: LocationId, km: f64) -> InfraResult<()> {
        if km.is_nan() || km < 0.0 {
            return Err(InfraError::InvalidValue { what: "distance", value: km });
        }
        self.km.insert(Self::key(a, b), km);
        Ok(())
    }

    /// Distance in km, or `None` if the pair is unreachable.
    pub fn get(&self, a: LocationId, b: LocationId) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        self.km.get(&Self::key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.km.is_empty()
    }

    #[inline]
    fn key(a: LocationId, b: LocationId) -> (LocationId, LocationId) {
        if a <= b { (a, b) } else { (b, a) }
    }
}
