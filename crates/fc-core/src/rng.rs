//! Seeded RNG wrapper.
//!
//! Randomness never influences ranking.  The single `SimRng` of a run is
//! consulted only when several charging candidates score exactly the same,
//! and to derive independent seeds for Monte-Carlo repeats.  It is passed
//! explicitly; there is no ambient global generator.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG.  Owned by exactly one run; never shared across
/// worker threads.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` whose stream is independent of the parent's
    /// subsequent draws.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// `n` reproducible seeds for independent repeats of one scenario.
    pub fn repeat_seeds(base_seed: u64, n: usize) -> Vec<u64> {
        let mut root = SimRng::new(base_seed);
        (0..n as u64).map(|i| root.child(i).random()).collect()
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Pick an index in `0..len`.  Returns `None` for an empty range.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0.gen_range(0..len))
    }
}
