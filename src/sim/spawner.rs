//! Obstacle spawner
//!
//! Driven by its own fixed-interval trigger, not the frame tick. Each firing
//! picks a lane uniformly at random.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seeded lane picker
#[derive(Debug, Clone)]
pub struct Spawner {
    seed: u64,
    rng: Pcg32,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw from `0..lane_count`
    pub fn pick_lane(&mut self, lane_count: usize) -> usize {
        self.rng.random_range(0..lane_count)
    }
}
