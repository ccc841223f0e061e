//! Randomness for the fallback pick.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Where the selector draws its random index from.
#[derive(Debug, Default)]
pub enum RandomSource {
    /// Per-thread generator (`rand::thread_rng`).
    #[default]
    Thread,
    /// Reproducible sequence for tests and simulations.
    Seeded(Mutex<StdRng>),
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        RandomSource::Seeded(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    /// Uniform index in `0..upper`. `upper` must be non-zero.
    pub fn index(&self, upper: usize) -> usize {
        debug_assert!(upper > 0);
        match self {
            RandomSource::Thread => rand::thread_rng().gen_range(0..upper),
            RandomSource::Seeded(rng) => {
                // Only the fallback path gets here, so a mutex is fine.
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                rng.gen_range(0..upper)
            }
        }
    }
}
