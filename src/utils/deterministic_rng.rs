//! Seeded, reproducible randomness for tests and deterministic id generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A small wrapper around `rand`'s `StdRng` that's explicit about being
/// seeded, so call sites reaching for reproducible output don't have to
/// remember which `rand` API gives that.
pub struct DeterministicRng {
    rng: StdRng,
}

impl DeterministicRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn random_u64(&mut self) -> u64 {
        self.rng.random::<u64>()
    }

    #[must_use]
    pub fn random_string(&mut self, len: usize) -> String {
        const CHARSET: &[u8] =
            b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        (0..len)
            .map(|_| {
                let idx = self.rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}
