//! Identifier generation for sessions, runs, and ad-hoc correlation ids.
//!
//! [`RuntimeConfig`](crate::runtimes::RuntimeConfig) uses [`IdGenerator::new`]
//! to mint a fresh session id per run. Tests that need reproducible ids can
//! seed a generator via [`IdConfig`] instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use super::deterministic_rng::DeterministicRng;

/// Configuration for [`IdGenerator`].
///
/// Leaving `seed` unset (the default) produces UUID-backed ids suitable for
/// production use. Setting a seed switches to a counter + seeded-RNG suffix,
/// useful for snapshot tests that assert on generated ids.
#[derive(Clone, Debug, Default)]
pub struct IdConfig {
    pub seed: Option<u64>,
    pub use_counter: bool,
    pub prefix: Option<String>,
}

pub struct IdGenerator {
    config: IdConfig,
    counter: AtomicU64,
    rng: Mutex<Option<DeterministicRng>>,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(IdConfig::default())
    }

    #[must_use]
    pub fn with_config(config: IdConfig) -> Self {
        let rng = config.seed.map(DeterministicRng::new);
        Self {
            config,
            counter: AtomicU64::new(0),
            rng: Mutex::new(rng),
        }
    }

    /// Generates a run/session id: `run-<uuid v4>`.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4())
    }

    /// Generates a general-purpose correlation id, honoring `use_counter`
    /// and a seeded RNG when configured, falling back to a UUID otherwise.
    #[must_use]
    pub fn generate_id(&self) -> String {
        let prefix = self.config.prefix.as_deref().unwrap_or("id");
        let n = self.counter.fetch_add(1, Ordering::SeqCst);

        if self.config.use_counter {
            let mut guard = self.rng.lock().unwrap();
            if let Some(rng) = guard.as_mut() {
                let suffix = rng.random_string(6);
                return format!("{prefix}-{n}-{suffix}");
            }
            return format!("{prefix}-{n}");
        }

        format!("{prefix}-{}", Uuid::new_v4())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
