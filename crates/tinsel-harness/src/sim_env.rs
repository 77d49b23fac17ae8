//! Deterministic environment for simulations and tests.
//!
//! Randomness comes from a ChaCha8 stream seeded once at construction. Clones
//! share the stream, so a session and its test driver draw from one reproducible
//! sequence. Time is virtual and only moves when the test advances it.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinsel_core::Environment;

/// 2026-12-01T00:00:00Z, the default start of the virtual clock.
const DEFAULT_EPOCH_SECS: i64 = 1_796_083_200;

/// Seeded simulation environment.
#[derive(Clone, Debug)]
pub struct SimEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha8Rng>>,
    clock: Arc<Mutex<DateTime<Utc>>>,
}

impl SimEnv {
    /// Create an environment from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let start = Utc.timestamp_opt(DEFAULT_EPOCH_SECS, 0).single().unwrap_or_default();
        Self {
            seed,
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            clock: Arc::new(Mutex::new(start)),
        }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock += by;
    }
}

impl Environment for SimEnv {
    fn now(&self) -> DateTime<Utc> {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
