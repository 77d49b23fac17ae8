//! Production Environment implementations.
//!
//! `SystemEnv` uses the system clock and OS randomness. `SeededEnv` keeps the
//! system clock but draws from a seeded ChaCha stream, so `tinsel draw --seed`
//! can be replayed.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinsel_core::Environment;

/// Production environment using system time and OS randomness.
///
/// This implementation:
/// - Uses `chrono::Utc::now()` for time
/// - Uses `getrandom` for randomness
#[derive(Clone, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // NOTE: Should never fail on supported platforms. Zero bytes still
            // give a valid (if predictable) draw.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

/// System clock with a reproducible random stream.
#[derive(Clone, Debug)]
pub struct SeededEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SeededEnv {
    /// Create an environment drawing from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Environment for SeededEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
