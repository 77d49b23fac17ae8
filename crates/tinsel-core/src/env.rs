//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the assignment engine from system
//! resources (wall-clock time and randomness). This enables:
//!
//! - Deterministic Simulation: a seeded RNG and a fixed clock reproduce the
//!   exact same draw for the same pick order.
//!
//! - Production Runtime: the system clock and OS entropy are used without any
//!   changes to the selection logic.
//!
//! # Invariants
//!
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// Randomness here only has to be uniform, not unpredictable. Draws are not a
/// security boundary.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current wall-clock time.
    ///
    /// Used for export timestamps and the `{date}` message placeholder.
    fn now(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Determinism during simulations: Given the same RNG seed, this produces
    ///   the same sequence of bytes
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Returns an index drawn uniformly from `0..len`.
    ///
    /// Uses rejection sampling so that every index is equally likely regardless
    /// of `len`. Returns 0 without consuming entropy when `len <= 1`.
    fn random_index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }

        let bound = len as u64;
        // 2^64 mod bound: values below this would bias the low indices.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let value = self.random_u64();
            if value >= threshold {
                // value % bound < len, so the cast cannot truncate
                #[allow(clippy::cast_possible_truncation)]
                return (value % bound) as usize;
            }
        }
    }
}
