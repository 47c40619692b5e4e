//! Sources of staging-path suffixes.
//!
//! Staging names only need to be unlikely to collide, not unpredictable, but
//! the default still draws from an OS-seeded generator so that independent
//! processes don't walk the same sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Produces non-negative numeric suffixes for staging file names.
///
/// Implementations must be safe to share between threads; the store calls
/// [`next_suffix`](Self::next_suffix) through a shared reference.
pub trait SuffixSource: Send + Sync {
    /// The next suffix. Only the low 63 bits are used.
    fn next_suffix(&self) -> u64;
}

/// Any thread-safe closure works as a source, which is handy in tests.
impl<F> SuffixSource for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn next_suffix(&self) -> u64 {
        self()
    }
}

/// Thread-local generator seeded from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;
impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u64 {
        rand::thread_rng().r#gen::<u64>() >> 1
    }
}

/// Deterministic generator for reproducible staging paths.
#[derive(Debug)]
pub struct SeededSuffix {
    rng: Mutex<StdRng>,
}
impl SeededSuffix {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}
impl SuffixSource for SeededSuffix {
    fn next_suffix(&self) -> u64 {
        // A panic mid-`gen` can't leave the generator in a state worth
        // refusing to use.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.r#gen::<u64>() >> 1
    }
}

/// Clamp any suffix into the non-negative 63-bit range.
pub(crate) fn clamp(suffix: u64) -> u64 {
    suffix & (u64::MAX >> 1)
}
