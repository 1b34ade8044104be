//! Random sources for baget generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of uniformly distributed integers.
///
/// Shared by every open of the device, so draws must be safe from
/// concurrent callers.
pub trait RandomSource: Send + Sync {
    /// Draw an integer uniformly from `range`.
    ///
    /// An empty range yields its start.
    fn uniform(&self, range: RangeInclusive<usize>) -> usize;
}

/// Process-wide generator seeded once, serialized behind a mutex.
#[derive(Debug)]
pub struct SharedRng {
    inner: Mutex<StdRng>,
}

impl SharedRng {
    /// Seed from the current wall clock.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        tracing::debug!(seed = nanos, "seeding content generator");
        Self::with_seed(nanos)
    }

    /// Seed with a fixed value (reproducible output).
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SharedRng {
    fn uniform(&self, range: RangeInclusive<usize>) -> usize {
        if range.is_empty() {
            return *range.start();
        }
        // A panic mid-draw cannot leave StdRng half-updated, so a poisoned
        // lock is still usable.
        let mut rng = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(range)
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
///
/// Each value is folded into the requested range as
/// `start + value % range_len`.
#[derive(Debug)]
pub struct SequenceSource {
    values: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<usize>>) -> Self {
        Self {
            values: values.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&self, range: RangeInclusive<usize>) -> usize {
        let (start, end) = (*range.start(), *range.end());
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        if start > end || self.values.is_empty() {
            return start;
        }
        let value = self.values[idx % self.values.len()];
        start + value % (end - start + 1)
    }
}
