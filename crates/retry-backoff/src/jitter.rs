//! Random sources for backoff jitter.
//!
//! The exponential policy draws one sample per delay from a [`JitterSource`].
//! The default, [`ThreadRandom`], uses the thread-local generator from `rand`;
//! [`SeededRandom`] and [`FixedSequence`] make delays reproducible in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// A thread-safe source of jitter samples.
///
/// Every call to [`sample`](Self::sample) must return a fresh value in
/// `[-1.0, 1.0]`. Implementations are shared between concurrent retry loops,
/// hence `Send + Sync` and `&self`.
pub trait JitterSource: Send + Sync {
    /// Draw the next sample in `[-1.0, 1.0]`.
    fn sample(&self) -> f64;
}

impl<J: JitterSource + ?Sized> JitterSource for std::sync::Arc<J> {
    fn sample(&self) -> f64 {
        (**self).sample()
    }
}

/// Uniform samples from `rand::thread_rng()`.
///
/// Each thread owns a generator seeded once from the operating system, so no
/// locking is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl JitterSource for ThreadRandom {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(-1.0..=1.0)
    }
}

/// Uniform samples from a single seeded generator behind a mutex.
///
/// Two sources built from the same seed produce the same sequence.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededRandom {
    fn sample(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(-1.0..=1.0)
    }
}

/// Replays a fixed list of samples, cycling back to the start when exhausted.
///
/// Values are clamped to `[-1.0, 1.0]`. An empty list always yields `0.0`,
/// which disables jitter.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::jitter::{FixedSequence, JitterSource};
///
/// let source = FixedSequence::new([1.0, -1.0]);
/// assert_eq!(source.sample(), 1.0);
/// assert_eq!(source.sample(), -1.0);
/// assert_eq!(source.sample(), 1.0);
/// ```
#[derive(Debug)]
pub struct FixedSequence {
    samples: Vec<f64>,
    cursor: Mutex<usize>,
}

impl FixedSequence {
    /// Create a source that replays `samples` in order.
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: samples.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect(),
            cursor: Mutex::new(0),
        }
    }

    /// A source that always returns `sample`.
    pub fn constant(sample: f64) -> Self {
        Self::new([sample])
    }
}

impl JitterSource for FixedSequence {
    fn sample(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let value = self.samples[*cursor % self.samples.len()];
        *cursor = cursor.wrapping_add(1);
        value
    }
}
