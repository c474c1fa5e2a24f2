//! Exponential backoff with jitter.

use super::strategy::Backoff;
use crate::config::{BackoffConfig, BackoffConfigBuilder};
use crate::jitter::{JitterSource, ThreadRandom};
use std::time::Duration;

/// Exponential backoff policy with multiplicative jitter.
///
/// # Mathematical Formula
///
/// For `retries == 0` the delay is `base_delay`, without jitter. Otherwise:
/// ```text
/// envelope = min(base_delay * multiplier^retries, max_delay)
/// delay    = max(0, envelope * (1 + jitter * u)),  u uniform in [-1, 1]
/// ```
///
/// The envelope is grown by repeated multiplication and stops growing as soon
/// as it reaches `max_delay`, so very large `retries` values cost no more than
/// the handful of steps needed to saturate.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::config::BackoffConfig;
/// use retry_backoff::retry::{Backoff, ExponentialBackoff};
/// use std::time::Duration;
///
/// // Default configuration (base=1s, multiplier=1.6, jitter=0.2, max=120s)
/// let backoff = ExponentialBackoff::default();
/// assert_eq!(backoff.delay(0), Duration::from_secs(1));
///
/// // Deterministic configuration
/// let backoff = ExponentialBackoff::builder()
///     .base_delay(Duration::from_millis(100))
///     .multiplier(2.0)
///     .jitter(0.0)
///     .max_delay(Duration::from_secs(1))
///     .build();
/// assert_eq!(backoff.delay(3), Duration::from_millis(800));
/// assert_eq!(backoff.delay(10), Duration::from_secs(1));
/// ```
///
/// # Performance Characteristics
///
/// - **Memory**: O(1), no allocations
/// - **CPU**: at most `log(max / base) / log(multiplier)` multiplications plus
///   one jitter sample
#[derive(Debug, Clone)]
pub struct ExponentialBackoff<J = ThreadRandom> {
    config: BackoffConfig,
    jitter: J,
}

impl ExponentialBackoff {
    /// Create a policy drawing jitter from the thread-local generator.
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            jitter: ThreadRandom,
        }
    }

    /// Create a builder for configuring the policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retry_backoff::retry::ExponentialBackoff;
    /// use std::time::Duration;
    ///
    /// let backoff = ExponentialBackoff::builder()
    ///     .base_delay(Duration::from_millis(100))
    ///     .build();
    /// ```
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }
}

impl<J: JitterSource> ExponentialBackoff<J> {
    /// Create a policy drawing jitter from `source`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retry_backoff::config::BackoffConfig;
    /// use retry_backoff::jitter::FixedSequence;
    /// use retry_backoff::retry::{Backoff, ExponentialBackoff};
    /// use std::time::Duration;
    ///
    /// let backoff = ExponentialBackoff::with_jitter_source(
    ///     BackoffConfig::default(),
    ///     FixedSequence::constant(1.0),
    /// );
    ///
    /// // 1s * 1.6, stretched by the full +20% jitter
    /// assert_eq!(backoff.delay(1), Duration::from_millis(1920));
    /// ```
    pub fn with_jitter_source(config: BackoffConfig, jitter: J) -> Self {
        Self { config, jitter }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// The unrandomized delay bound for `retries`, capped at `max_delay`.
    ///
    /// For `retries == 0` this is `base_delay`, which may exceed `max_delay`.
    pub fn envelope(&self, retries: u32) -> Duration {
        if retries == 0 {
            return self.config.base_delay();
        }
        nanos_to_duration(self.envelope_nanos(retries))
    }

    fn envelope_nanos(&self, retries: u32) -> f64 {
        let max = self.config.max_delay().as_nanos() as f64;
        let multiplier = self.config.multiplier();
        let mut backoff = self.config.base_delay().as_nanos() as f64;

        let stepwise = retries.min(STEPWISE_LIMIT);
        let mut stepped = 0;
        while backoff < max && stepped < stepwise {
            let next = backoff * multiplier;
            if next == backoff {
                // fixed point: zero base delay, unit multiplier, or underflow
                return backoff.min(max);
            }
            backoff = next;
            stepped += 1;
        }

        if backoff < max && stepped < retries {
            // Slow growth that is still below the cap: finish in closed form.
            // Continuing from the stepped value keeps the envelope monotonic
            // across the switch. An infinite product is capped below.
            backoff *= multiplier.powf(f64::from(retries - stepped));
        }

        backoff.min(max)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl<J: JitterSource> Backoff for ExponentialBackoff<J> {
    fn delay(&self, retries: u32) -> Duration {
        if retries == 0 {
            return self.config.base_delay();
        }

        let mut backoff = self.envelope_nanos(retries);

        // Randomize so that callers failing together do not retry in lockstep.
        backoff *= 1.0 + self.config.jitter() * self.jitter.sample();

        if backoff < 0.0 {
            return Duration::ZERO;
        }
        nanos_to_duration(backoff)
    }
}

/// Multiplications performed one at a time before the envelope switches to
/// `powf` for the remaining attempts.
const STEPWISE_LIMIT: u32 = 1024;

/// Truncating conversion; the float-to-int cast saturates and maps NaN to 0.
fn nanos_to_duration(nanos: f64) -> Duration {
    Duration::from_nanos(nanos as u64)
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// Wraps a [`BackoffConfigBuilder`] and optionally a jitter source.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::jitter::SeededRandom;
/// use retry_backoff::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(0.1)
///     .jitter_source(SeededRandom::new(7))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder<J = ThreadRandom> {
    config: BackoffConfigBuilder,
    jitter_source: J,
}

impl<J: JitterSource> ExponentialBackoffBuilder<J> {
    /// Set the delay for attempt 0.
    ///
    /// Default: 1s
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.base_delay(delay);
        self
    }

    /// Set the cap on the delay envelope.
    ///
    /// Default: 120s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.max_delay(delay);
        self
    }

    /// Set the exponential multiplier.
    ///
    /// Default: 1.6
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.config = self.config.multiplier(multiplier);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// Default: 0.2
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.config = self.config.jitter(jitter);
        self
    }

    /// Replace the random source used for jitter.
    pub fn jitter_source<K: JitterSource>(self, source: K) -> ExponentialBackoffBuilder<K> {
        ExponentialBackoffBuilder {
            config: self.config,
            jitter_source: source,
        }
    }

    /// Build the policy.
    pub fn build(self) -> ExponentialBackoff<J> {
        ExponentialBackoff::with_jitter_source(self.config.build(), self.jitter_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::FixedSequence;

    fn deterministic(base: Duration, multiplier: f64, max: Duration) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .base_delay(base)
            .multiplier(multiplier)
            .max_delay(max)
            .jitter(0.0)
            .build()
    }

    #[test]
    fn test_exponential_delay_calculation() {
        let backoff = deterministic(Duration::from_millis(100), 2.0, Duration::from_secs(10));

        // Attempt 0: base delay unchanged
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        // Attempt n: 100ms * 2^n
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay_cap() {
        let backoff = deterministic(Duration::from_secs(1), 10.0, Duration::from_secs(5));

        for attempt in 1..10 {
            let delay = backoff.delay(attempt);
            assert!(
                delay <= Duration::from_secs(5),
                "Delay at attempt {} ({:?}) exceeded max_delay",
                attempt,
                delay
            );
        }
        assert_eq!(backoff.delay(9), Duration::from_secs(5));
    }

    #[test]
    fn test_attempt_zero_skips_jitter() {
        let backoff = ExponentialBackoff::with_jitter_source(
            BackoffConfig::default(),
            FixedSequence::constant(1.0),
        );

        for _ in 0..10 {
            assert_eq!(backoff.delay(0), Duration::from_secs(1));
        }
    }

    #[test]
    fn test_fixed_jitter_bounds() {
        let backoff = ExponentialBackoff::with_jitter_source(
            BackoffConfig::default(),
            FixedSequence::new([1.0, -1.0, 0.0]),
        );

        // envelope for attempt 1 is 1.6s
        assert_eq!(backoff.delay(1), Duration::from_millis(1920));
        assert_eq!(backoff.delay(1), Duration::from_millis(1280));
        assert_eq!(backoff.delay(1), Duration::from_millis(1600));
    }

    #[test]
    fn test_excess_jitter_floors_at_zero() {
        let config = BackoffConfig::new(Duration::from_secs(1), 2.0, 1.5, Duration::from_secs(60));
        let backoff = ExponentialBackoff::with_jitter_source(config, FixedSequence::constant(-1.0));

        assert_eq!(backoff.delay(3), Duration::ZERO);
    }

    #[test]
    fn test_huge_retries_terminate() {
        let growing = deterministic(Duration::from_millis(1), 1.6, Duration::from_secs(120));
        assert_eq!(growing.delay(u32::MAX), Duration::from_secs(120));

        let flat = deterministic(Duration::from_millis(250), 1.0, Duration::from_secs(120));
        assert_eq!(flat.delay(u32::MAX), Duration::from_millis(250));

        let shrinking = deterministic(Duration::from_secs(1), 0.5, Duration::from_secs(120));
        assert_eq!(shrinking.delay(u32::MAX), Duration::ZERO);
    }

    #[test]
    fn test_slow_growth_huge_retries_is_prompt() {
        let backoff = deterministic(Duration::from_secs(1), 1.0 + 1e-12, Duration::from_secs(120));

        let start = std::time::Instant::now();
        let delay = backoff.delay(u32::MAX);
        assert!(
            start.elapsed() < Duration::from_secs(1),
            "delay(u32::MAX) took {:?}",
            start.elapsed()
        );

        // 1s * (1 + 1e-12)^(2^32 - 1) ≈ 1.0043s
        assert!(
            delay > Duration::from_millis(1004) && delay < Duration::from_millis(1005),
            "got {:?}",
            delay
        );
    }

    #[test]
    fn test_envelope_monotonic_across_stepwise_limit() {
        let backoff = deterministic(Duration::from_secs(1), 1.0 + 1e-6, Duration::from_secs(120));

        let around: Vec<_> = (STEPWISE_LIMIT - 2..STEPWISE_LIMIT + 3)
            .map(|n| backoff.envelope(n))
            .collect();
        assert!(around.windows(2).all(|w| w[0] <= w[1]), "{:?}", around);

        // growth continues past the limit
        assert!(backoff.envelope(1_000_000) > backoff.envelope(STEPWISE_LIMIT));
    }

    #[test]
    fn test_zero_base_delay_stays_zero() {
        let backoff = deterministic(Duration::ZERO, 2.0, Duration::from_secs(10));
        assert_eq!(backoff.delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(5), Duration::ZERO);
    }

    #[test]
    fn test_envelope_ignores_jitter() {
        let backoff = ExponentialBackoff::with_jitter_source(
            BackoffConfig::default(),
            FixedSequence::constant(1.0),
        );

        assert_eq!(backoff.envelope(0), Duration::from_secs(1));
        assert_eq!(backoff.envelope(1), Duration::from_millis(1600));
        assert_eq!(backoff.envelope(100), Duration::from_secs(120));
    }

    #[test]
    fn test_jitter_variation() {
        let backoff = ExponentialBackoff::builder()
            .base_delay(Duration::from_secs(1))
            .multiplier(2.0)
            .jitter(0.5)
            .build();

        let delays: Vec<_> = (0..20).map(|_| backoff.delay(1)).collect();

        // envelope 2s, ±50%
        for delay in &delays {
            let millis = delay.as_millis();
            assert!(
                (1000..=3000).contains(&millis),
                "Delay with 50% jitter should be in range [1000ms, 3000ms], got {}ms",
                millis
            );
        }

        let all_same = delays.windows(2).all(|w| w[0] == w[1]);
        assert!(!all_same, "With randomization, delays should vary");
    }

    #[test]
    fn test_builder_custom_values() {
        let backoff = ExponentialBackoff::builder()
            .base_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(30))
            .multiplier(1.5)
            .jitter(0.3)
            .build();

        let config = backoff.config();
        assert_eq!(config.base_delay(), Duration::from_millis(200));
        assert_eq!(config.max_delay(), Duration::from_secs(30));
        assert_eq!(config.multiplier(), 1.5);
        assert_eq!(config.jitter(), 0.3);
    }
}
