//! Backoff configuration.
//!
//! [`BackoffConfig`] is the resolved, immutable configuration consumed by
//! [`ExponentialBackoff`](crate::retry::ExponentialBackoff). There are three
//! ways to obtain one:
//!
//! - [`BackoffConfig::new`] replaces every zero-valued field with its default.
//! - [`BackoffConfig::builder`] only defaults the fields that were never set,
//!   so an explicit `jitter(0.0)` is honoured.
//! - [`BackoffSettings`] is the serde form for embedding in a config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved configuration for exponential backoff.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::config::BackoffConfig;
/// use std::time::Duration;
///
/// // Zero fields fall back to the defaults.
/// let config = BackoffConfig::new(Duration::ZERO, 0.0, 0.0, Duration::from_secs(30));
/// assert_eq!(config.base_delay(), Duration::from_secs(1));
/// assert_eq!(config.multiplier(), 1.6);
/// assert_eq!(config.jitter(), 0.2);
/// assert_eq!(config.max_delay(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    base_delay: Duration,
    multiplier: f64,
    jitter: f64,
    max_delay: Duration,
}

impl BackoffConfig {
    /// Default delay before the first retry.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    /// Default growth factor per attempt.
    pub const DEFAULT_MULTIPLIER: f64 = 1.6;
    /// Default jitter factor.
    pub const DEFAULT_JITTER: f64 = 0.2;
    /// Default cap on the delay envelope.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);
    /// A tighter cap for interactive callers.
    pub const SHORT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Build a configuration, replacing each zero-valued field with its
    /// default.
    ///
    /// A multiplier that is not a positive finite number is also replaced.
    /// `jitter` is taken as given apart from the zero check; values above
    /// `1.0` are outside the supported range but still produce non-negative
    /// delays.
    pub fn new(base_delay: Duration, multiplier: f64, jitter: f64, max_delay: Duration) -> Self {
        Self {
            base_delay: if base_delay.is_zero() {
                Self::DEFAULT_BASE_DELAY
            } else {
                base_delay
            },
            multiplier: resolve_multiplier(multiplier),
            jitter: if jitter == 0.0 || !jitter.is_finite() {
                Self::DEFAULT_JITTER
            } else {
                jitter
            },
            max_delay: if max_delay.is_zero() {
                Self::DEFAULT_MAX_DELAY
            } else {
                max_delay
            },
        }
    }

    /// Start a builder with every field unset.
    pub fn builder() -> BackoffConfigBuilder {
        BackoffConfigBuilder::default()
    }

    /// Delay returned for attempt 0.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Growth factor applied per attempt.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fractional randomization applied to the envelope.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Upper bound of the unrandomized envelope.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for BackoffConfig {
    /// Defaults:
    /// - `base_delay`: 1s
    /// - `multiplier`: 1.6
    /// - `jitter`: 0.2
    /// - `max_delay`: 120s
    fn default() -> Self {
        Self {
            base_delay: Self::DEFAULT_BASE_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
            jitter: Self::DEFAULT_JITTER,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }
}

fn resolve_multiplier(multiplier: f64) -> f64 {
    if multiplier > 0.0 && multiplier.is_finite() {
        multiplier
    } else {
        BackoffConfig::DEFAULT_MULTIPLIER
    }
}

/// Builder for [`BackoffConfig`].
///
/// Unset fields take their defaults; set fields are kept, including zero.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::config::BackoffConfig;
/// use std::time::Duration;
///
/// let config = BackoffConfig::builder()
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(10))
///     .multiplier(2.0)
///     .jitter(0.0)
///     .build();
///
/// assert_eq!(config.jitter(), 0.0);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BackoffConfigBuilder {
    base_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
    max_delay: Option<Duration>,
}

impl BackoffConfigBuilder {
    /// Set the delay returned for attempt 0.
    ///
    /// Default: 1s
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Set the growth factor. Should ideally be greater than 1.
    ///
    /// Non-positive or non-finite values fall back to the default.
    ///
    /// Default: 1.6
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.2 lets each delay vary by ±20% around its envelope.
    ///
    /// Default: 0.2
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(if jitter.is_nan() {
            BackoffConfig::DEFAULT_JITTER
        } else {
            jitter.clamp(0.0, 1.0)
        });
        self
    }

    /// Set the cap on the delay envelope.
    ///
    /// Default: 120s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Resolve the configuration.
    pub fn build(self) -> BackoffConfig {
        BackoffConfig {
            base_delay: self.base_delay.unwrap_or(BackoffConfig::DEFAULT_BASE_DELAY),
            multiplier: self
                .multiplier
                .map(resolve_multiplier)
                .unwrap_or(BackoffConfig::DEFAULT_MULTIPLIER),
            jitter: self.jitter.unwrap_or(BackoffConfig::DEFAULT_JITTER),
            max_delay: self.max_delay.unwrap_or(BackoffConfig::DEFAULT_MAX_DELAY),
        }
    }
}

/// Serializable backoff settings, with durations in milliseconds.
///
/// Every field is optional; missing fields take their defaults when the
/// settings are converted into a [`BackoffConfig`].
///
/// # Examples
///
/// ```rust
/// use retry_backoff::config::{BackoffConfig, BackoffSettings};
/// use std::time::Duration;
///
/// let settings: BackoffSettings =
///     serde_json::from_str(r#"{ "base_delay_ms": 250, "jitter": 0.1 }"#).unwrap();
/// let config = BackoffConfig::from(settings);
///
/// assert_eq!(config.base_delay(), Duration::from_millis(250));
/// assert_eq!(config.max_delay(), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffSettings {
    /// Delay for attempt 0, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    /// Growth factor per attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    /// Jitter factor between 0.0 and 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
    /// Cap on the delay envelope, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl BackoffSettings {
    /// Turn the settings into a builder, so individual fields can still be
    /// overridden in code.
    pub fn into_builder(self) -> BackoffConfigBuilder {
        let mut builder = BackoffConfig::builder();
        if let Some(ms) = self.base_delay_ms {
            builder = builder.base_delay(Duration::from_millis(ms));
        }
        if let Some(multiplier) = self.multiplier {
            builder = builder.multiplier(multiplier);
        }
        if let Some(jitter) = self.jitter {
            builder = builder.jitter(jitter);
        }
        if let Some(ms) = self.max_delay_ms {
            builder = builder.max_delay(Duration::from_millis(ms));
        }
        builder
    }
}

impl From<BackoffSettings> for BackoffConfig {
    fn from(settings: BackoffSettings) -> Self {
        settings.into_builder().build()
    }
}

impl From<BackoffConfig> for BackoffSettings {
    fn from(config: BackoffConfig) -> Self {
        Self {
            base_delay_ms: Some(config.base_delay.as_millis().min(u64::MAX as u128) as u64),
            multiplier: Some(config.multiplier),
            jitter: Some(config.jitter),
            max_delay_ms: Some(config.max_delay.as_millis().min(u64::MAX as u128) as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fields_take_defaults() {
        let config = BackoffConfig::new(Duration::ZERO, 0.0, 0.0, Duration::ZERO);
        assert_eq!(config, BackoffConfig::default());
    }

    #[test]
    fn test_non_zero_fields_are_kept() {
        let config = BackoffConfig::new(
            Duration::from_millis(200),
            2.5,
            0.5,
            Duration::from_secs(30),
        );

        assert_eq!(config.base_delay(), Duration::from_millis(200));
        assert_eq!(config.multiplier(), 2.5);
        assert_eq!(config.jitter(), 0.5);
        assert_eq!(config.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_multiplier_replaced() {
        for multiplier in [-1.0, f64::NAN, f64::INFINITY] {
            let config = BackoffConfig::new(Duration::ZERO, multiplier, 0.0, Duration::ZERO);
            assert_eq!(config.multiplier(), BackoffConfig::DEFAULT_MULTIPLIER);
        }
    }

    #[test]
    fn test_out_of_range_jitter_kept_by_new() {
        let config = BackoffConfig::new(Duration::ZERO, 0.0, 1.5, Duration::ZERO);
        assert_eq!(config.jitter(), 1.5);
    }

    #[test]
    fn test_builder_defaults() {
        assert_eq!(BackoffConfig::builder().build(), BackoffConfig::default());
    }

    #[test]
    fn test_builder_keeps_explicit_zero_jitter() {
        let config = BackoffConfig::builder().jitter(0.0).build();
        assert_eq!(config.jitter(), 0.0);
        assert_eq!(config.base_delay(), BackoffConfig::DEFAULT_BASE_DELAY);
    }

    #[test]
    fn test_builder_clamps_jitter() {
        assert_eq!(BackoffConfig::builder().jitter(2.0).build().jitter(), 1.0);
        assert_eq!(BackoffConfig::builder().jitter(-0.5).build().jitter(), 0.0);
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: BackoffSettings = toml::from_str(
            r#"
            base_delay_ms = 500
            multiplier = 2.0
            max_delay_ms = 30000
            "#,
        )
        .unwrap();

        let config = BackoffConfig::from(settings);
        assert_eq!(config.base_delay(), Duration::from_millis(500));
        assert_eq!(config.multiplier(), 2.0);
        assert_eq!(config.jitter(), BackoffConfig::DEFAULT_JITTER);
        assert_eq!(config.max_delay(), BackoffConfig::SHORT_MAX_DELAY);
    }

    #[test]
    fn test_settings_reject_unknown_fields() {
        let result = toml::from_str::<BackoffSettings>("max_retries = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let settings = BackoffSettings::from(BackoffConfig::default());
        let json = serde_json::to_value(&settings).unwrap();

        assert_eq!(json["base_delay_ms"], 1000);
        assert_eq!(json["max_delay_ms"], 120_000);
        assert_eq!(BackoffConfig::from(settings), BackoffConfig::default());
    }
}
