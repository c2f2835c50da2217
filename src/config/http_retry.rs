use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, serialize_duration_to_ms,
    serialize_duration_to_seconds,
};

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> Duration {
    Duration::from_secs(1)
}

fn default_max_backoff_ms() -> Duration {
    Duration::from_secs(10)
}

fn default_base_for_backoff() -> u32 {
    2
}

/// Serializable setting for jitter in retry policies
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
    /// No jitter applied to the backoff duration
    #[default]
    None,
    /// Full jitter applied, randomizing the backoff duration
    Full,
}

/// Retry policy for requests issued through the resilient fetch client.
///
/// The delay before retry `n` (zero-based) is
/// `initial_backoff_ms * base_for_backoff^n`, clamped to `max_backoff_secs`.
/// A base of 1 therefore yields a constant delay, a base of 2 the classic
/// `2^n` doubling. Use [`HttpRetryConfig::exponential`] and
/// [`HttpRetryConfig::constant`] for the two presets the exporter relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HttpRetryConfig {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_attempts")]
    pub max_retries: u32,
    /// Base duration for exponential backoff calculations
    #[serde(default = "default_base_for_backoff")]
    pub base_for_backoff: u32,
    /// Initial backoff duration before the first retry
    #[serde(
        default = "default_initial_backoff_ms",
        deserialize_with = "deserialize_duration_from_ms",
        serialize_with = "serialize_duration_to_ms"
    )]
    pub initial_backoff_ms: Duration,
    /// Maximum backoff duration for retries
    #[serde(
        default = "default_max_backoff_ms",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub max_backoff_secs: Duration,
    /// Jitter to apply to the backoff duration
    #[serde(default)]
    pub jitter: JitterSetting,
}

impl HttpRetryConfig {
    /// Doubling backoff starting at one second: waits 1s, 2s, 4s between the
    /// four attempts.
    pub fn exponential() -> Self {
        Self {
            max_retries: default_max_attempts(),
            base_for_backoff: default_base_for_backoff(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_ms(),
            jitter: JitterSetting::None,
        }
    }

    /// Fixed `delay` between every attempt.
    pub fn constant(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            base_for_backoff: 1,
            initial_backoff_ms: delay,
            max_backoff_secs: delay,
            jitter: JitterSetting::None,
        }
    }

    /// Preset used for consensus block fetches: six attempts, two seconds apart.
    pub fn block_fetch() -> Self {
        Self::constant(5, Duration::from_secs(2))
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        Self::exponential()
    }
}
