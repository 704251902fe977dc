//! Cache configuration.
//!
//! Controls collection expiry and whether repopulation is deduplicated.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_ABSOLUTE_EXPIRATION_SECS: u64 = 3600;
const DEFAULT_SLIDING_EXPIRATION_SECS: u64 = 600;

/// Dual expiration applied to every cached collection.
///
/// An entry dies at `inserted + absolute` no matter how often it is read, and
/// earlier if it sits unread for `sliding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    pub absolute: Duration,
    pub sliding: Duration,
}

impl ExpirationPolicy {
    pub fn new(absolute: Duration, sliding: Duration) -> Self {
        Self { absolute, sliding }
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            absolute: Duration::from_secs(DEFAULT_ABSOLUTE_EXPIRATION_SECS),
            sliding: Duration::from_secs(DEFAULT_SLIDING_EXPIRATION_SECS),
        }
    }
}

/// Cache configuration from `registry.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Hard TTL in seconds.
    pub absolute_expiration_seconds: u64,
    /// Idle TTL in seconds, reset on each read.
    pub sliding_expiration_seconds: u64,
    /// Deduplicate concurrent reloads of the same key.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            absolute_expiration_seconds: DEFAULT_ABSOLUTE_EXPIRATION_SECS,
            sliding_expiration_seconds: DEFAULT_SLIDING_EXPIRATION_SECS,
            single_flight: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            absolute_expiration_seconds: settings.absolute_expiration.as_secs(),
            sliding_expiration_seconds: settings.sliding_expiration.as_secs(),
            single_flight: settings.single_flight,
        }
    }
}

impl CacheConfig {
    pub fn expiration(&self) -> ExpirationPolicy {
        ExpirationPolicy::new(
            Duration::from_secs(self.absolute_expiration_seconds.max(1)),
            Duration::from_secs(self.sliding_expiration_seconds.max(1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.absolute_expiration_seconds, 3600);
        assert_eq!(config.sliding_expiration_seconds, 600);
        assert!(!config.single_flight);
        assert_eq!(config.expiration(), ExpirationPolicy::default());
    }

    #[test]
    fn zero_durations_clamp_to_one_second() {
        let config = CacheConfig {
            absolute_expiration_seconds: 0,
            sliding_expiration_seconds: 0,
            ..Default::default()
        };
        let policy = config.expiration();
        assert_eq!(policy.absolute, Duration::from_secs(1));
        assert_eq!(policy.sliding, Duration::from_secs(1));
    }
}
