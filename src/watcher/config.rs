//! Watcher configuration
//!
//! Validated runtime settings for a [`PollWatcher`](super::PollWatcher).
//! Reads from Settings (.pollwatch/settings.toml).

use std::time::Duration;

use crate::Settings;

use super::error::WatchError;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for a polling watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WatcherConfig {
    /// Config with the given interval. Zero is rejected.
    pub fn new(poll_interval: Duration) -> Result<Self, WatchError> {
        if poll_interval.is_zero() {
            return Err(WatchError::InvalidDuration);
        }
        Ok(Self { poll_interval })
    }

    /// Create config from Settings.
    ///
    /// - `watcher.poll_interval_ms` -> poll_interval
    pub fn from_settings(settings: &Settings) -> Result<Self, WatchError> {
        Self::new(Duration::from_millis(settings.watcher.poll_interval_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        assert_eq!(
            WatcherConfig::default().poll_interval(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            WatcherConfig::new(Duration::ZERO),
            Err(WatchError::InvalidDuration)
        ));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.watcher.poll_interval_ms = 250;
        let config = WatcherConfig::from_settings(&settings).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));

        settings.watcher.poll_interval_ms = 0;
        assert!(matches!(
            WatcherConfig::from_settings(&settings),
            Err(WatchError::InvalidDuration)
        ));
    }
}
