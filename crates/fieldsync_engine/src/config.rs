//! Configuration for the push engine.

use std::time::Duration;

/// Timing configuration for the dispatcher and pull requester.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long each gating input must stay quiet before the dispatcher
    /// observes its new value.
    pub debounce_interval: Duration,
    /// Cadence of the retry loop after a failed push attempt. Constant, no
    /// backoff.
    pub retry_interval: Duration,
    /// Cadence of periodic pull requests.
    pub pull_interval: Duration,
}

impl EngineConfig {
    /// Creates a configuration with the default cadences: 500 ms debounce,
    /// 60 s push retry, 5 min pull.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce_interval: Duration::from_millis(500),
            retry_interval: Duration::from_secs(60),
            pull_interval: Duration::from_secs(60 * 5),
        }
    }

    /// Sets the debounce interval.
    #[must_use]
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Sets the retry interval.
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Sets the pull interval.
    #[must_use]
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = EngineConfig::new()
            .with_debounce_interval(Duration::from_millis(10))
            .with_retry_interval(Duration::from_secs(1))
            .with_pull_interval(Duration::from_secs(30));

        assert_eq!(config.debounce_interval, Duration::from_millis(10));
        assert_eq!(config.retry_interval, Duration::from_secs(1));
        assert_eq!(config.pull_interval, Duration::from_secs(30));
    }

    #[test]
    fn config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce_interval, Duration::from_millis(500));
        assert_eq!(config.retry_interval, Duration::from_secs(60));
    }
}
