//! Configuration for the batch pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the batch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Default maximum number of topics processed at once.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Timeout for each external call (generation, image upload, post creation).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Deadline for a whole run. Topics not started by then fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_secs: Option<u64>,

    /// Cap on topics per batch; extra topics are dropped by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_topics: Option<usize>,

    /// Retry configuration for the generation step.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total generation attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_concurrency_limit() -> usize {
    10
}

fn default_call_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(retry.saturating_sub(1) as i32);
        let delay_ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            call_timeout_secs: default_call_timeout(),
            run_timeout_secs: None,
            max_topics: None,
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Sets the default concurrency limit.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Sets the per-call timeout.
    pub fn with_call_timeout(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    /// Sets the run deadline.
    pub fn with_run_timeout(mut self, secs: u64) -> Self {
        self.run_timeout_secs = Some(secs);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.concurrency_limit, 10);
        assert_eq!(config.call_timeout(), Duration::from_secs(60));
        assert!(config.run_timeout().is_none());
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_concurrency_limit(3)
            .with_call_timeout(5)
            .with_run_timeout(120);

        assert_eq!(config.concurrency_limit, 3);
        assert_eq!(config.call_timeout_secs, 5);
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_retry_backoff() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 500,
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(400));
        assert_eq!(retry.delay_for(4), Duration::from_millis(500));
    }
}
