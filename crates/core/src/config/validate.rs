use super::{types::Config, ConfigError};
use crate::generation::GenerationProvider;
use crate::pipeline::ConcurrencyLimit;

/// Longest accepted run deadline (one week).
const MAX_RUN_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted delay between generation retries (one hour).
const MAX_RETRY_DELAY_MS: u64 = 60 * 60 * 1000;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Pipeline limits are non-zero and within their upper bounds
/// - Hosted generation providers have an API key
/// - A configured publisher has its backend section and a URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.pipeline.concurrency_limit == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.concurrency_limit must be at least 1".to_string(),
        ));
    }

    if config.pipeline.concurrency_limit > ConcurrencyLimit::MAX {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.concurrency_limit must be at most {}",
            ConcurrencyLimit::MAX
        )));
    }

    if config
        .pipeline
        .run_timeout_secs
        .is_some_and(|secs| secs > MAX_RUN_TIMEOUT_SECS)
    {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.run_timeout_secs must be at most {}",
            MAX_RUN_TIMEOUT_SECS
        )));
    }

    if config.pipeline.retry.max_delay_ms > MAX_RETRY_DELAY_MS {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.retry.max_delay_ms must be at most {}",
            MAX_RETRY_DELAY_MS
        )));
    }

    if config.pipeline.call_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.call_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.pipeline.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.generation.provider != GenerationProvider::Ollama
        && config.generation.api_key().is_none()
    {
        return Err(ConfigError::ValidationError(format!(
            "generation.api_key is required for provider {:?}",
            config.generation.provider
        )));
    }

    if let Some(publisher) = &config.publisher {
        match &publisher.wordpress {
            Some(wp) if wp.url.trim().is_empty() => {
                return Err(ConfigError::ValidationError(
                    "publisher.wordpress.url cannot be empty".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                return Err(ConfigError::ValidationError(
                    "publisher.backend = \"wordpress\" requires a [publisher.wordpress] section"
                        .to_string(),
                ));
            }
        }
    }

    Ok(())
}
