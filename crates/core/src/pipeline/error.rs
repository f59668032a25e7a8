//! Pipeline errors.

use std::time::Duration;

use thiserror::Error;

use super::types::FailureKind;

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure of a single topic. Never leaves the worker: it is recorded on the
/// topic's outcome.
#[derive(Debug, Clone, Error)]
pub enum TopicError {
    #[error("empty generation result")]
    GenerationEmpty,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("post-processing failed: {0}")]
    Processing(String),

    #[error("storage failed: {0}")]
    Storage(String),

    #[error("run deadline exceeded before processing")]
    Deadline,

    #[error("internal error: {0}")]
    Internal(String),
}

impl TopicError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TopicError::GenerationEmpty | TopicError::Generation(_) => FailureKind::Generation,
            TopicError::Timeout(_) => FailureKind::Timeout,
            TopicError::Processing(_) => FailureKind::Processing,
            TopicError::Storage(_) => FailureKind::Storage,
            TopicError::Deadline => FailureKind::Deadline,
            TopicError::Internal(_) => FailureKind::Internal,
        }
    }
}
