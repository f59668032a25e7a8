//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PipelineError;

/// Maximum number of topics processed at once. Between 1 and
/// [`ConcurrencyLimit::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "usize")]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    /// Upper bound on admission slots for one run.
    pub const MAX: usize = 1024;

    pub fn new(value: i64) -> Result<Self, PipelineError> {
        if value < 1 {
            return Err(PipelineError::Configuration(format!(
                "concurrency limit must be at least 1, got {}",
                value
            )));
        }
        let value = usize::try_from(value).unwrap_or(usize::MAX);
        Self::try_from(value)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for ConcurrencyLimit {
    type Error = PipelineError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(PipelineError::Configuration(
                "concurrency limit must be at least 1, got 0".to_string(),
            ));
        }
        if value > Self::MAX {
            return Err(PipelineError::Configuration(format!(
                "concurrency limit must be at most {}, got {}",
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }
}

impl From<ConcurrencyLimit> for usize {
    fn from(limit: ConcurrencyLimit) -> Self {
        limit.0
    }
}

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Publish stored articles to the configured CMS.
    pub publish: bool,
    /// Overrides the configured concurrency limit.
    pub concurrency: Option<ConcurrencyLimit>,
}

impl RunOptions {
    pub fn with_publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }

    pub fn with_concurrency(mut self, limit: ConcurrencyLimit) -> Self {
        self.concurrency = Some(limit);
        self
    }
}

/// Final status of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Which step a failed topic stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Generation,
    Timeout,
    Processing,
    Storage,
    Deadline,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Generation => "generation",
            FailureKind::Timeout => "timeout",
            FailureKind::Processing => "processing",
            FailureKind::Storage => "storage",
            FailureKind::Deadline => "deadline",
            FailureKind::Internal => "internal",
        }
    }
}

/// Result of processing one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Position of the topic in the input list.
    pub index: usize,
    pub topic: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<i64>,
    pub stored: bool,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Generation attempts made.
    pub attempts: u32,
    pub duration_ms: u64,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Failure outcome for a topic that never produced an article.
    pub(crate) fn failed(
        index: usize,
        topic: &str,
        error: &super::TopicError,
        attempts: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            topic: topic.to_string(),
            status: OutcomeStatus::Failure,
            title: None,
            word_count: None,
            article_id: None,
            stored: false,
            published: false,
            publish_error: None,
            error: Some(error.to_string()),
            failure_kind: Some(error.kind()),
            attempts,
            duration_ms,
        }
    }
}

/// Report of a whole batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub published: usize,
    /// Highest number of topics processed at the same time.
    pub peak_concurrency: usize,
    pub duration_ms: u64,
    /// One outcome per input topic, in input order.
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn from_outcomes(
        run_id: Uuid,
        mut outcomes: Vec<Outcome>,
        peak_concurrency: usize,
        duration_ms: u64,
    ) -> Self {
        outcomes.sort_by_key(|o| o.index);
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let published = outcomes.iter().filter(|o| o.published).count();

        Self {
            run_id,
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            published,
            peak_concurrency,
            duration_ms,
            outcomes,
        }
    }

    pub fn empty(run_id: Uuid) -> Self {
        Self::from_outcomes(run_id, Vec::new(), 0, 0)
    }
}

/// Progress update for a batch run.
///
/// `TopicStarted` is dropped when the channel is full. `TopicFinished` is
/// sent after the topic released its slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchProgress {
    Started {
        run_id: Uuid,
        total: usize,
        concurrency: usize,
    },
    TopicStarted {
        run_id: Uuid,
        index: usize,
        topic: String,
    },
    TopicFinished {
        run_id: Uuid,
        outcome: Outcome,
    },
    Finished {
        run_id: Uuid,
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
    },
}

/// Status of the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Topics currently being processed.
    pub active: usize,
    /// Topics waiting for a slot.
    pub queued: usize,
    /// Highest `active` value since startup.
    pub peak_active: usize,
    /// Configured default concurrency limit.
    pub max_concurrent: usize,
    /// Topics processed since startup.
    pub total_processed: u64,
    /// Topics failed since startup.
    pub total_failed: u64,
    /// Batch runs started since startup.
    pub total_runs: u64,
}
