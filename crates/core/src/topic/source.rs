//! Topic source implementations.

use std::path::PathBuf;

use tracing::debug;

use super::{TableFormat, Topic, TopicSourceError, TopicTable};

/// Trait for anything that yields the topics of a batch.
pub trait TopicSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Load topics in input order. Blank entries are never returned.
    fn load(&self) -> Result<Vec<Topic>, TopicSourceError>;
}

/// Converts raw strings into topics, dropping empty and whitespace-only entries.
pub fn normalize_topics<I, S>(raw: I) -> Vec<Topic>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().filter_map(Topic::new).collect()
}

/// Truncates a topic list to `max` entries when a cap is configured.
pub fn limit_topics(mut topics: Vec<Topic>, max: Option<usize>) -> Vec<Topic> {
    if let Some(max) = max {
        if topics.len() > max {
            debug!(dropped = topics.len() - max, max, "Truncating topic list");
            topics.truncate(max);
        }
    }
    topics
}

/// Topics given directly, e.g. from a request body or a single form field.
#[derive(Debug, Clone, Default)]
pub struct InlineTopics {
    raw: Vec<String>,
}

impl InlineTopics {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            raw: raw.into_iter().map(Into::into).collect(),
        }
    }
}

impl TopicSource for InlineTopics {
    fn name(&self) -> &str {
        "inline"
    }

    fn load(&self) -> Result<Vec<Topic>, TopicSourceError> {
        Ok(normalize_topics(&self.raw))
    }
}

/// One column of a CSV or Excel file with a header row.
#[derive(Debug, Clone)]
pub struct TopicFile {
    path: PathBuf,
    column: String,
}

impl TopicFile {
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }

    fn format(&self) -> Result<TableFormat, TopicSourceError> {
        let name = self.path.display().to_string();
        TableFormat::from_filename(&name).ok_or(TopicSourceError::UnsupportedFormat(name))
    }
}

impl TopicSource for TopicFile {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Vec<Topic>, TopicSourceError> {
        let format = self.format()?;
        if !self.path.exists() {
            return Err(TopicSourceError::FileNotFound(
                self.path.display().to_string(),
            ));
        }

        let bytes = std::fs::read(&self.path).map_err(|e| TopicSourceError::Io(e.to_string()))?;
        let topics = TopicTable::parse(format, &bytes)?.column_topics(&self.column)?;
        debug!(
            path = %self.path.display(),
            format = format.as_str(),
            column = %self.column,
            count = topics.len(),
            "Loaded topics from file"
        );
        Ok(topics)
    }
}
