//! Topic types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A non-blank topic string, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Creates a topic, returning `None` for empty or whitespace-only input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = TopicSourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::new(&value).ok_or(TopicSourceError::BlankTopic)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Errors raised while reading topics.
#[derive(Debug, Error)]
pub enum TopicSourceError {
    #[error("Topic file not found: {0}")]
    FileNotFound(String),

    #[error("Column \"{column}\" not found (available: {available:?})")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("Unsupported topic file {0:?}: expected .csv, .xlsx or .xls")]
    UnsupportedFormat(String),

    #[error("Failed to parse topic file: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Topic cannot be blank")]
    BlankTopic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_trims_whitespace() {
        let topic = Topic::new("  Solar Energy \n").unwrap();
        assert_eq!(topic.as_str(), "Solar Energy");
        assert_eq!(topic.to_string(), "Solar Energy");
    }

    #[test]
    fn test_blank_topic_rejected() {
        assert!(Topic::new("").is_none());
        assert!(Topic::new("   \t").is_none());
    }

    #[test]
    fn test_topic_deserialize_rejects_blank() {
        let ok: Topic = serde_json::from_str("\"EV Batteries\"").unwrap();
        assert_eq!(ok.as_str(), "EV Batteries");

        let err = serde_json::from_str::<Topic>("\"  \"");
        assert!(err.is_err());
    }
}
