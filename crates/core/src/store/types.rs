use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Article to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub word_count: usize,
}

/// A persisted article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: i64,
    pub topic: String,
    pub title: String,
    pub content: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Listing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleQuery {
    /// Only articles whose topic contains this text (case-insensitive).
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            topic: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Article not found: {0}")]
    NotFound(i64),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_query_defaults() {
        let query: ArticleQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert!(query.topic.is_none());
    }
}
