use serde::Serialize;
use std::time::Duration;

use super::config::PostStatus;

/// Post to be created in the CMS.
#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub title: String,
    /// HTML content
    pub content: String,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

/// Errors for publishing operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}
