//! CMS publishing.
//!
//! Publishing is the last, optional step of the per-topic pipeline. Its
//! failures never change the outcome status of an already stored article.

mod config;
mod types;
mod wordpress;

use std::path::Path;

use async_trait::async_trait;

pub use config::{PostStatus, WordPressConfig};
pub use types::{PostDraft, PublishError};
pub use wordpress::WordPressPublisher;

/// Trait for CMS publishers.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Backend name (e.g., "wordpress")
    fn name(&self) -> &str;

    /// Status new posts are created with.
    fn post_status(&self) -> PostStatus {
        PostStatus::Publish
    }

    /// Featured image attached to every post, if configured.
    fn featured_image(&self) -> Option<&Path> {
        None
    }

    /// Upload an image to the media library and return its id.
    ///
    /// A missing file is not an error: returns `Ok(None)` and nothing is sent.
    async fn upload_image(&self, path: &Path, title: &str) -> Result<Option<u64>, PublishError>;

    /// Create a post. Returns `Ok(false)` when the CMS rejected it.
    async fn create_post(&self, draft: &PostDraft) -> Result<bool, PublishError>;
}
