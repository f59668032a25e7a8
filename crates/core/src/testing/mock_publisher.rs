//! Mock publisher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::publisher::{PostDraft, PostStatus, PublishError, Publisher};

/// A recorded image upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug, Default)]
struct State {
    posts: Vec<PostDraft>,
    uploads: Vec<RecordedUpload>,
    rejected_titles: HashSet<String>,
    failing_titles: HashSet<String>,
    panicking_titles: HashSet<String>,
    upload_error: bool,
    delay: Option<Duration>,
}

/// Mock implementation of the Publisher trait.
///
/// Every post is accepted unless its title was marked as rejected
/// (`create_post` returns `Ok(false)`) or failing (returns an error).
#[derive(Debug, Default)]
pub struct MockPublisher {
    state: Mutex<State>,
    featured_image: Option<PathBuf>,
    post_status: PostStatus,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach this image to every post.
    pub fn with_featured_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.featured_image = Some(path.into());
        self
    }

    pub fn with_post_status(mut self, status: PostStatus) -> Self {
        self.post_status = status;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make `create_post` return `Ok(false)` for this title.
    pub fn set_reject_title(&self, title: &str) {
        self.state().rejected_titles.insert(title.to_string());
    }

    /// Make `create_post` fail with an HTTP error for this title.
    pub fn set_fail_title(&self, title: &str) {
        self.state().failing_titles.insert(title.to_string());
    }

    /// Make `create_post` panic for this title.
    pub fn set_panic_title(&self, title: &str) {
        self.state().panicking_titles.insert(title.to_string());
    }

    /// Make every image upload fail.
    pub fn set_upload_error(&self, fail: bool) {
        self.state().upload_error = fail;
    }

    /// Sleep before answering each call.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Every `create_post` call, accepted or not.
    pub fn recorded_posts(&self) -> Vec<PostDraft> {
        self.state().posts.clone()
    }

    pub fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.state().uploads.clone()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    fn post_status(&self) -> PostStatus {
        self.post_status
    }

    fn featured_image(&self) -> Option<&Path> {
        self.featured_image.as_deref()
    }

    async fn upload_image(&self, path: &Path, title: &str) -> Result<Option<u64>, PublishError> {
        self.pause().await;
        let mut state = self.state();
        state.uploads.push(RecordedUpload {
            path: path.to_path_buf(),
            title: title.to_string(),
        });
        if state.upload_error {
            return Err(PublishError::Api {
                status: 413,
                message: "file too large".to_string(),
            });
        }
        Ok(Some(state.uploads.len() as u64 + 100))
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<bool, PublishError> {
        self.pause().await;
        let (panics, accepted) = {
            let mut state = self.state();
            state.posts.push(draft.clone());
            if state.failing_titles.contains(&draft.title) {
                return Err(PublishError::Http("connection refused".to_string()));
            }
            (
                state.panicking_titles.contains(&draft.title),
                !state.rejected_titles.contains(&draft.title),
            )
        };
        // Lock released first so the state stays usable afterwards.
        if panics {
            panic!("mock publisher panic for {}", draft.title);
        }
        Ok(accepted)
    }
}
