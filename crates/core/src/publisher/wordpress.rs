//! WordPress REST API publisher (`/wp-json/wp/v2`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::config::{PostStatus, WordPressConfig};
use super::types::{PostDraft, PublishError};
use super::Publisher;

/// Publishes posts through the WordPress REST API using an application
/// password (HTTP Basic auth).
pub struct WordPressPublisher {
    client: Client,
    config: WordPressConfig,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: u64,
}

impl WordPressPublisher {
    pub fn new(config: WordPressConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PublishError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// REST API base without trailing slash.
    fn api_base(&self) -> String {
        format!("{}/wp-json/wp/v2", self.config.url.trim_end_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> PublishError {
        if e.is_timeout() {
            PublishError::Timeout(Duration::from_secs(self.config.timeout_secs))
        } else {
            PublishError::Http(e.to_string())
        }
    }

    /// Set alt text and title on an uploaded image. Failure is only logged.
    async fn describe_media(&self, media_id: u64, title: &str) {
        let result = self
            .client
            .post(format!("{}/media/{}", self.api_base(), media_id))
            .basic_auth(&self.config.username, Some(&self.config.app_password))
            .json(&serde_json::json!({ "alt_text": title, "title": title }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(
                media_id,
                status = response.status().as_u16(),
                "Failed to set image alt text"
            ),
            Err(e) => warn!(media_id, error = %e, "Failed to set image alt text"),
        }
    }
}

/// Content type for an image file, from its extension.
fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    fn name(&self) -> &str {
        "wordpress"
    }

    fn post_status(&self) -> PostStatus {
        self.config.post_status
    }

    fn featured_image(&self) -> Option<&Path> {
        self.config.featured_image.as_deref()
    }

    async fn upload_image(&self, path: &Path, title: &str) -> Result<Option<u64>, PublishError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Image file missing, skipping upload");
            return Ok(None);
        }

        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        debug!(filename = %filename, bytes = data.len(), "Uploading featured image");

        let response = self
            .client
            .post(format!("{}/media", self.api_base()))
            .basic_auth(&self.config.username, Some(&self.config.app_password))
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            )
            .header("Content-Type", image_content_type(path))
            .body(data)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let media: CreatedResource = response
            .json()
            .await
            .map_err(|e| PublishError::Json(e.to_string()))?;

        self.describe_media(media.id, title).await;

        info!(media_id = media.id, "Uploaded featured image");
        Ok(Some(media.id))
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<bool, PublishError> {
        let response = self
            .client
            .post(format!("{}/posts", self.api_base()))
            .basic_auth(&self.config.username, Some(&self.config.app_password))
            .json(draft)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                title = %draft.title,
                status = status.as_u16(),
                body = %body.chars().take(200).collect::<String>(),
                "WordPress rejected post"
            );
            return Ok(false);
        }

        match response.json::<CreatedResource>().await {
            Ok(post) => info!(post_id = post.id, title = %draft.title, "Created WordPress post"),
            Err(e) => debug!(error = %e, "Post created but response body was not parsed"),
        }
        Ok(true)
    }
}
