use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Status a post is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Publish,
    Draft,
    Pending,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
        }
    }
}

/// WordPress REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressConfig {
    /// Site URL (e.g., "https://blog.example.com")
    pub url: String,
    /// WordPress user name
    pub username: String,
    /// Application password generated in the user profile
    pub app_password: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub post_status: PostStatus,
    /// Image uploaded and set as featured media on each post
    #[serde(default)]
    pub featured_image: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PostStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(PostStatus::default(), PostStatus::Publish);
        assert_eq!(PostStatus::Draft.as_str(), "draft");
    }

    #[test]
    fn test_wordpress_config_defaults() {
        let config: WordPressConfig = toml::from_str(
            r#"
url = "https://blog.example.com"
username = "admin"
app_password = "abcd efgh ijkl"
"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.post_status, PostStatus::Publish);
        assert!(config.featured_image.is_none());
    }
}
