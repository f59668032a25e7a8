use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::generation::{GenerationConfig, GenerationProvider};
use crate::pipeline::PipelineConfig;
use crate::prompt::PromptConfig;
use crate::publisher::{PostStatus, WordPressConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub publisher: Option<PublisherConfig>,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("articles.db")
}

/// Publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    /// CMS backend type
    pub backend: PublisherBackend,
    /// WordPress-specific configuration (required when backend = "wordpress")
    #[serde(default)]
    pub wordpress: Option<WordPressConfig>,
}

/// Available CMS backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherBackend {
    Wordpress,
}

/// Topic file upload configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadsConfig {
    /// Directory uploaded topic files are saved to.
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    /// Column read when a batch request names none.
    #[serde(default = "default_column")]
    pub default_column: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_upload_bytes(),
            default_column: default_column(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_column() -> String {
    "Topics".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub generation: SanitizedGenerationConfig,
    pub prompt: PromptConfig,
    pub pipeline: PipelineConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<SanitizedPublisherConfig>,
    pub uploads: UploadsConfig,
}

/// Sanitized generation config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGenerationConfig {
    pub provider: String,
    pub model: String,
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub timeout_secs: u64,
}

/// Sanitized publisher config
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPublisherConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordpress: Option<SanitizedWordPressConfig>,
}

/// Sanitized WordPress config (application password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWordPressConfig {
    pub url: String,
    pub username: String,
    pub app_password_configured: bool,
    pub post_status: PostStatus,
    pub featured_image_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            generation: SanitizedGenerationConfig {
                provider: match config.generation.provider {
                    GenerationProvider::Gemini => "gemini".to_string(),
                    GenerationProvider::OpenAi => "openai".to_string(),
                    GenerationProvider::Ollama => "ollama".to_string(),
                },
                model: config.generation.model.clone(),
                api_key_configured: config.generation.api_key().is_some(),
                api_base: config.generation.api_base.clone(),
                timeout_secs: config.generation.timeout_secs,
            },
            prompt: config.prompt.clone(),
            pipeline: config.pipeline.clone(),
            publisher: config.publisher.as_ref().map(|p| SanitizedPublisherConfig {
                backend: match p.backend {
                    PublisherBackend::Wordpress => "wordpress".to_string(),
                },
                wordpress: p.wordpress.as_ref().map(|wp| SanitizedWordPressConfig {
                    url: wp.url.clone(),
                    username: wp.username.clone(),
                    app_password_configured: !wp.app_password.is_empty(),
                    post_status: wp.post_status,
                    featured_image_configured: wp.featured_image.is_some(),
                    timeout_secs: wp.timeout_secs,
                }),
            }),
            uploads: config.uploads.clone(),
        }
    }
}
