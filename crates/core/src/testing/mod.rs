//! Testing utilities and mock implementations.
//!
//! Compiled for this crate's own tests and behind the `testing` feature.
//!
//! This module provides mock implementations of the pipeline's collaborator
//! traits, so batches can be exercised without a generation API, a database
//! file or a CMS.
//!
//! # Example
//!
//! ```rust,ignore
//! use contentforge_core::testing::{MockArticleStore, MockGenerator, MockPublisher};
//!
//! let generator = Arc::new(MockGenerator::new());
//! let store = Arc::new(MockArticleStore::new());
//! let publisher = Arc::new(MockPublisher::new());
//!
//! generator.set_empty_response("Broken Topic");
//! publisher.set_reject_title("Article about Rejected Topic");
//! ```

mod mock_generator;
mod mock_publisher;
mod mock_store;

pub use mock_generator::{default_article, MockGenerator};
pub use mock_publisher::{MockPublisher, RecordedUpload};
pub use mock_store::MockArticleStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Config;
    use crate::generation::{GenerationConfig, GenerationProvider};
    use crate::publisher::{PostStatus, WordPressConfig};
    use crate::topic::{normalize_topics, Topic};

    /// Topics from string literals, blank entries dropped.
    pub fn topics(raw: &[&str]) -> Vec<Topic> {
        normalize_topics(raw)
    }

    /// Title the default mock generator response produces for a topic.
    pub fn default_title(topic: &str) -> String {
        format!("Article about {}", topic)
    }

    /// Generation config pointing at a local Ollama, needing no key.
    pub fn generation_config() -> GenerationConfig {
        GenerationConfig {
            provider: GenerationProvider::Ollama,
            model: "llama3".to_string(),
            ..GenerationConfig::default()
        }
    }

    pub fn wordpress_config(url: &str) -> WordPressConfig {
        WordPressConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            app_password: "test-app-password".to_string(),
            timeout_secs: 5,
            post_status: PostStatus::Draft,
            featured_image: None,
        }
    }

    /// Minimal valid configuration.
    pub fn test_config() -> Config {
        Config {
            server: Default::default(),
            database: Default::default(),
            generation: generation_config(),
            prompt: Default::default(),
            pipeline: Default::default(),
            publisher: None,
            uploads: Default::default(),
        }
    }
}
