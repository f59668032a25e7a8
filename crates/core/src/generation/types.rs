//! Generator trait and request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error type for generation calls.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Prompt payload for one article.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System instruction
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Overrides the client's configured output token limit
    pub max_tokens: Option<u32>,
    /// Overrides the client's configured temperature
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Raw text returned by a generator.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    /// The generated text (may be empty if the model produced nothing)
    pub text: String,
    /// Token usage
    pub usage: GenerationUsage,
    /// Model that produced the text
    pub model: String,
}

impl GeneratedText {
    /// True when there is no usable content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait for generative-text backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name (e.g., "gemini", "openai", "ollama")
    fn provider(&self) -> &str;

    /// Model name
    fn model(&self) -> &str;

    /// Generate text for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("Hello")
            .with_system("You are helpful")
            .with_max_tokens(100)
            .with_temperature(0.5);

        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.system, Some("You are helpful".to_string()));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.5));
    }

    #[test]
    fn test_whitespace_text_is_empty() {
        let text = GeneratedText {
            text: " \n\t".to_string(),
            usage: GenerationUsage::default(),
            model: "m".to_string(),
        };
        assert!(text.is_empty());
    }
}
