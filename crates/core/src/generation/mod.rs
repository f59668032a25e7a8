//! Generative-text clients.
//!
//! The pipeline only depends on the [`Generator`] trait: a prompt goes in,
//! raw article text comes out (or an error). Three HTTP backends are provided:
//!
//! - **Gemini**: Google Generative Language API (`generateContent`)
//! - **OpenAI**: chat completions, also usable with OpenAI-compatible proxies
//! - **Ollama**: local inference server, no API key
//!
//! Credentials come from [`GenerationConfig`] and are handed to the client at
//! construction time.

mod config;
mod gemini;
mod ollama;
mod openai;
mod types;

pub use config::{GenerationConfig, GenerationProvider};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use types::{GeneratedText, GenerationError, GenerationRequest, GenerationUsage, Generator};

/// Create the generator selected by configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>, GenerationError> {
    match config.provider {
        GenerationProvider::Gemini => Ok(Box::new(GeminiClient::new(config)?)),
        GenerationProvider::OpenAi => Ok(Box::new(OpenAiClient::new(config)?)),
        GenerationProvider::Ollama => Ok(Box::new(OllamaClient::new(config)?)),
    }
}

pub(crate) fn build_http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Http(e.to_string()))
}

/// Map a reqwest transport error, distinguishing timeouts.
pub(crate) fn map_transport_error(
    e: reqwest::Error,
    timeout: std::time::Duration,
) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Http(e.to_string())
    }
}
