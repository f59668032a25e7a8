//! Ollama client for local inference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::GenerationConfig;
use super::types::{GeneratedText, GenerationError, GenerationRequest, GenerationUsage, Generator};
use super::{build_http_client, map_transport_error};

/// Ollama API client.
///
/// Connects to a local Ollama server (default: http://localhost:11434).
/// No API key required.
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    api_base: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: build_http_client(timeout)?,
            model: config.model.clone(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    #[serde(default)]
    eval_count: u32,
    #[serde(default)]
    prompt_eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

#[async_trait]
impl Generator for OllamaClient {
    fn provider(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, GenerationError> {
        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(self.temperature),
                num_predict: request.max_tokens.unwrap_or(self.max_tokens),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.api_base.trim_end_matches('/')))
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(GenerationError::Api { status, message });
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Json(e.to_string()))?;

        Ok(GeneratedText {
            text: ollama_response.response,
            usage: GenerationUsage {
                input_tokens: ollama_response.prompt_eval_count,
                output_tokens: ollama_response.eval_count,
            },
            model: ollama_response.model,
        })
    }
}
