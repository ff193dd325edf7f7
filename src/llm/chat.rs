//! Chat-completions API client
//!
//! This module provides an HTTP client for OpenAI-compatible
//! chat-completions endpoints (xAI by default).
//!
//! # Example
//!
//! ```ignore
//! use legacy_modernizer::llm::{ChatCompletionsClient, GenerationConfig, GenerationParams};
//!
//! let client = ChatCompletionsClient::new(&GenerationConfig::with_api_key(key));
//! let params = GenerationParams::new(0.1, 500, 10_000);
//! let text = client.generate("Infer a JSON array from...", &params).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{GenerationClient, GenerationParams};
use super::config::GenerationConfig;
use super::error::{GenerationError, GenerationResult};

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    /// Endpoint URL
    endpoint: String,
    /// Model name to use
    model: String,
    /// Bearer credential
    api_key: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// One role-tagged message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the chat-completions endpoint
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token accounting reported by the service
#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

impl ChatCompletionsClient {
    /// Create a client from connection settings
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client reusing an existing HTTP connection pool
    pub fn with_http_client(config: &GenerationConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            ..Self::new(config)
        }
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for ChatCompletionsClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> GenerationResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::ConfigError("no API key configured".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Sending generation request");

        let timeout_ms = params.timeout_ms;
        let map_transport = |e: reqwest::Error| {
            if e.is_timeout() {
                GenerationError::Timeout(timeout_ms)
            } else if e.is_connect() {
                GenerationError::ConnectionError(format!(
                    "Failed to connect to {}: {}",
                    self.endpoint, e
                ))
            } else {
                GenerationError::ConnectionError(e.to_string())
            }
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(params.timeout())
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(map_transport)?;
        let chat_response: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &chat_response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens.unwrap_or(0),
                completion_tokens = usage.completion_tokens.unwrap_or(0),
                "Generation completed"
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyCompletion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
