//! Generation client trait and call parameters
//!
//! This module defines the `GenerationClient` trait that every stage of the
//! modernization chain calls through, plus the per-call parameters.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::GenerationResult;

/// Parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Time budget for the whole call in milliseconds
    pub timeout_ms: u64,
}

impl GenerationParams {
    /// Create call parameters
    pub fn new(temperature: f32, max_output_tokens: u32, timeout_ms: u64) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 2.0),
            max_output_tokens,
            timeout_ms,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the token bound
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// The timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Trait for text-generation backends
///
/// One call sends one user message and returns the first completion text.
/// Implementations must not retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for the given prompt
    ///
    /// # Arguments
    /// * `prompt` - The full prompt, sent as a single user message
    /// * `params` - Temperature, token bound and timeout for this call
    ///
    /// # Returns
    /// The first completion's text
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> GenerationResult<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// A scripted client for testing: returns queued responses in call order
#[cfg(test)]
pub struct ScriptedClient {
    responses: std::sync::Mutex<std::collections::VecDeque<GenerationResult<String>>>,
    calls: std::sync::Mutex<Vec<(String, GenerationParams)>>,
}

#[cfg(test)]
impl ScriptedClient {
    /// Create a client answering each call with the next scripted result
    pub fn new(responses: Vec<GenerationResult<String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a client whose every call succeeds with the given texts
    pub fn replying<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    /// Prompts and parameters received so far
    pub fn calls(&self) -> Vec<(String, GenerationParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> GenerationResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), *params));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(super::error::GenerationError::ConnectionError(
                "Script exhausted".to_string(),
            )))
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::error::GenerationError;

    #[test]
    fn test_params_clamp_and_timeout() {
        let params = GenerationParams::new(5.0, 500, 10_000);
        assert!((params.temperature - 2.0).abs() < f32::EPSILON);
        assert_eq!(params.timeout(), Duration::from_secs(10));

        let params = params.with_temperature(-1.0).with_timeout_ms(250);
        assert!(params.temperature.abs() < f32::EPSILON);
        assert_eq!(params.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_scripted_client_order() {
        let client = ScriptedClient::new(vec![
            Ok("first".to_string()),
            Err(GenerationError::Timeout(10)),
        ]);
        let params = GenerationParams::new(0.1, 10, 100);

        assert_eq!(client.generate("a", &params).await.unwrap(), "first");
        assert!(matches!(
            client.generate("b", &params).await,
            Err(GenerationError::Timeout(10))
        ));
        assert!(client.generate("c", &params).await.is_err());

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].0, "b");
        assert_eq!(client.model_name(), "scripted-model");
    }
}
