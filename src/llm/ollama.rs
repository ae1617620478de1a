//! Ollama API client implementation
//!
//! This module implements the LlmClient trait against a local Ollama server's
//! non-streaming `/api/chat` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::error::{FlowError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, CompletionResponse, Role, Usage};

/// Default Ollama endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model to use
pub const DEFAULT_MODEL: &str = "llama3";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(120),
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowError::ModelUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint.trim_end_matches('/'))
    }

    /// Build the request body for the chat endpoint
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let model = request.model.as_ref().unwrap_or(&self.config.model);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        let mut messages: Vec<Value> = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(json!({ "role": "system", "content": request.system }));
        }
        messages.extend(request.messages.iter().map(|m| {
            json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content
            })
        }));

        json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": temperature }
        })
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
            return Err(FlowError::ModelUnavailable(error.to_string()));
        }

        let content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| FlowError::InvalidResponse("response has no message content".to_string()))?
            .to_string();

        let usage = Usage::new(
            body["prompt_eval_count"].as_u64().unwrap_or(0),
            body["eval_count"].as_u64().unwrap_or(0),
        );

        Ok(CompletionResponse { content, usage })
    }

    /// Send one request to the chat endpoint
    async fn send_request(&self, body: &Value) -> Result<Value> {
        let url = self.chat_url();
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FlowError::ModelUnavailable(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FlowError::ModelNotFound(format!(
                "'{}' at {}",
                self.config.model, self.config.endpoint
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FlowError::ModelUnavailable(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FlowError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        let mut attempt = 0;

        loop {
            match self.send_request(&body).await {
                Ok(value) => {
                    let response = self.parse_response(value)?;
                    debug!(
                        "Completion from {}: {} tokens",
                        self.config.model,
                        response.usage.total()
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Model call failed ({}), retrying in {:?} (attempt {}/{})",
                        e, self.config.retry_backoff, attempt, self.config.max_retries
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .finish()
    }
}
