//! Core LLM client trait and a scripted client for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FlowError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model name used for requests
    fn model(&self) -> &str;
}

/// A scripted reply for [`MockLlmClient`]
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Unavailable(String),
}

/// LLM client that replays scripted replies in order and records every request
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that answers with the given texts, in order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_text(reply);
        }
        client
    }

    /// Queue a text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(MockReply::Text(text.into()));
    }

    /// Queue a connectivity failure
    pub fn push_unavailable(&self, reason: impl Into<String>) {
        self.push(MockReply::Unavailable(reason.into()));
    }

    fn push(&self, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .map_err(|e| FlowError::InvalidState(format!("mock request log poisoned: {}", e)))?
            .push(request);

        let reply = self
            .replies
            .lock()
            .map_err(|e| FlowError::InvalidState(format!("mock replies poisoned: {}", e)))?
            .pop_front();

        match reply {
            Some(MockReply::Text(text)) => Ok(CompletionResponse::text(text)),
            Some(MockReply::Unavailable(reason)) => Err(FlowError::ModelUnavailable(reason)),
            None => Err(FlowError::InvalidState(
                "mock client has no scripted replies left".to_string(),
            )),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
