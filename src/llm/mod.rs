//! LLM Client Layer - local model integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - OllamaClient implementation
//! - MockLlmClient for scripted tests

pub mod client;
pub mod ollama;
pub mod types;

pub use client::{LlmClient, MockLlmClient, MockReply};
pub use ollama::{OllamaClient, OllamaConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, Usage};
