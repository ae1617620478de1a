//! Error types for flowagent
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while running a turn
#[derive(Debug, Error)]
pub enum FlowError {
    /// The model endpoint could not be reached or answered with an error status
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The server is up but does not serve the configured model
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The model answered but the body could not be decoded
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// No tool input could be planned from the user text
    #[error("Planning failed: {0}")]
    Planning(String),

    /// Expression contains a character outside the calculator whitelist
    #[error("Unsafe expression: character {character:?} at position {position} is not allowed")]
    UnsafeExpression { character: char, position: usize },

    /// Expression is not valid arithmetic
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// Expression divides by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    /// Errors from the model boundary abort the whole turn
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            FlowError::ModelUnavailable(_) | FlowError::ModelNotFound(_) | FlowError::InvalidResponse(_)
        )
    }

    /// Errors raised on the tool path; these become the state's `error` field
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            FlowError::Planning(_)
                | FlowError::UnsafeExpression { .. }
                | FlowError::MalformedExpression(_)
                | FlowError::DivisionByZero
        )
    }

    /// Only connectivity failures can succeed on a second attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::ModelUnavailable(_))
    }
}

/// Result type alias for flowagent operations
pub type Result<T> = std::result::Result<T, FlowError>;
