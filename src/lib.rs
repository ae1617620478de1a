//! flowagent - a routed LLM agent with a sandboxed calculator
//!
//! Each user turn is classified by a local model as needing the calculator
//! tool or a direct answer. Tool failures end in a fixed fallback answer;
//! every step is recorded in a trace for inspection.

pub mod agent;
pub mod console;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod tools;

pub use error::{FlowError, Result};
