//! Tool execution
//!
//! The agent has exactly one tool, the sandboxed calculator.

pub mod calculator;

pub use calculator::{ALLOWED_CHARS, check_whitelist, evaluate, format_number, is_allowed};

use crate::error::{FlowError, Result};

/// Name the planner assigns to the calculator tool
pub const CALCULATOR: &str = "calculator";

/// Run the named tool against its input
pub fn execute(tool_name: &str, tool_input: &str) -> Result<f64> {
    match tool_name {
        CALCULATOR => calculator::evaluate(tool_input),
        other => Err(FlowError::Planning(format!("No valid tool selected: {}", other))),
    }
}
