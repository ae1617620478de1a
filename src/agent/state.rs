//! Per-turn agent state
//!
//! One `AgentState` is created for each user input, mutated by each node in
//! turn, and dropped once the turn has been printed. Setters enforce the
//! set-once fields so a node cannot silently overwrite an earlier decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Fixed answer shown when the tool path fails
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't complete that calculation.";

/// Classification made once per input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Tool,
    Direct,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Tool => write!(f, "tool"),
            Route::Direct => write!(f, "direct"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentState {
    input: String,
    route: Option<Route>,
    tool_name: Option<String>,
    tool_input: Option<String>,
    tool_result: Option<f64>,
    error: Option<String>,
    final_answer: Option<String>,
}

impl AgentState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            route: None,
            tool_name: None,
            tool_input: None,
            tool_result: None,
            error: None,
            final_answer: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn route(&self) -> Option<Route> {
        self.route
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn tool_input(&self) -> Option<&str> {
        self.tool_input.as_deref()
    }

    pub fn tool_result(&self) -> Option<f64> {
        self.tool_result
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// Record the routing decision; may only happen once
    pub fn set_route(&mut self, route: Route) -> Result<()> {
        if let Some(existing) = self.route {
            return Err(FlowError::InvalidState(format!(
                "route already set to {}",
                existing
            )));
        }
        self.route = Some(route);
        Ok(())
    }

    /// Record the planned tool call; only valid on the tool route
    pub fn set_plan(&mut self, tool_name: impl Into<String>, tool_input: impl Into<String>) -> Result<()> {
        if self.route != Some(Route::Tool) {
            return Err(FlowError::InvalidState(
                "tool plan recorded outside the tool route".to_string(),
            ));
        }
        self.tool_name = Some(tool_name.into());
        self.tool_input = Some(tool_input.into());
        Ok(())
    }

    /// Successful tool execution clears any previous error
    pub fn record_result(&mut self, value: f64) {
        self.tool_result = Some(value);
        self.error = None;
    }

    /// Failed planning or execution leaves no result behind
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.tool_result = None;
        self.error = Some(message.into());
    }

    /// Set the user-facing answer; may only happen once
    pub fn set_final_answer(&mut self, answer: impl Into<String>) -> Result<()> {
        if self.final_answer.is_some() {
            return Err(FlowError::InvalidState("final answer already set".to_string()));
        }
        self.final_answer = Some(answer.into());
        Ok(())
    }

    /// Check the field-presence rules that hold at the end of a turn
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |msg: &str| Err(FlowError::InvalidState(msg.to_string()));

        if self.final_answer.is_none() {
            return violation("turn ended without a final answer");
        }

        match self.route {
            None => violation("turn ended without a route"),
            Some(Route::Direct) => {
                if self.tool_name.is_some()
                    || self.tool_input.is_some()
                    || self.tool_result.is_some()
                    || self.error.is_some()
                {
                    return violation("direct route carries tool fields");
                }
                Ok(())
            }
            Some(Route::Tool) => match (&self.tool_result, &self.error) {
                (Some(_), None) => Ok(()),
                (None, Some(_)) if self.final_answer.as_deref() == Some(FALLBACK_ANSWER) => Ok(()),
                (None, Some(_)) => violation("failed tool route must answer with the fallback"),
                (Some(_), Some(_)) => violation("tool route has both a result and an error"),
                (None, None) => violation("tool route has neither a result nor an error"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = AgentState::new("12 * 5 + 3");
        assert_eq!(state.input(), "12 * 5 + 3");
        assert!(state.route().is_none());
        assert!(state.tool_name().is_none());
        assert!(state.final_answer().is_none());
    }

    #[test]
    fn test_route_is_set_once() {
        let mut state = AgentState::new("hi");
        state.set_route(Route::Direct).unwrap();
        let err = state.set_route(Route::Tool).unwrap_err();
        assert!(matches!(err, FlowError::InvalidState(_)));
        assert_eq!(state.route(), Some(Route::Direct));
    }

    #[test]
    fn test_final_answer_is_set_once() {
        let mut state = AgentState::new("hi");
        state.set_final_answer("first").unwrap();
        assert!(state.set_final_answer("second").is_err());
        assert_eq!(state.final_answer(), Some("first"));
    }

    #[test]
    fn test_plan_requires_tool_route() {
        let mut state = AgentState::new("hi");
        assert!(state.set_plan("calculator", "1 + 1").is_err());

        state.set_route(Route::Direct).unwrap();
        assert!(state.set_plan("calculator", "1 + 1").is_err());
        assert!(state.tool_name().is_none());
    }

    #[test]
    fn test_result_and_error_are_exclusive() {
        let mut state = AgentState::new("1 / 0");
        state.record_error("Division by zero");
        state.record_result(2.0);
        assert_eq!(state.tool_result(), Some(2.0));
        assert!(state.error().is_none());

        state.record_error("boom");
        assert!(state.tool_result().is_none());
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_invariants_direct() {
        let mut state = AgentState::new("capital of France?");
        state.set_route(Route::Direct).unwrap();
        state.set_final_answer("Paris.").unwrap();
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_tool_success() {
        let mut state = AgentState::new("2 + 2");
        state.set_route(Route::Tool).unwrap();
        state.set_plan("calculator", "2 + 2").unwrap();
        state.record_result(4.0);
        state.set_final_answer("The result is 4.").unwrap();
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_tool_failure_needs_fallback() {
        let mut state = AgentState::new("10 / 0");
        state.set_route(Route::Tool).unwrap();
        state.record_error("Division by zero");
        state.set_final_answer("Division by zero").unwrap();
        assert!(state.check_invariants().is_err());

        let mut state = AgentState::new("10 / 0");
        state.set_route(Route::Tool).unwrap();
        state.record_error("Division by zero");
        state.set_final_answer(FALLBACK_ANSWER).unwrap();
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_incomplete_turn() {
        let mut state = AgentState::new("hi");
        assert!(state.check_invariants().is_err());
        state.set_route(Route::Tool).unwrap();
        state.set_final_answer("done").unwrap();
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_route_serialization() {
        assert_eq!(serde_json::to_string(&Route::Tool).unwrap(), "\"tool\"");
        assert_eq!(Route::Direct.to_string(), "direct");
    }
}
