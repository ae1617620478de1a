//! Turn trace recording and rendering

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::graph::Node;
use super::state::AgentState;
use crate::tools::format_number;

/// One node visit
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub node: Node,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// Ordered record of the nodes visited during one turn
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: Node, detail: impl Into<String>) {
        self.events.push(TraceEvent {
            node,
            detail: detail.into(),
            at: Utc::now(),
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Nodes in visiting order
    pub fn nodes(&self) -> Vec<Node> {
        self.events.iter().map(|e| e.node).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Everything produced by one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub state: AgentState,
    pub trace: Trace,
}

impl TurnOutcome {
    /// The answer shown to the user
    pub fn answer(&self) -> &str {
        self.state.final_answer().unwrap_or_default()
    }
}

/// Render the state block printed before each answer
pub fn render_summary(state: &AgentState) -> String {
    fn show(value: Option<&str>) -> &str {
        value.unwrap_or("none")
    }

    let route = state.route().map(|r| r.to_string());
    let tool_result = state.tool_result().map(format_number);

    [
        "--- TRACE ---".to_string(),
        format!("route: {}", show(route.as_deref())),
        format!("tool_name: {}", show(state.tool_name())),
        format!("tool_input: {}", show(state.tool_input())),
        format!("tool_result: {}", show(tool_result.as_deref())),
        format!("error: {}", show(state.error())),
        "-------------".to_string(),
    ]
    .join("\n")
}
