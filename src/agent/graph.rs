//! The decision graph
//!
//! ```text
//! ROUTE --tool--> PLAN --ok--> EXECUTE --> VALIDATE --> END
//!                   \--failure---------------^
//! ROUTE --direct--> DIRECT_ANSWER --> END
//! ```
//!
//! Every node is visited at most once per turn. Tool-path failures become the
//! state's `error` field and end in the fallback answer; only failures at the
//! model boundary abort the turn.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use super::planner::{self, PlannerStrategy, ToolPlan};
use super::router;
use super::state::{AgentState, FALLBACK_ANSWER, Route};
use super::trace::{Trace, TurnOutcome};
use crate::error::{FlowError, Result};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::PromptRenderer;
use crate::tools::{self, format_number};

/// Graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Route,
    Plan,
    Execute,
    Validate,
    DirectAnswer,
    End,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Route => "route",
            Node::Plan => "plan",
            Node::Execute => "execute",
            Node::Validate => "validate",
            Node::DirectAnswer => "direct_answer",
            Node::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// Agent running the route / plan / execute / validate graph over one LLM client
pub struct FlowAgent {
    client: Arc<dyn LlmClient>,
    prompts: PromptRenderer,
    planner: PlannerStrategy,
}

impl FlowAgent {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            prompts: PromptRenderer::new(),
            planner: PlannerStrategy::default(),
        }
    }

    pub fn with_planner(mut self, planner: PlannerStrategy) -> Self {
        self.planner = planner;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Run one turn from START to END
    pub async fn run(&self, input: &str) -> Result<TurnOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FlowError::InvalidState("input must not be empty".to_string()));
        }

        let mut state = AgentState::new(input);
        let mut trace = Trace::new();
        let mut node = Node::Route;

        while node != Node::End {
            debug!("Entering node {}", node);
            node = self.step(node, &mut state, &mut trace).await?;
        }

        state.check_invariants()?;
        info!(
            "Turn finished: route={} nodes={}",
            state.route().map(|r| r.to_string()).unwrap_or_default(),
            trace.len()
        );

        Ok(TurnOutcome { state, trace })
    }

    async fn step(&self, node: Node, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        match node {
            Node::Route => self.route_node(state, trace).await,
            Node::Plan => self.plan_node(state, trace).await,
            Node::Execute => self.execute_node(state, trace),
            Node::Validate => self.validate_node(state, trace),
            Node::DirectAnswer => self.direct_answer_node(state, trace).await,
            Node::End => Ok(Node::End),
        }
    }

    async fn route_node(&self, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        let prompt = self.prompts.router(state.input())?;
        let reply = self.client.complete(CompletionRequest::prompt(prompt)).await?;

        let route = router::classify(&reply.content);
        if !router::is_recognized(&reply.content) {
            warn!("Unrecognized router reply {:?}, defaulting to {}", reply.content.trim(), route);
        }
        state.set_route(route)?;
        trace.record(Node::Route, format!("reply={:?} route={}", reply.content.trim(), route));

        Ok(match route {
            Route::Tool => Node::Plan,
            Route::Direct => Node::DirectAnswer,
        })
    }

    async fn plan_node(&self, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        match self.plan(state.input()).await {
            Ok(plan) => {
                trace.record(
                    Node::Plan,
                    format!("tool_name={} tool_input={:?}", plan.tool_name, plan.tool_input),
                );
                state.set_plan(plan.tool_name, plan.tool_input)?;
                Ok(Node::Execute)
            }
            Err(e) if e.is_tool_failure() => {
                warn!("Planning failed: {}", e);
                trace.record(Node::Plan, format!("error={}", e));
                state.record_error(e.to_string());
                Ok(Node::Validate)
            }
            Err(e) => Err(e),
        }
    }

    async fn plan(&self, input: &str) -> Result<ToolPlan> {
        match self.planner {
            PlannerStrategy::Extract => planner::extract_expression(input),
            PlannerStrategy::Model => {
                let prompt = self.prompts.planner(input)?;
                let reply = self.client.complete(CompletionRequest::prompt(prompt)).await?;
                planner::parse_plan(&reply.content)
            }
        }
    }

    fn execute_node(&self, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        let (tool_name, tool_input) = match (state.tool_name(), state.tool_input()) {
            (Some(name), Some(input)) => (name.to_string(), input.to_string()),
            _ => {
                return Err(FlowError::InvalidState(
                    "execute reached without a tool plan".to_string(),
                ));
            }
        };

        match tools::execute(&tool_name, &tool_input) {
            Ok(value) => {
                trace.record(Node::Execute, format!("tool_result={}", format_number(value)));
                state.record_result(value);
            }
            Err(e) if e.is_tool_failure() => {
                warn!("Tool {} failed on {:?}: {}", tool_name, tool_input, e);
                trace.record(Node::Execute, format!("error={}", e));
                state.record_error(format!("Tool failed: {}", e));
            }
            Err(e) => return Err(e),
        }

        Ok(Node::Validate)
    }

    fn validate_node(&self, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        let answer = match (state.error(), state.tool_result()) {
            (Some(_), _) => FALLBACK_ANSWER.to_string(),
            (None, Some(value)) => format!("The result is {}.", format_number(value)),
            (None, None) => {
                return Err(FlowError::InvalidState(
                    "validate reached without a result or an error".to_string(),
                ));
            }
        };

        trace.record(
            Node::Validate,
            if state.error().is_some() { "fallback" } else { "ok" },
        );
        state.set_final_answer(answer)?;
        Ok(Node::End)
    }

    async fn direct_answer_node(&self, state: &mut AgentState, trace: &mut Trace) -> Result<Node> {
        let request = CompletionRequest::new(self.prompts.direct_system()).with_user_message(state.input());
        let reply = self.client.complete(request).await?;

        // surrounding whitespace only; the text itself is passed through untouched
        let answer = reply.content.trim().to_string();
        trace.record(Node::DirectAnswer, format!("{} chars", answer.chars().count()));
        state.set_final_answer(answer)?;
        Ok(Node::End)
    }
}
