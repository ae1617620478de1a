//! Agent - route, plan, execute and validate one user turn

pub mod graph;
pub mod planner;
pub mod router;
pub mod state;
pub mod trace;

pub use graph::{FlowAgent, Node};
pub use planner::{PlannerStrategy, ToolPlan};
pub use state::{AgentState, FALLBACK_ANSWER, Route};
pub use trace::{Trace, TraceEvent, TurnOutcome, render_summary};
