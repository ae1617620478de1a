//! Built-in prompt templates

/// Classification prompt; the reply is normalized by the router
pub const ROUTER: &str = "You are a router.
If the user asks to calculate something or do arithmetic -> TOOL.
Otherwise -> DIRECT.
User: {{input}}
Return only: TOOL or DIRECT.";

/// Planner prompt asking for a JSON tool plan
pub const PLANNER: &str = r#"You are a planner.
If the user asks for arithmetic, choose calculator and extract the expression.
Otherwise choose none.
Return ONLY valid JSON. No extra text.
Schema: {"tool_name":"calculator"|"none","tool_input":"..."}
Example: User:"12*7 + 5" -> {"tool_name":"calculator","tool_input":"12*7 + 5"}
Example: User:"Explain tool calling" -> {"tool_name":"none","tool_input":""}
User:"{{input}}""#;

/// System prompt for the direct-answer path
pub const DIRECT_SYSTEM: &str = "Answer clearly and practically.";
