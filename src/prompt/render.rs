//! Prompt Renderer - Render templates with context variables using Handlebars

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use super::templates;
use crate::error::{FlowError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // User text goes into prompts verbatim
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with any serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| FlowError::Template(format!("Failed to render template: {}", e)))
    }

    /// Prompt asking the model to classify `input` as TOOL or DIRECT
    pub fn router(&self, input: &str) -> Result<String> {
        self.render_with(templates::ROUTER, &json!({ "input": input }))
    }

    /// Prompt asking the model for a JSON tool plan for `input`
    pub fn planner(&self, input: &str) -> Result<String> {
        self.render_with(templates::PLANNER, &json!({ "input": input }))
    }

    /// System prompt for direct answers
    pub fn direct_system(&self) -> &'static str {
        templates::DIRECT_SYSTEM
    }
}
