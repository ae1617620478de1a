//! Tool planning
//!
//! Turns the user's text into a call to the calculator, either by pulling the
//! arithmetic straight out of the input or by asking the model for a JSON plan.

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::tools::{CALCULATOR, is_allowed};

/// How the planner finds the tool input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerStrategy {
    /// Take the arithmetic substring of the input, no model call
    #[default]
    Extract,
    /// Ask the model for `{"tool_name": ..., "tool_input": ...}`
    Model,
}

/// A planned tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPlan {
    pub tool_name: String,
    pub tool_input: String,
}

impl ToolPlan {
    pub fn calculator(tool_input: impl Into<String>) -> Self {
        Self {
            tool_name: CALCULATOR.to_string(),
            tool_input: tool_input.into(),
        }
    }
}

/// Punctuation that may wrap a number or expression inside a sentence
const SENTENCE_PUNCTUATION: &[char] = &['?', '!', ',', ';', ':', '"', '\'', '='];

/// How one whitespace-separated word of the input takes part in planning
#[derive(Debug, Clone, Copy, PartialEq)]
enum Word<'a> {
    /// Only calculator characters; `closes` is set when sentence punctuation followed it
    Arithmetic { text: &'a str, closes: bool },
    /// Plain words such as "what" or "please"
    Prose(&'a str),
    /// Bare punctuation
    Gap,
    /// Anything else, e.g. `2^3`, `1e3` or a lone `%`
    Mixed,
}

fn classify_word(word: &str) -> Word<'_> {
    let core = word.trim_matches(SENTENCE_PUNCTUATION);
    if core.is_empty() {
        return Word::Gap;
    }
    if core.chars().all(is_allowed) {
        let closes = word.ends_with(SENTENCE_PUNCTUATION);
        return Word::Arithmetic { text: core, closes };
    }
    let prose = core.chars().any(char::is_alphabetic)
        && core.chars().all(|c| c.is_alphabetic() || matches!(c, '\'' | '.' | '-'));
    if prose { Word::Prose(core) } else { Word::Mixed }
}

/// Pull the arithmetic expression out of free text
///
/// Input made entirely of calculator characters is used whole. Otherwise the
/// input is read word by word and runs of arithmetic words that contain a
/// digit are candidates; runs with an operator win over bare numbers, then
/// longer runs win. A word that mixes calculator characters with anything
/// else, or an `x` between two numbers, sends the whole input to the
/// calculator so that it is rejected there instead of being cut down to a
/// different expression.
pub fn extract_expression(input: &str) -> Result<ToolPlan> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FlowError::Planning("input is empty".to_string()));
    }

    if trimmed.chars().all(is_allowed) {
        return Ok(ToolPlan::calculator(trimmed));
    }

    let words: Vec<Word> = trimmed.split_whitespace().map(classify_word).collect();
    if words.iter().enumerate().any(|(i, word)| is_unsupported(&words, i, word)) {
        return Ok(ToolPlan::calculator(trimmed));
    }

    let mut runs: Vec<Vec<&str>> = vec![Vec::new()];
    for word in &words {
        match word {
            Word::Arithmetic { text, closes } => {
                if let Some(run) = runs.last_mut() {
                    run.push(*text);
                }
                if *closes {
                    runs.push(Vec::new());
                }
            }
            _ => runs.push(Vec::new()),
        }
    }

    runs.into_iter()
        .map(|run| run.join(" "))
        .filter(|run| run.chars().any(|c| c.is_ascii_digit()))
        .enumerate()
        .max_by_key(|(index, run)| {
            let has_operator = run.chars().any(|c| matches!(c, '+' | '-' | '*' | '/'));
            (has_operator, run.len(), std::cmp::Reverse(*index))
        })
        .map(|(_, run)| ToolPlan::calculator(run))
        .ok_or_else(|| FlowError::Planning("no arithmetic expression found in input".to_string()))
}

fn is_unsupported(words: &[Word], index: usize, word: &Word) -> bool {
    match word {
        Word::Mixed => true,
        Word::Prose(text) if text.eq_ignore_ascii_case("x") => {
            let is_arithmetic = |w: Option<&Word>| matches!(w, Some(Word::Arithmetic { .. }));
            index > 0 && is_arithmetic(words.get(index - 1)) && is_arithmetic(words.get(index + 1))
        }
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: String,
}

/// Parse the model's JSON plan, tolerating code fences and surrounding prose
pub fn parse_plan(raw: &str) -> Result<ToolPlan> {
    let body = json_object(raw)
        .ok_or_else(|| FlowError::Planning(format!("Failed to parse JSON plan: {}", raw.trim())))?;

    let plan: RawPlan = serde_json::from_str(body)
        .map_err(|e| FlowError::Planning(format!("Failed to parse JSON plan: {} ({})", raw.trim(), e)))?;

    if plan.tool_name != CALCULATOR {
        return Err(FlowError::Planning(format!(
            "No valid tool selected: {}",
            if plan.tool_name.is_empty() { "none" } else { plan.tool_name.as_str() }
        )));
    }

    let tool_input = plan.tool_input.trim();
    if tool_input.is_empty() {
        return Err(FlowError::Planning("planner returned an empty tool input".to_string()));
    }

    Ok(ToolPlan::calculator(tool_input))
}

fn json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}
