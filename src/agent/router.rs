//! Route classification
//!
//! The model answers in free text. Only the first word counts: it is trimmed,
//! stripped of surrounding punctuation or markdown, lowercased and compared
//! with `tool` / `direct`. Anything else routes to `direct`, so a reply such
//! as "NO TOOL" never reaches the calculator.

use super::state::Route;

/// Map a router reply onto a route
pub fn classify(reply: &str) -> Route {
    match first_word(reply).as_str() {
        "tool" => Route::Tool,
        _ => Route::Direct,
    }
}

/// Whether the reply matched a label exactly, rather than defaulting
pub fn is_recognized(reply: &str) -> bool {
    matches!(first_word(reply).as_str(), "tool" | "direct")
}

fn first_word(reply: &str) -> String {
    reply
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
