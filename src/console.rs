//! Console front end
//!
//! Reads one line per turn, runs it through the agent and prints the trace
//! block followed by `Assistant: <answer>`.

use std::io::{BufRead, Write};

use colored::*;
use log::{error, info};

use crate::agent::{FlowAgent, TurnOutcome, render_summary};
use crate::error::Result;

/// Answer shown when the model cannot be reached for a turn
pub const MODEL_UNAVAILABLE_ANSWER: &str = "Sorry, the language model is unavailable right now.";

/// Console behaviour
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub prompt: String,
    pub show_trace: bool,
    pub json: bool,
    pub exit_commands: Vec<String>,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            prompt: "You: ".to_string(),
            show_trace: true,
            json: false,
            exit_commands: vec!["exit".to_string(), "quit".to_string()],
        }
    }
}

impl ConsoleOptions {
    pub fn is_exit_command(&self, line: &str) -> bool {
        let line = line.trim();
        self.exit_commands.iter().any(|c| c.eq_ignore_ascii_case(line))
    }
}

/// Read turns until end of input or an exit command; returns the number of turns run
pub async fn run_repl<R, W>(agent: &FlowAgent, reader: R, writer: &mut W, options: &ConsoleOptions) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut turns = 0;
    let mut lines = reader.lines();

    loop {
        write!(writer, "{}", options.prompt)?;
        writer.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(writer)?;
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if options.is_exit_command(input) {
            info!("Exit command received");
            break;
        }

        run_turn(agent, input, writer, options).await?;
        turns += 1;
    }

    Ok(turns)
}

/// Run and print a single turn
///
/// A model failure ends the turn with a generic message instead of an error.
pub async fn run_turn<W: Write>(agent: &FlowAgent, input: &str, writer: &mut W, options: &ConsoleOptions) -> Result<()> {
    match agent.run(input).await {
        Ok(outcome) => {
            let rendered = render_turn(&outcome, options)?;
            writeln!(writer, "{}", rendered)?;
        }
        Err(e) if e.is_model_failure() => {
            error!("Turn aborted: {}", e);
            writeln!(writer, "\n{} {}\n", "Assistant:".green().bold(), MODEL_UNAVAILABLE_ANSWER)?;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Render a finished turn for the console
pub fn render_turn(outcome: &TurnOutcome, options: &ConsoleOptions) -> Result<String> {
    if options.json {
        return Ok(serde_json::to_string_pretty(outcome)?);
    }

    let mut out = String::new();
    if options.show_trace {
        out.push('\n');
        out.push_str(&render_summary(&outcome.state));
        out.push('\n');
    }
    out.push_str(&format!("\n{} {}\n", "Assistant:".green().bold(), outcome.answer()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use std::io::Cursor;
    use std::sync::Arc;

    fn output_of(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_exit_commands_case_insensitive() {
        let options = ConsoleOptions::default();
        assert!(options.is_exit_command("exit"));
        assert!(options.is_exit_command("  QUIT "));
        assert!(!options.is_exit_command("exit now"));
    }

    #[tokio::test]
    async fn test_repl_runs_until_exit() {
        let mock = Arc::new(MockLlmClient::with_replies(["TOOL"]));
        let agent = FlowAgent::new(mock.clone());
        let input = Cursor::new("12 * 5 + 3\n\nexit\n2 + 2\n");
        let mut out = Vec::new();

        let turns = run_repl(&agent, input, &mut out, &ConsoleOptions::default()).await.unwrap();
        let text = output_of(out);

        assert_eq!(turns, 1);
        assert_eq!(mock.call_count(), 1);
        assert!(text.contains("You: "));
        assert!(text.contains("route: tool"));
        assert!(text.contains("tool_result: 63"));
        assert!(text.contains("Assistant:"));
        assert!(text.contains("The result is 63."));
    }

    #[tokio::test]
    async fn test_repl_stops_at_end_of_input() {
        let mock = Arc::new(MockLlmClient::with_replies(["DIRECT", "Paris."]));
        let agent = FlowAgent::new(mock);
        let mut out = Vec::new();

        let turns = run_repl(&agent, Cursor::new("capital of France?"), &mut out, &ConsoleOptions::default())
            .await
            .unwrap();

        assert_eq!(turns, 1);
        assert!(output_of(out).contains("Paris."));
    }

    #[tokio::test]
    async fn test_model_failure_keeps_repl_alive() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_unavailable("connection refused");
        mock.push_text("TOOL");
        let agent = FlowAgent::new(mock);
        let mut out = Vec::new();

        let turns = run_repl(&agent, Cursor::new("1 + 1\n2 + 2\n"), &mut out, &ConsoleOptions::default())
            .await
            .unwrap();
        let text = output_of(out);

        assert_eq!(turns, 2);
        assert!(text.contains(MODEL_UNAVAILABLE_ANSWER));
        assert!(!text.contains("connection refused"));
        assert!(text.contains("The result is 4."));
    }

    #[tokio::test]
    async fn test_fallback_hides_raw_error() {
        let mock = Arc::new(MockLlmClient::with_replies(["TOOL"]));
        let agent = FlowAgent::new(mock);
        let options = ConsoleOptions {
            show_trace: false,
            ..Default::default()
        };
        let mut out = Vec::new();

        run_turn(&agent, "10 / 0", &mut out, &options).await.unwrap();
        let text = output_of(out);

        assert!(text.contains("Sorry, I couldn't complete that calculation."));
        assert!(!text.contains("Division by zero"));
        assert!(!text.contains("--- TRACE ---"));
    }

    #[tokio::test]
    async fn test_json_output() {
        let mock = Arc::new(MockLlmClient::with_replies(["TOOL"]));
        let agent = FlowAgent::new(mock);
        let outcome = agent.run("7 / 2").await.unwrap();
        let options = ConsoleOptions {
            json: true,
            ..Default::default()
        };

        let rendered = render_turn(&outcome, &options).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["state"]["route"], "tool");
        assert_eq!(value["state"]["tool_result"], 3.5);
        assert_eq!(value["state"]["final_answer"], "The result is 3.5.");
        assert_eq!(value["trace"]["events"].as_array().unwrap().len(), 4);
    }
}
