//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - (none): interactive console
//! - ask: run a single turn
//! - calc: evaluate an expression without the model

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flowagent - route questions between a local model and a safe calculator
#[derive(Parser, Debug)]
#[command(name = "flowagent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model name, overrides the config file
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Model server URL, overrides the config file and OLLAMA_HOST
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Hide the trace block printed before each answer
    #[arg(long, global = true)]
    pub no_trace: bool,

    /// Print each turn as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single turn and exit
    Ask {
        /// Question or arithmetic for the agent
        input: String,
    },

    /// Evaluate an arithmetic expression with the calculator only
    Calc {
        /// Expression using numbers, parentheses and + - * /
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args runs the interactive console
        let cli = Cli::try_parse_from(["flowagent"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.no_trace);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["flowagent", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["flowagent", "-c", "/path/to/flowagent.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/flowagent.yml")));
    }

    #[test]
    fn test_model_and_endpoint_overrides() {
        let cli = Cli::try_parse_from([
            "flowagent",
            "--model",
            "mistral",
            "--endpoint",
            "http://gpu-box:11434",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("mistral"));
        assert_eq!(cli.endpoint.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::try_parse_from(["flowagent", "ask", "12 * 5 + 3", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Ask { input }) => assert_eq!(input, "12 * 5 + 3"),
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_calc_command() {
        let cli = Cli::try_parse_from(["flowagent", "calc", "(1 + 2) * 3"]).unwrap();
        match cli.command {
            Some(Commands::Calc { expression }) => assert_eq!(expression, "(1 + 2) * 3"),
            _ => panic!("Expected calc command"),
        }
    }

    #[test]
    fn test_calc_negative_expression() {
        let cli = Cli::try_parse_from(["flowagent", "calc", "-5 + 2"]).unwrap();
        match cli.command {
            Some(Commands::Calc { expression }) => assert_eq!(expression, "-5 + 2"),
            _ => panic!("Expected calc command"),
        }
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["flowagent", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
