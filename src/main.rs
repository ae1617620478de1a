use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use flowagent::agent::FlowAgent;
use flowagent::console::{self, ConsoleOptions};
use flowagent::llm::OllamaClient;
use flowagent::tools;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flowagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("flowagent.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_agent(config: &Config) -> Result<FlowAgent> {
    let client = OllamaClient::new(config.llm.to_ollama()).context("Failed to create model client")?;
    Ok(FlowAgent::new(Arc::new(client)).with_planner(config.agent.planner))
}

fn console_options(cli: &Cli, config: &Config) -> ConsoleOptions {
    let mut options = config.console.to_options(cli.json);
    if cli.no_trace {
        options.show_trace = false;
    }
    options
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!(
            "{}",
            format!(
                "Model {} at {} (planner: {:?})",
                config.llm.model, config.llm.endpoint, config.agent.planner
            )
            .yellow()
        );
    }

    match &cli.command {
        None => run_console(cli, config).await,
        Some(Commands::Ask { input }) => handle_ask_command(input, cli, config).await,
        Some(Commands::Calc { expression }) => handle_calc_command(expression),
    }
}

async fn run_console(cli: &Cli, config: &Config) -> Result<()> {
    info!("Launching console");
    let agent = build_agent(config)?;
    let options = console_options(cli, config);

    let quit = options.exit_commands.first().map(String::as_str).unwrap_or("Ctrl-D");
    println!(
        "{}",
        format!("Flow agent ({} via {}). Type '{}' to quit.\n", agent.model(), config.llm.endpoint, quit).cyan()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let turns = console::run_repl(&agent, stdin.lock(), &mut stdout, &options).await?;

    info!("Console closed after {} turns", turns);
    Ok(())
}

async fn handle_ask_command(input: &str, cli: &Cli, config: &Config) -> Result<()> {
    info!("Single turn: {}", input);
    let agent = build_agent(config)?;
    let options = console_options(cli, config);

    let mut stdout = io::stdout();
    console::run_turn(&agent, input, &mut stdout, &options).await?;
    Ok(())
}

fn handle_calc_command(expression: &str) -> Result<()> {
    info!("Calculator only: {}", expression);
    let value = tools::evaluate(expression).context("Calculation failed")?;
    println!("{}", tools::format_number(value));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.apply_overrides(cli.model.as_deref(), cli.endpoint.as_deref());

    // Setup logging once the configured level is known
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
