use eyre::{Context, Result};
use flowagent::agent::PlannerStrategy;
use flowagent::console::ConsoleOptions;
use flowagent::llm::OllamaConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.2,
            timeout_ms: 120000,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl LlmConfig {
    pub fn to_ollama(&self) -> OllamaConfig {
        OllamaConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub planner: PlannerStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub prompt: String,
    pub show_trace: bool,
    pub exit_commands: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "You: ".to_string(),
            show_trace: true,
            exit_commands: vec!["exit".to_string(), "quit".to_string()],
        }
    }
}

impl ConsoleConfig {
    pub fn to_options(&self, json: bool) -> ConsoleOptions {
        ConsoleOptions {
            prompt: self.prompt.clone(),
            show_trace: self.show_trace,
            json,
            exit_commands: self.exit_commands.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            agent: AgentConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(std::env::var("OLLAMA_HOST").ok().as_deref());
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply the OLLAMA_HOST convention; a bare host:port gets an http scheme
    pub fn apply_env(&mut self, ollama_host: Option<&str>) {
        if let Some(host) = ollama_host.map(str::trim).filter(|h| !h.is_empty()) {
            self.llm.endpoint = if host.contains("://") {
                host.to_string()
            } else {
                format!("http://{}", host)
            };
            log::info!("Using model endpoint from OLLAMA_HOST: {}", self.llm.endpoint);
        }
    }

    /// Command-line flags win over everything else
    pub fn apply_overrides(&mut self, model: Option<&str>, endpoint: Option<&str>) {
        if let Some(model) = model {
            self.llm.model = model.to_string();
        }
        if let Some(endpoint) = endpoint {
            self.llm.endpoint = endpoint.to_string();
        }
    }
}
