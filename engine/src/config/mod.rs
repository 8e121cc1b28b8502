//! Configuration management
//!
//! This module handles loading, validation, and management of the Mentor configuration.
//! Configuration is stored in TOML format at ~/.mentor/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: Provider selection, endpoints and per-stage temperatures
//! - **memory**: Persistent store location and history windows
//! - **tools**: Notes directory and auxiliary tool switches
//!
//! # Environment Overrides
//!
//! After the file is parsed, `LITELLM_BASE_URL` replaces the OpenAI-compatible
//! endpoint and `MODEL_NAME` replaces the model of the selected provider.
//! The API key itself is never stored in the file; `llm.openai.api_key_env`
//! names the variable it is read from.
//!
//! # Examples
//!
//! ```no_run
//! use mentor_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.llm.provider);
//! println!("Memory file: {:?}", config.memory_path());
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Providers the factory knows how to build
pub const VALID_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Upper bound on persisted history turns
pub const MAX_HISTORY_LIMIT: usize = 50;

/// Upper bound on working history turns after an update
pub const MAX_SESSION_WINDOW: usize = 10;

/// Upper bound on persisted turns seeded into a fresh run
pub const MAX_LOAD_WINDOW: usize = 2;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Persistent memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Auxiliary tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used by the router and every specialist (openai, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI-compatible endpoint (OpenAI, LiteLLM, vLLM gateways)
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Sampling temperature per stage
    #[serde(default)]
    pub temperatures: Temperatures,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL, without the trailing `/chat/completions`
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
}

/// Sampling temperature for each generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    #[serde(default)]
    pub router: f32,

    #[serde(default = "default_theory_temperature")]
    pub theory: f32,

    #[serde(default = "default_coding_temperature")]
    pub coding: f32,

    #[serde(default = "default_planning_temperature")]
    pub planning: f32,

    #[serde(default = "default_general_temperature")]
    pub general: f32,
}

/// Persistent memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Memory file (defaults to `<data_dir>/memory.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Maximum persisted history turns
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum working history turns after an update
    #[serde(default = "default_session_window")]
    pub session_window: usize,

    /// Persisted turns seeded into the working history on load
    #[serde(default = "default_load_window")]
    pub load_window: usize,

    /// Working history turns rendered into a prompt
    #[serde(default = "default_prompt_window")]
    pub prompt_window: usize,
}

/// Auxiliary tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Markdown notes directory (defaults to `<data_dir>/notes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_dir: Option<PathBuf>,

    /// Maximum notes returned by retrieval
    #[serde(default = "default_max_note_results")]
    pub max_note_results: usize,

    /// Persist theory answers as markdown notes
    #[serde(default = "default_true")]
    pub save_theory_notes: bool,

    /// Run code analysis on coding answers
    #[serde(default = "default_true")]
    pub analyze_code: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.mentor")
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_openai_base_url() -> String {
    "http://localhost:4000/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "LITELLM_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_ollama_timeout() -> u64 {
    120
}

fn default_theory_temperature() -> f32 {
    0.3
}

fn default_coding_temperature() -> f32 {
    0.2
}

fn default_planning_temperature() -> f32 {
    0.4
}

fn default_general_temperature() -> f32 {
    0.3
}

fn default_history_limit() -> usize {
    MAX_HISTORY_LIMIT
}

fn default_session_window() -> usize {
    MAX_SESSION_WINDOW
}

fn default_load_window() -> usize {
    MAX_LOAD_WINDOW
}

fn default_prompt_window() -> usize {
    5
}

fn default_max_note_results() -> usize {
    2
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
            temperatures: Temperatures::default(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            timeout_secs: default_ollama_timeout(),
        }
    }
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            router: 0.0,
            theory: default_theory_temperature(),
            coding: default_coding_temperature(),
            planning: default_planning_temperature(),
            general: default_general_temperature(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            history_limit: default_history_limit(),
            session_window: default_session_window(),
            load_window: default_load_window(),
            prompt_window: default_prompt_window(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            notes_dir: None,
            max_note_results: default_max_note_results(),
            save_theory_notes: true,
            analyze_code: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.mentor/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Load configuration from `path`, writing defaults there first if absent
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let defaults = Self::default_config();

        // Written before overrides and path resolution so the file stays portable
        let toml_string = toml::to_string_pretty(&defaults)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = defaults;
        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.mentor/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".mentor").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            memory: MemoryConfig::default(),
            tools: ToolsConfig::default(),
        }
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("LITELLM_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.llm.openai.base_url = base_url.trim().to_string();
        }

        if let Some(model) = lookup("MODEL_NAME").filter(|v| !v.trim().is_empty()) {
            let model = model.trim().to_string();
            match self.llm.provider.as_str() {
                "ollama" => self.llm.ollama.model = model,
                _ => self.llm.openai.model = model,
            }
        }
    }

    /// Resolved memory file path
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("memory.json"))
    }

    /// Resolved markdown notes directory
    pub fn notes_dir(&self) -> PathBuf {
        self.tools
            .notes_dir
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("notes"))
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates log level, provider, temperatures and windows
    /// - Expands ~ in paths
    /// - Creates the data directory if it doesn't exist
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid provider '{}'. Must be one of: {}",
                self.llm.provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        let temperatures = self.llm.temperatures;
        for (stage, value) in [
            ("router", temperatures.router),
            ("theory", temperatures.theory),
            ("coding", temperatures.coding),
            ("planning", temperatures.planning),
            ("general", temperatures.general),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "Temperature for '{}' must be between 0.0 and 2.0",
                    stage
                )));
            }
        }

        let memory = &self.memory;
        for (key, value, max) in [
            ("history_limit", memory.history_limit, MAX_HISTORY_LIMIT),
            ("session_window", memory.session_window, MAX_SESSION_WINDOW),
            ("load_window", memory.load_window, MAX_LOAD_WINDOW),
        ] {
            if value > max {
                return Err(EngineError::Config(format!(
                    "memory.{} must be at most {} (got {})",
                    key, max, value
                )));
            }
        }
        if memory.history_limit == 0 {
            return Err(EngineError::Config(
                "memory.history_limit must be at least 1".to_string(),
            ));
        }
        if memory.session_window > memory.history_limit {
            return Err(EngineError::Config(
                "memory.session_window cannot exceed memory.history_limit".to_string(),
            ));
        }
        if memory.load_window > memory.session_window {
            return Err(EngineError::Config(
                "memory.load_window cannot exceed memory.session_window".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(path) = &self.memory.path {
            self.memory.path = Some(expand_path(path)?);
        }
        if let Some(dir) = &self.tools.notes_dir {
            self.tools.notes_dir = Some(expand_path(dir)?);
        }

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }
        self.core.data_dir = self
            .core
            .data_dir
            .canonicalize()
            .map_err(|e| EngineError::PathCanonicalization(self.core.data_dir.clone(), e.to_string()))?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
