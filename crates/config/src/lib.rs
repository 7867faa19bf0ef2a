//! Configuration loading, validation, and management for calclaw.
//!
//! Loads configuration from `~/.calclaw/config.toml` (or `$CALCLAW_HOME/config.toml`)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variables consulted for the LLM key, in order.
const API_KEY_VARS: [&str; 3] = ["CALCLAW_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"];

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the default provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    4096
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("calendar", &self.calendar)
            .field("history", &self.history)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Google Calendar access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// OAuth client secret downloaded from the cloud console
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,

    /// Authorized-user token written by `calclaw auth`
    #[serde(default = "default_token_file")]
    pub token_file: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Time zone applied to new calendars and events when none is given
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_credentials_file() -> String {
    "credentials.json".into()
}
fn default_token_file() -> String {
    "tokens/token_calendar_v3.json".into()
}
fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}
fn default_timezone() -> String {
    "America/Sao_Paulo".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            token_file: default_token_file(),
            api_base_url: default_api_base_url(),
            default_timezone: default_timezone(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Conversation history persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// "sqlite", "file", or "memory"
    #[serde(default = "default_history_backend")]
    pub backend: String,

    /// Database file (sqlite) or directory (file)
    #[serde(default = "default_history_path")]
    pub path: String,
}

fn default_history_backend() -> String {
    "sqlite".into()
}
fn default_history_path() -> String {
    "history/calclaw.sqlite".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: default_history_backend(),
            path: default_history_path(),
        }
    }
}

/// Agent loop and persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool calls per user turn
    #[serde(default = "default_max_iterations")]
    pub max_tool_iterations: u32,

    /// Offset used for the "current time" line of the system prompt
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    #[serde(default)]
    pub user_name: String,

    /// Free-form notes about the user (working hours, habits, goals)
    #[serde(default)]
    pub user_profile: String,

    /// Replaces the built-in persona when non-empty
    #[serde(default)]
    pub system_prompt_override: String,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_utc_offset() -> i32 {
    -3
}
fn default_assistant_name() -> String {
    "Calendar Assistant".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: default_max_iterations(),
            utc_offset_hours: default_utc_offset(),
            assistant_name: default_assistant_name(),
            user_name: String::new(),
            user_profile: String::new(),
            system_prompt_override: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load `config.toml` from [`AppConfig::config_dir`], then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_dir().join("config.toml"))?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment settings read through `lookup`.
    ///
    /// The first of `CALCLAW_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY` fills
    /// `api_key` only when the file left it unset. `CALCLAW_PROVIDER` and
    /// `CALCLAW_MODEL` always win. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS.iter().find_map(|name| var(name));
        }
        if let Some(provider) = var("CALCLAW_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = var("CALCLAW_MODEL") {
            self.default_model = model;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The configuration directory: `$CALCLAW_HOME` or `~/.calclaw`.
    pub fn config_dir() -> PathBuf {
        match std::env::var("CALCLAW_HOME") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs_home().join(".calclaw"),
        }
    }

    /// Resolve a configured path: absolute paths are kept, relative ones
    /// live under [`AppConfig::config_dir`].
    pub fn resolve_path(path: &str) -> PathBuf {
        resolve_in(&Self::config_dir(), path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_iterations must be at least 1".into(),
            ));
        }

        if !(-12..=14).contains(&self.agent.utc_offset_hours) {
            return Err(ConfigError::ValidationError(
                "agent.utc_offset_hours must be between -12 and 14".into(),
            ));
        }

        if !matches!(self.history.backend.as_str(), "sqlite" | "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "history.backend must be one of sqlite, file, memory (got '{}')",
                self.history.backend
            )));
        }

        if self.calendar.default_timezone.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "calendar.default_timezone must not be empty".into(),
            ));
        }

        if self.calendar.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "calendar.request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            calendar: CalendarConfig::default(),
            history: HistoryConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_in(base: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        base.join(candidate)
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
