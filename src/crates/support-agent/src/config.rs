//! Server configuration for support-agent
//!
//! Loads `support-agent.toml` with listen address, checkpoint store and
//! optional chat model settings. Every section has defaults, so an empty
//! file (or no file at all) yields a working in-process configuration.

use llm::{RemoteLlmConfig, DEFAULT_MODEL, OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SUPPORT_AGENT_CONFIG";

/// Environment variable holding the API key when `model.api_key` is unset
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Listen address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Checkpoint store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Threads live only as long as the process
    #[default]
    Memory,
    /// Threads persist in a SQLite file
    Sqlite,
}

/// Checkpoint store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// SQLite database file path
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "data/checkpoints.db".to_string()
}

/// Chat model used to phrase the final reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default)]
    pub enabled: bool,
    /// API key, `${VAR}` references are expanded; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ServerConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ServerConfigError::ReadError)?;
        Self::from_str(&content)
    }

    /// Load configuration from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ServerConfigError> {
        let mut config: Self = toml::from_str(content).map_err(ServerConfigError::ParseError)?;
        config.model.api_key = config.model.api_key.as_deref().map(expand_env_var);
        config.model.base_url = config.model.base_url.as_deref().map(expand_env_var);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or environment
    ///
    /// Searches for config in:
    /// 1. SUPPORT_AGENT_CONFIG environment variable
    /// 2. ./config/support-agent.toml
    /// 3. ./support-agent.toml
    ///
    /// Falls back to defaults when no file exists. `HOST` and `PORT` are
    /// applied on top.
    pub fn load() -> Result<Self, ServerConfigError> {
        let mut config = match Self::locate() {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(config_path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(config_path));
        }

        [
            PathBuf::from("config/support-agent.toml"),
            PathBuf::from("./support-agent.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Apply `HOST` / `PORT` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ServerConfigError::InvalidConfig(format!("PORT must be a valid u16, got '{port}'")))?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ServerConfigError> {
        if self.store.backend == StoreBackend::Sqlite && self.store.path.trim().is_empty() {
            return Err(ServerConfigError::InvalidConfig(
                "store.path is required for the sqlite backend".to_string(),
            ));
        }
        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ServerConfigError::InvalidConfig(format!(
                    "model.temperature must be between 0 and 2, got {temperature}"
                )));
            }
        }
        Ok(())
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ServerConfigError::InvalidConfig(format!("invalid listen address: {e}")))
    }

    /// Chat model client settings, `None` when the model is disabled
    pub fn llm_config(&self) -> Result<Option<RemoteLlmConfig>, ServerConfigError> {
        if !self.model.enabled {
            return Ok(None);
        }

        let base_url = self
            .model
            .base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

        let configured_key = self
            .model
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"));

        let config = match configured_key {
            Some(api_key) => RemoteLlmConfig::new(api_key, base_url, self.model.model.clone()),
            None => RemoteLlmConfig::from_env(API_KEY_ENV, base_url, self.model.model.clone()).map_err(|e| {
                ServerConfigError::InvalidConfig(format!("model is enabled but no API key is set: {e}"))
            })?,
        };

        Ok(Some(config.with_timeout(Duration::from_secs(self.model.timeout_secs))))
    }
}

/// Expand a whole-value `${VAR}` reference; unknown variables are left as-is
fn expand_env_var(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}
