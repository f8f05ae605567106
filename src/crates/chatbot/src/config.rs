//! Chatbot configuration
//!
//! Optional `chatbot.toml`, looked up in this order:
//!
//! 1. the path given with `--config`
//! 2. `./chatbot.toml`
//! 3. `~/.chatbot/chatbot.toml`
//!
//! Command-line flags are applied on top by the binary.

use llm::{RemoteLlmConfig, DEFAULT_MODEL, OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::blog::DEFAULT_WORD_COUNT;
use crate::error::{ChatbotError, Result};

/// Chat model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// `${VAR}` references are expanded; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

/// Where conversations are saved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    #[serde(default = "default_conversations_dir")]
    pub conversations_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            conversations_dir: default_conversations_dir(),
        }
    }
}

fn default_conversations_dir() -> PathBuf {
    PathBuf::from("conversations")
}

/// Blog mode settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogSettings {
    #[serde(default = "default_word_count")]
    pub word_count: usize,
    /// Seed research with a web search
    #[serde(default = "default_true")]
    pub search: bool,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            word_count: default_word_count(),
            search: true,
        }
    }
}

fn default_word_count() -> usize {
    DEFAULT_WORD_COUNT
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatbotConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub blog: BlogSettings,
}

impl ChatbotConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatbotError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ChatbotError::Config(format!("failed to parse TOML: {e}")))?;
        config.model.api_key = config.model.api_key.as_deref().map(expand_env_var);
        config.model.base_url = config.model.base_url.as_deref().map(expand_env_var);
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first config file found, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::locate() {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn locate() -> Option<PathBuf> {
        let mut candidates = vec![PathBuf::from("chatbot.toml")];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".chatbot").join("chatbot.toml"));
        }
        candidates.into_iter().find(|path| path.exists())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ChatbotError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.model.temperature
            )));
        }
        if self.model.model.trim().is_empty() {
            return Err(ChatbotError::Config("model name must not be empty".into()));
        }
        if self.blog.word_count == 0 {
            return Err(ChatbotError::Config("blog word_count must be positive".into()));
        }
        Ok(())
    }

    /// Provider settings, with `OPENAI_API_KEY` / `OPENAI_BASE_URL` as fallbacks
    pub fn llm_config(&self) -> Result<RemoteLlmConfig> {
        self.llm_config_with(|key| std::env::var(key).ok())
    }

    fn llm_config_with<F>(&self, lookup: F) -> Result<RemoteLlmConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = self
            .model
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
            .or_else(|| lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                ChatbotError::Config("no API key: set OPENAI_API_KEY or pass --api-key".into())
            })?;
        let base_url = self
            .model
            .base_url
            .clone()
            .or_else(|| lookup("OPENAI_BASE_URL"))
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

        Ok(RemoteLlmConfig::new(api_key, base_url, self.model.model.clone())
            .with_timeout(Duration::from_secs(self.model.timeout_secs)))
    }
}

fn expand_env_var(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatbotConfig::from_str("").unwrap();
        assert_eq!(config.model.model, "gpt-3.5-turbo");
        assert_eq!(config.model.temperature, 0.7);
        assert_eq!(config.storage.conversations_dir, PathBuf::from("conversations"));
        assert_eq!(config.blog.word_count, 300);
        assert!(config.blog.search);
    }

    #[test]
    fn test_parsing() {
        let config = ChatbotConfig::from_str(
            r#"
[model]
model = "gpt-4o"
temperature = 0.2
base_url = "http://localhost:8080/v1"

[storage]
conversations_dir = "/tmp/chats"

[blog]
word_count = 500
search = false
"#,
        )
        .unwrap();

        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.storage.conversations_dir, PathBuf::from("/tmp/chats"));
        assert_eq!(config.blog.word_count, 500);
        assert!(!config.blog.search);
    }

    #[test]
    fn test_validation() {
        assert!(ChatbotConfig::from_str("[model]\ntemperature = 3.0").is_err());
        assert!(ChatbotConfig::from_str("[model]\nmodel = \" \"").is_err());
        assert!(ChatbotConfig::from_str("[blog]\nword_count = 0").is_err());
        assert!(matches!(
            ChatbotConfig::from_str("[model"),
            Err(ChatbotError::Config(_))
        ));
    }

    #[test]
    fn test_llm_config_fallbacks() {
        let config = ChatbotConfig::default();
        assert!(config.llm_config_with(|_| None).is_err());

        let llm = config
            .llm_config_with(|key| match key {
                "OPENAI_API_KEY" => Some("sk-env".into()),
                "OPENAI_BASE_URL" => Some("http://proxy/v1/".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(llm.api_key, "sk-env");
        assert_eq!(llm.base_url, "http://proxy/v1");
        assert_eq!(llm.model, "gpt-3.5-turbo");

        let mut config = ChatbotConfig::default();
        config.model.api_key = Some("sk-file".into());
        let llm = config.llm_config_with(|_| Some("sk-env".into())).unwrap();
        assert_eq!(llm.api_key, "sk-file");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatbot.toml");
        std::fs::write(&path, "[model]\nmodel = \"local-model\"\n").unwrap();

        let config = ChatbotConfig::load(Some(&path)).unwrap();
        assert_eq!(config.model.model, "local-model");
        assert!(ChatbotConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
