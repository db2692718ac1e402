//! Configuration for the pantry agent.
//!
//! Defaults are overlaid with `PANTRY_*` environment variables at startup.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::common::errors::{HomeError, HomeResult};

/// Environment variable for the `SQLite` database path.
pub const DB_PATH_ENV: &str = "PANTRY_DB_PATH";
/// Environment variable for the HTTP port.
pub const PORT_ENV: &str = "PANTRY_PORT";
/// Environment variable for a custom Ollama URL (e.g. "http://127.0.0.1:11434").
pub const OLLAMA_URL_ENV: &str = "PANTRY_OLLAMA_URL";
/// Environment variable for the completion model name.
pub const MODEL_ENV: &str = "PANTRY_MODEL";
/// Environment variable for the sampling temperature.
pub const TEMPERATURE_ENV: &str = "PANTRY_TEMPERATURE";
/// Environment variable for the application display name.
pub const APP_NAME_ENV: &str = "PANTRY_APP_NAME";
/// Environment variable selecting the reply provider (`ollama` or `scripted`).
pub const PROVIDER_ENV: &str = "PANTRY_LLM_PROVIDER";

/// Default system prompt sent with every agent request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "If prompted, tell the user that you're confused and don't quite know who or what you are. \
They should help you understand that better by providing you with a proper system prompt.";

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name used in logs and the health endpoint.
    pub app_name: String,
    /// Storage settings.
    pub storage: StorageConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Home Pantry Agent".to_string(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from defaults and process environment.
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed or the result is invalid.
    pub fn from_env() -> HomeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from defaults and an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> HomeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(APP_NAME_ENV) {
            config.app_name = name;
        }
        if let Some(path) = lookup(DB_PATH_ENV) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.server.port = port
                .parse()
                .map_err(|_| HomeError::InvalidConfig(format!("{PORT_ENV} is not a port: {port}")))?;
        }
        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            config.llm.base_url = Some(url);
        }
        if let Some(model) = lookup(MODEL_ENV) {
            config.llm.model = model;
        }
        if let Some(provider) = lookup(PROVIDER_ENV) {
            config.llm.provider = provider.parse()?;
        }
        if let Some(temperature) = lookup(TEMPERATURE_ENV) {
            config.llm.temperature = temperature.parse().map_err(|_| {
                HomeError::InvalidConfig(format!("{TEMPERATURE_ENV} is not a number: {temperature}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> HomeResult<()> {
        if self.server.port == 0 {
            return Err(HomeError::InvalidConfig("server.port must be > 0".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(HomeError::InvalidConfig(
                "llm.temperature must be within 0.0..=2.0".to_string(),
            ));
        }

        if self.llm.history_window == 0 {
            return Err(HomeError::InvalidConfig(
                "llm.history_window must be > 0".to_string(),
            ));
        }

        if self.llm.provider == LlmProvider::Scripted && self.llm.scripted_replies.is_empty() {
            return Err(HomeError::InvalidConfig(
                "llm.scripted_replies must not be empty".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(HomeError::InvalidConfig("llm.model must not be empty".to_string()));
        }

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("pantry.sqlite"),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Which backend produces agent replies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Ollama completion model through Rig.
    #[default]
    Ollama,
    /// Canned replies, cycled in order. For demos without a model.
    Scripted,
}

impl FromStr for LlmProvider {
    type Err = HomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ollama" => Ok(Self::Ollama),
            "scripted" => Ok(Self::Scripted),
            other => Err(HomeError::InvalidConfig(format!("unknown llm provider: {other}"))),
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Reply backend.
    pub provider: LlmProvider,
    /// Ollama completion model name.
    pub model: String,
    /// Temperature for generation.
    pub temperature: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
    /// System preamble sent with every request.
    pub system_prompt: String,
    /// Number of most recent turns rendered into the prompt.
    pub history_window: usize,
    /// Replies used by the scripted provider.
    pub scripted_replies: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mistral:7b-instruct-q8_0".to_string(),
            temperature: 0.0,
            max_tokens: None,
            base_url: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            provider: LlmProvider::Ollama,
            history_window: 20,
            scripted_replies: vec![
                "I am a scripted agent. My system prompt makes me confused.".to_string(),
                "You asked about the pantry. I am still scripted, and quite confused.".to_string(),
                "As a confused agent, I can only offer generic advice.".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert!((config.llm.temperature - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "/tmp/home.sqlite"),
            (PORT_ENV, "8081"),
            (OLLAMA_URL_ENV, "http://10.0.0.2:11434"),
            (MODEL_ENV, "llama3"),
            (TEMPERATURE_ENV, "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.storage.sqlite_path, PathBuf::from("/tmp/home.sqlite"));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://10.0.0.2:11434"));
        assert_eq!(config.llm.model, "llama3");
        assert!((config.llm.temperature - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[(PORT_ENV, "http")]));
        assert!(matches!(result, Err(HomeError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[(OLLAMA_URL_ENV, "not a url")]));
        assert!(matches!(result, Err(HomeError::Url(_))));
    }

    #[test]
    fn test_provider_override() {
        let config = AppConfig::from_lookup(lookup_from(&[(PROVIDER_ENV, "scripted")])).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Scripted);

        let result = AppConfig::from_lookup(lookup_from(&[(PROVIDER_ENV, "openai")]));
        assert!(matches!(result, Err(HomeError::InvalidConfig(_))));
    }

    #[test]
    fn test_scripted_needs_replies() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Scripted;
        config.llm.scripted_replies.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = AppConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }
}
