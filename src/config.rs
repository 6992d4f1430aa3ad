//! Configuration types for the pipelines.
//!
//! Everything is plain data with serde support and builder methods, so the
//! library can be driven without a config file. The CLI reads an optional
//! TOML file with the same shape:
//!
//! ```toml
//! [llm]
//! provider = "gemini"          # or "openai"
//! model = "gemini-2.5-flash"
//! timeout_secs = 120
//!
//! [database]
//! path = "chatminer.db"
//!
//! [sampling]
//! chat_tasks = 150
//! person_profile = 80
//! patterns = 200
//! single_person = 300
//! behavior_alerts = 200
//!
//! [ingest]
//! checkpoint_every = 200
//!
//! [alerts]
//! min_messages = 5
//! ```
//!
//! # Example
//!
//! ```rust
//! use chatminer::config::{AppConfig, LlmConfig};
//! use chatminer::llm::Provider;
//!
//! let config = AppConfig::default()
//!     .with_llm(LlmConfig::new(Provider::OpenAi).with_model("gpt-4.1-mini"));
//!
//! assert_eq!(config.llm.effective_model(), "gpt-4.1-mini");
//! assert_eq!(config.sampling.single_person, 300);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ChatminerError, Result};
use crate::llm::Provider;

/// Model provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which provider to call (default: gemini)
    pub provider: Provider,

    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,

    /// Model name; falls back to the provider default
    pub model: Option<String>,

    /// Endpoint override, mostly for proxies and tests
    pub base_url: Option<String>,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Creates a configuration for `provider` with default settings.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the endpoint base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The configured model, or the provider default.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The configured endpoint, or the provider default.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Resolves the API key from the config, then from `lookup(env_var)`.
    ///
    /// `lookup` is injectable so tests never touch the process environment.
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(self.provider.env_var()).filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                ChatminerError::missing_api_key(self.provider.name(), self.provider.env_var())
            })
    }

    /// Resolves the API key using the process environment.
    pub fn api_key_from_env(&self) -> Result<String> {
        self.resolve_api_key(|var| std::env::var(var).ok())
    }
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path (default: `chatminer.db`)
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chatminer.db"),
        }
    }
}

/// Message caps per extraction kind. They bound prompt size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Chat-wide task extraction (default: 150)
    pub chat_tasks: usize,
    /// Per-person profile in the bulk flow (default: 80)
    pub person_profile: usize,
    /// Chat-wide pattern detection (default: 200)
    pub patterns: usize,
    /// Single-person analysis (default: 300)
    pub single_person: usize,
    /// Behavior alert detection per person (default: 200)
    pub behavior_alerts: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            chat_tasks: 150,
            person_profile: 80,
            patterns: 200,
            single_person: 300,
            behavior_alerts: 200,
        }
    }
}

impl SamplingConfig {
    /// Name of the first cap set to zero, if any.
    fn zero_cap(&self) -> Option<&'static str> {
        [
            ("chat_tasks", self.chat_tasks),
            ("person_profile", self.person_profile),
            ("patterns", self.patterns),
            ("single_person", self.single_person),
            ("behavior_alerts", self.behavior_alerts),
        ]
        .into_iter()
        .find_map(|(key, cap)| (cap == 0).then_some(key))
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Messages written per progress checkpoint (default: 200)
    pub checkpoint_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: 200,
        }
    }
}

/// Behavior alert settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// People with fewer messages are skipped (default: 5)
    pub min_messages: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { min_messages: 5 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub sampling: SamplingConfig,
    pub ingest: IngestConfig,
    pub alerts: AlertConfig,
}

impl AppConfig {
    /// Loads a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ChatminerError::config_parse(e, path))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipelines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.checkpoint_every == 0 {
            return Err(ChatminerError::config("ingest.checkpoint_every must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ChatminerError::config("llm.timeout_secs must be at least 1"));
        }
        if let Some(key) = self.sampling.zero_cap() {
            return Err(ChatminerError::config(format!("sampling.{key} must be at least 1")));
        }
        Ok(())
    }

    /// Replaces the provider settings.
    #[must_use]
    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    /// Replaces the sampling caps.
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, Provider::Gemini);
        assert_eq!(config.llm.effective_model(), "gemini-2.5-flash");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.database.path, PathBuf::from("chatminer.db"));
        assert_eq!(config.sampling.chat_tasks, 150);
        assert_eq!(config.sampling.person_profile, 80);
        assert_eq!(config.sampling.patterns, 200);
        assert_eq!(config.ingest.checkpoint_every, 200);
        assert_eq!(config.alerts.min_messages, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [llm]
            provider = "openai"

            [sampling]
            single_person = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, Provider::OpenAi);
        assert_eq!(config.llm.effective_model(), "gpt-4.1-mini");
        assert_eq!(config.sampling.single_person, 100);
        assert_eq!(config.sampling.chat_tasks, 150);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = AppConfig::from_toml_str("[llm\nprovider = 1").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_zero_checkpoint_rejected() {
        let err = AppConfig::from_toml_str("[ingest]\ncheckpoint_every = 0").unwrap_err();
        assert!(err.to_string().contains("checkpoint_every"));
    }

    #[test]
    fn test_zero_sampling_cap_rejected() {
        let err = AppConfig::from_toml_str("[sampling]\nsingle_person = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: sampling.single_person must be at least 1"
        );

        let zeroed = SamplingConfig {
            behavior_alerts: 0,
            ..SamplingConfig::default()
        };
        let err = AppConfig::default().with_sampling(zeroed).validate().unwrap_err();
        assert!(err.to_string().contains("sampling.behavior_alerts"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load(Path::new("/no/such/chatminer.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_api_key_resolution_order() {
        let config = LlmConfig::new(Provider::Gemini);
        let key = config
            .resolve_api_key(|var| (var == "GEMINI_API_KEY").then(|| "from-env".to_string()))
            .unwrap();
        assert_eq!(key, "from-env");

        let key = config
            .clone()
            .with_api_key("from-config")
            .resolve_api_key(|_| Some("from-env".into()))
            .unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_missing_api_key() {
        let err = LlmConfig::new(Provider::OpenAi)
            .with_api_key("  ")
            .resolve_api_key(|_| None)
            .unwrap_err();
        assert!(matches!(err, ChatminerError::MissingApiKey { env_var: "OPENAI_API_KEY", .. }));
    }
}
