//! Model provider boundary.
//!
//! Extraction needs exactly one thing from a model: send one combined prompt,
//! get free text back. [`LlmClient`] is that seam; [`GeminiClient`] and
//! [`OpenAiClient`] implement it over blocking HTTP, and tests plug in
//! canned clients.
//!
//! # Example
//!
//! ```rust
//! use chatminer::llm::LlmClient;
//!
//! struct Canned(&'static str);
//!
//! impl LlmClient for Canned {
//!     fn name(&self) -> &'static str {
//!         "canned"
//!     }
//!
//!     fn complete(&self, _prompt: &str) -> chatminer::Result<String> {
//!         Ok(self.0.to_string())
//!     }
//! }
//!
//! let client = Canned("{\"tasks\": []}");
//! assert_eq!(client.complete("anything").unwrap(), "{\"tasks\": []}");
//! ```

mod gemini;
mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Result;

/// A single-shot text completion endpoint.
///
/// Implementations make one request per call, with no retry and no
/// conversation state.
pub trait LlmClient: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Sends `prompt` and returns the model's text.
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Provider {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,

    /// OpenAI-compatible `chat/completions`
    #[serde(alias = "open-ai")]
    OpenAi,
}

impl Provider {
    /// Provider name as used in config and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4.1-mini",
        }
    }

    /// Endpoint used when none is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => gemini::GEMINI_BASE_URL,
            Provider::OpenAi => openai::OPENAI_BASE_URL,
        }
    }

    /// Environment variable consulted for the API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Returns all provider names including aliases.
    pub fn all_names() -> &'static [&'static str] {
        &["gemini", "openai", "open-ai"]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" | "open-ai" => Ok(Provider::OpenAi),
            _ => Err(format!(
                "Unknown provider: '{}'. Expected one of: {}",
                s,
                Provider::all_names().join(", ")
            )),
        }
    }
}

/// Builds the HTTP client shared by both providers.
fn http_client(config: &LlmConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Creates the client selected by `config`.
///
/// The API key comes from the config or, failing that, the provider's
/// environment variable.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let api_key = config.api_key_from_env()?;
    create_client_with_key(config, api_key)
}

/// Creates the client selected by `config` with an explicit API key.
pub fn create_client_with_key(config: &LlmConfig, api_key: String) -> Result<Box<dyn LlmClient>> {
    let http = http_client(config)?;
    let model = config.effective_model().to_string();
    let base_url = config.effective_base_url().trim_end_matches('/').to_string();
    Ok(match config.provider {
        Provider::Gemini => Box::new(GeminiClient::new(http, api_key, model, base_url)),
        Provider::OpenAi => Box::new(OpenAiClient::new(http, api_key, model, base_url)),
    })
}
