//! Google Gemini provider.
//!
//! Calls the `generateContent` endpoint. Auth via the `x-goog-api-key`
//! header, so the key never appears in a request URL or its errors.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmClient;
use crate::error::{ChatminerError, Result};

pub(super) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for `model` at `base_url`.
    pub fn new(http: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

fn request_body(prompt: &str) -> GeminiRequest<'_> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: prompt }],
        }],
    }
}

/// Concatenated text of the first candidate.
fn response_text(response: GeminiResponse) -> String {
    response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default()
}

impl LlmClient for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, chars = prompt.len(), "gemini: POST generateContent");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt))
            .send()?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(ChatminerError::llm("gemini", format!("returned {status}: {text}")));
        }

        let parsed: GeminiResponse = response
            .json()
            .map_err(|e| ChatminerError::llm("gemini", format!("failed to parse response: {e}")))?;
        Ok(response_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_value(request_body("hello")).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(parsed), "{\"a\":1}");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(response_text(parsed), "");
    }

    #[test]
    fn test_endpoint_names_model_without_key() {
        let client = GeminiClient::new(
            Client::new(),
            "AIza-test".into(),
            "gemini-2.5-flash".into(),
            GEMINI_BASE_URL.into(),
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!client.endpoint().contains("AIza-test"));
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn test_transport_error_does_not_leak_key() {
        let client = GeminiClient::new(
            Client::new(),
            "SECRET-KEY-123".into(),
            "gemini-2.5-flash".into(),
            "http://127.0.0.1:1".into(),
        );
        let err = client.complete("hi").unwrap_err();
        assert!(err.to_string().contains("127.0.0.1:1"));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
    }
}
