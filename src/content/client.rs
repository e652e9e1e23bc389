//! Shared `generateContent` REST transport.
//!
//! All three content adapters (detection, word details, speech) speak the
//! same wire format: POST a JSON body to
//! `{base_url}/v1beta/models/{model}:generateContent?key={api_key}` and read
//! candidates out of the JSON response.  [`GeminiClient`] owns the HTTP
//! client and the response-extraction helpers; the adapters own their prompts
//! and schemas.

use serde_json::Value;

use crate::config::ContentConfig;
use crate::content::ContentError;

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Thin transport over the provider's `generateContent` endpoint.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, model names) come
/// exclusively from the [`ContentConfig`] passed to
/// [`GeminiClient::from_config`].
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ContentConfig,
}

impl GeminiClient {
    /// Build a client from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ContentConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            config: config.clone(),
        }
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// POST `body` to the named model's `generateContent` endpoint and return
    /// the parsed response JSON.
    pub async fn generate(&self, model: &str, body: Value) -> Result<Value, ContentError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let response = self.http.post(&url).json(&body).send().await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ContentError::Parse(e.to_string()))?;

        Ok(json)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Text of the first candidate part, if any.
pub fn first_text_part(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

/// Base64 inline data of the first candidate part, if any (audio responses).
pub fn first_inline_data(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["inlineData"]["data"].as_str()
}

/// Strip markdown code fences the model sometimes wraps JSON output in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
