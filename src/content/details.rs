//! Word-detail generation.
//!
//! [`GeminiDetails`] asks the model for a phonetic transcription and three
//! simple example sentences for a word.  [`FallbackDetails`] substitutes a
//! deterministic templated record on any failure, so the detail screen never
//! shows an empty state.

use async_trait::async_trait;
use serde_json::json;

use crate::content::client::{first_text_part, strip_code_fences, GeminiClient};
use crate::content::{ContentError, WordDetails};

// ---------------------------------------------------------------------------
// WordDetailProvider trait
// ---------------------------------------------------------------------------

/// Async trait for word-detail generation.
#[async_trait]
pub trait WordDetailProvider: Send + Sync {
    async fn details(&self, word: &str) -> Result<WordDetails, ContentError>;
}

// ---------------------------------------------------------------------------
// Deterministic fallback
// ---------------------------------------------------------------------------

/// The record substituted when the provider call fails: the word itself, no
/// phonetic, and three fixed sentence templates embedding the word.
pub fn fallback_details(word: &str) -> WordDetails {
    WordDetails {
        word: word.to_string(),
        phonetic: None,
        sentences: vec![
            format!("Here is a sentence with {word}."),
            format!("I like this {word}."),
            format!("Can you see the {word}?"),
        ],
    }
}

// ---------------------------------------------------------------------------
// GeminiDetails
// ---------------------------------------------------------------------------

/// Calls the `generateContent` endpoint with a structured-output schema for
/// `{word, phonetic, sentences}`.
pub struct GeminiDetails {
    client: GeminiClient,
}

impl GeminiDetails {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "word": { "type": "STRING" },
                "phonetic": {
                    "type": "STRING",
                    "description": "IPA phonetic transcription"
                },
                "sentences": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "3 simple, real-world example sentences using the word."
                }
            },
            "required": ["word", "sentences"]
        })
    }

    fn parse_details(text: &str) -> Result<WordDetails, ContentError> {
        let clean = strip_code_fences(text);
        serde_json::from_str(&clean).map_err(|e| ContentError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WordDetailProvider for GeminiDetails {
    async fn details(&self, word: &str) -> Result<WordDetails, ContentError> {
        let prompt = format!(
            "Provide English learning details for the word: \"{word}\". \
             Include phonetic spelling and 3 simple example sentences."
        );

        let body = json!({
            "contents": [ { "parts": [ { "text": prompt } ] } ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::response_schema()
            }
        });

        let model = self.client.config().detail_model.clone();
        let response = self.client.generate(&model, body).await?;

        let text = first_text_part(&response).ok_or(ContentError::EmptyResponse)?;
        Self::parse_details(text)
    }
}

// ---------------------------------------------------------------------------
// FallbackDetails
// ---------------------------------------------------------------------------

/// A transparent wrapper around any [`WordDetailProvider`] that never returns
/// an error — on failure it returns [`fallback_details`] for the word.
pub struct FallbackDetails<P: WordDetailProvider> {
    inner: P,
}

impl<P: WordDetailProvider> FallbackDetails<P> {
    /// Wrap `inner` with fallback behaviour.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: WordDetailProvider + Send + Sync> WordDetailProvider for FallbackDetails<P> {
    /// Attempt detail generation; return the deterministic fallback record if
    /// any error occurs.
    ///
    /// This implementation **never** returns `Err(_)`.
    async fn details(&self, word: &str) -> Result<WordDetails, ContentError> {
        match self.inner.details(word).await {
            Ok(details) => Ok(details),
            Err(err) => {
                log::warn!("word details failed for '{word}' — using fallback: {err}");
                Ok(fallback_details(word))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
