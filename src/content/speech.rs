//! Pronunciation synthesis.
//!
//! [`GeminiSpeech`] asks the TTS model for audio and decodes the base64
//! inline payload into a raw [`PcmClip`] (16-bit LE mono @ 24 kHz — the
//! provider's fixed output format).  Isolated vocabulary words get an
//! emphasis framing prompt; full sentences are spoken as-is.

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::json;

use crate::audio::PcmClip;
use crate::content::client::{first_inline_data, GeminiClient};
use crate::content::ContentError;

// ---------------------------------------------------------------------------
// SpeechKind
// ---------------------------------------------------------------------------

/// Distinguishes how the text should be spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechKind {
    /// An isolated vocabulary word — framed for clear enunciation.
    Word,
    /// A full sentence — spoken naturally, as-is.
    Sentence,
}

impl SpeechKind {
    /// The prompt actually sent to the TTS model.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            SpeechKind::Word => format!("Say the word: {text}"),
            SpeechKind::Sentence => text.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for speech synthesis.
///
/// Unlike the detector and detail provider there is no fallback wrapper:
/// callers map a failure to "no audio" (the play button stays disabled).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, kind: SpeechKind) -> Result<PcmClip, ContentError>;
}

// ---------------------------------------------------------------------------
// GeminiSpeech
// ---------------------------------------------------------------------------

/// Calls the TTS `generateContent` endpoint and decodes the inline audio.
pub struct GeminiSpeech {
    client: GeminiClient,
}

impl GeminiSpeech {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeech {
    async fn synthesize(&self, text: &str, kind: SpeechKind) -> Result<PcmClip, ContentError> {
        let body = json!({
            "contents": [ { "parts": [ { "text": kind.prompt(text) } ] } ],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.client.config().tts_voice }
                    }
                }
            }
        });

        let model = self.client.config().tts_model.clone();
        let response = self.client.generate(&model, body).await?;

        let encoded = first_inline_data(&response).ok_or(ContentError::EmptyResponse)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ContentError::Parse(e.to_string()))?;

        if bytes.is_empty() {
            return Err(ContentError::EmptyResponse);
        }

        Ok(PcmClip::from_bytes(bytes))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
