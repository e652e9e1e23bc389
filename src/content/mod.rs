//! Generative-content adapters for SnapLearn.
//!
//! This module provides:
//! * [`ObjectDetector`] / [`GeminiDetector`] / [`FallbackDetector`] — image
//!   object detection with 0–1000-grid bounding boxes.
//! * [`WordDetailProvider`] / [`GeminiDetails`] / [`FallbackDetails`] — word
//!   details (phonetic + example sentences) with deterministic fallback.
//! * [`SpeechSynthesizer`] / [`GeminiSpeech`] — pronunciation synthesis
//!   returning raw 16-bit PCM.
//! * [`GeminiClient`] — shared `generateContent` REST transport.
//! * [`ContentError`] — error variants for all content operations.
//!
//! All three adapters degrade rather than fail: composition wraps the
//! detector and detail provider in their fallback types, and the caller maps
//! synthesis errors to "no audio".

pub mod client;
pub mod detect;
pub mod details;
pub mod speech;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::GeminiClient;
pub use detect::{FallbackDetector, GeminiDetector, ObjectDetector};
pub use details::{fallback_details, FallbackDetails, GeminiDetails, WordDetailProvider};
pub use speech::{GeminiSpeech, SpeechKind, SpeechSynthesizer};

// ---------------------------------------------------------------------------
// ContentError
// ---------------------------------------------------------------------------

/// Errors that can occur during a content-provider call.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("content request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse content response: {0}")]
    Parse(String),

    /// The provider returned a response with no usable payload.
    #[error("provider returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ContentError::Timeout
        } else {
            ContentError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// BoundingBox / OverlayRect
// ---------------------------------------------------------------------------

/// Rectangle locating a detected object on a fixed 0–1000 normalized grid,
/// independent of the source image resolution.
///
/// Invariants, enforced at construction: `y_min <= y_max`,
/// `x_min <= x_max`, all coordinates in `0..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub y_min: u16,
    pub x_min: u16,
    pub y_max: u16,
    pub x_max: u16,
}

impl BoundingBox {
    const GRID: u16 = 1000;

    /// Build a box from `[y_min, x_min, y_max, x_max]` as returned on the
    /// wire. Returns `None` when the coordinates violate the grid invariants.
    pub fn from_wire(raw: [i64; 4]) -> Option<Self> {
        let [y_min, x_min, y_max, x_max] = raw;
        let in_grid = |v: i64| (0..=i64::from(Self::GRID)).contains(&v);
        if !raw.iter().copied().all(in_grid) || y_min > y_max || x_min > x_max {
            return None;
        }
        Some(Self {
            y_min: y_min as u16,
            x_min: x_min as u16,
            y_max: y_max as u16,
            x_max: x_max as u16,
        })
    }

    /// Map the normalized grid linearly to container-relative percentages.
    pub fn overlay(&self) -> OverlayRect {
        let pct = |v: u16| f32::from(v) / f32::from(Self::GRID) * 100.0;
        OverlayRect {
            top_pct: pct(self.y_min),
            left_pct: pct(self.x_min),
            height_pct: pct(self.y_max - self.y_min),
            width_pct: pct(self.x_max - self.x_min),
        }
    }
}

/// Container-relative placement of an overlay box, as percentages of the
/// rendered image's width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub top_pct: f32,
    pub left_pct: f32,
    pub height_pct: f32,
    pub width_pct: f32,
}

// ---------------------------------------------------------------------------
// DetectedObject
// ---------------------------------------------------------------------------

/// One object found in a processed image. Immutable; a fresh batch replaces
/// the previous one when a new image is analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    /// Unique id for this detection batch entry.
    pub id: String,
    /// Short English label, e.g. "lamp".
    pub label: String,
    /// Location on the 0–1000 grid.
    pub bounding_box: BoundingBox,
}

// ---------------------------------------------------------------------------
// ImagePayload
// ---------------------------------------------------------------------------

/// An image to be analyzed, as raw encoded bytes plus its MIME type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: std::sync::Arc<Vec<u8>>,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: std::sync::Arc::new(bytes),
            mime_type: mime_type.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// WordDetails
// ---------------------------------------------------------------------------

/// Learning details for a single vocabulary word. Created on demand when a
/// word is opened; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDetails {
    pub word: String,
    /// IPA transcription, when the provider supplies one.
    #[serde(default)]
    pub phonetic: Option<String>,
    /// Example sentences (three by prompt contract).
    pub sentences: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
