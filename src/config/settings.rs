//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ContentConfig
// ---------------------------------------------------------------------------

/// Settings for the generative-content provider (detection, word details,
/// speech synthesis).
///
/// All connection details live here — nothing is hardcoded in the adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Base URL of the `generateContent` REST endpoint.
    pub base_url: String,
    /// API key appended as the `key` query parameter.
    pub api_key: String,
    /// Model identifier used for image object detection.
    pub detect_model: String,
    /// Model identifier used for word-detail generation.
    pub detail_model: String,
    /// Model identifier used for speech synthesis.
    pub tts_model: String,
    /// Prebuilt voice name sent in the speech config.
    pub tts_voice: String,
    /// Sampling temperature for the detection call (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: String::new(),
            detect_model: "gemini-3-flash-preview".into(),
            detail_model: "gemini-3-flash-preview".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            tts_voice: "Kore".into(),
            temperature: 0.4,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AccountConfig
// ---------------------------------------------------------------------------

/// Settings for the identity provider and the profile document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Base URL of the identity-toolkit REST endpoint.
    pub identity_url: String,
    /// Base URL of the document-store REST endpoint.
    pub firestore_url: String,
    /// Project identifier the profile documents live under.
    pub project_id: String,
    /// API key appended as the `key` query parameter on identity calls.
    pub api_key: String,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            identity_url: "https://identitytoolkit.googleapis.com/v1".into(),
            firestore_url: "https://firestore.googleapis.com/v1".into(),
            project_id: String::new(),
            api_key: String::new(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for pronunciation playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of the synthesized PCM stream in Hz (provider contract:
    /// 24 000, mono, 16-bit little-endian).
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            window_size: (420.0, 720.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use snaplearn::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative-content provider settings.
    pub content: ContentConfig,
    /// Identity / document-store provider settings.
    pub account: AccountConfig,
    /// Pronunciation playback settings.
    pub audio: AudioConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
