//! Raw PCM clip type and 16-bit → float decoding.
//!
//! The TTS provider returns uncompressed audio as little-endian signed
//! 16-bit samples, single channel, at a fixed 24 kHz.  [`PcmClip`] holds the
//! raw bytes (cheap to clone — the buffer is shared) and decodes them on
//! demand into the `[-1.0, 1.0)` float range the playback sink expects.

use std::sync::Arc;

/// Fixed sample rate of the provider's PCM stream, in Hz.
pub const SAMPLE_RATE: u32 = 24_000;

// ---------------------------------------------------------------------------
// PcmClip
// ---------------------------------------------------------------------------

/// An immutable pronunciation clip: raw LE i16 mono PCM at [`SAMPLE_RATE`].
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    bytes: Arc<Vec<u8>>,
}

impl PcmClip {
    /// Wrap raw PCM bytes as received from the provider.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    /// Number of whole 16-bit samples in the clip.
    ///
    /// A trailing odd byte (truncated response) is ignored.
    pub fn len_samples(&self) -> usize {
        self.bytes.len() / 2
    }

    /// Returns `true` when the clip contains no complete sample.
    pub fn is_empty(&self) -> bool {
        self.len_samples() == 0
    }

    /// Clip duration in seconds at the fixed sample rate.
    pub fn duration_secs(&self) -> f32 {
        self.len_samples() as f32 / SAMPLE_RATE as f32
    }

    /// Decode to floats in `[-1.0, 1.0)` by dividing each sample by 32768.
    pub fn samples(&self) -> Vec<f32> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
