//! Pronunciation audio — PCM decoding and exclusive playback.
//!
//! ```text
//! TTS response (base64) → PcmClip (LE i16 @ 24 kHz) → samples()/32768
//!                       → Player thread → rodio sink → done callback
//! ```

pub mod pcm;
pub mod player;

pub use pcm::{PcmClip, SAMPLE_RATE};
pub use player::Player;
