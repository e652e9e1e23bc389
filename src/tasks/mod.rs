//! Background task layer — commands in, events out.
//!
//! The UI thread never performs network I/O.  It sends a [`Command`] over a
//! `tokio::sync::mpsc` channel to the [`Orchestrator`] running on the async
//! runtime, and consumes [`Event`]s from the reverse channel on every frame.

pub mod runner;

use crate::account::{Session, UserProfile};
use crate::audio::PcmClip;
use crate::content::speech::SpeechKind;
use crate::content::{DetectedObject, ImagePayload, WordDetails};

pub use runner::Orchestrator;

// ---------------------------------------------------------------------------
// AudioSlot
// ---------------------------------------------------------------------------

/// Which play button on the detail screen a synthesized clip belongs to.
///
/// Clips are cached per slot, so replaying a sentence does not re-request
/// the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioSlot {
    /// The headword's own pronunciation.
    Word,
    /// One of the example sentences, by index.
    Sentence(usize),
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Work requests sent from the UI to the orchestrator.
#[derive(Debug)]
pub enum Command {
    /// Run object detection on a captured image.  `generation` ties the
    /// eventual response back to the capture that issued it.
    Detect { generation: u64, image: ImagePayload },
    /// Fetch phonetic spelling and example sentences for a word.
    FetchWordDetail { word: String },
    /// Synthesize pronunciation audio for a detail-screen slot.
    Synthesize {
        slot: AudioSlot,
        text: String,
        kind: SpeechKind,
    },

    Register {
        email: String,
        password: String,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
    ResendVerification,
    LoadProfile,
    SaveProfile {
        name: String,
        photo_file_name: String,
    },
    DeleteAccount,
    SignOut,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Results sent from the orchestrator back to the UI.
#[derive(Debug)]
pub enum Event {
    /// Detection finished.  The UI discards this when `generation` is stale.
    DetectionComplete {
        generation: u64,
        objects: Vec<DetectedObject>,
    },
    /// Word details arrived (real or fallback — never an error).
    WordDetailReady { details: WordDetails },
    /// Synthesis finished.  `text` echoes the request so the UI can discard
    /// clips that arrive after the detail view moved on to another word.
    /// `None` means the request failed and the slot's play button stays
    /// inert.
    AudioReady {
        slot: AudioSlot,
        text: String,
        clip: Option<PcmClip>,
    },

    SignedIn { session: Session },
    AuthFailed { message: String },
    SignedOut,
    VerificationSent,
    ProfileLoaded { profile: UserProfile },
    ProfileSaved { name: String },
    ProfileError { message: String },
    AccountDeleted,
}
