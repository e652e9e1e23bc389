//! Exclusive pronunciation playback.
//!
//! [`Player`] owns a dedicated playback thread (the rodio output stream must
//! live on a single thread) fed through an mpsc channel.  An atomic busy
//! guard enforces the one-clip-at-a-time rule: [`Player::try_play`] while a
//! clip is loading or playing is a no-op that returns `false`, not a queue.
//!
//! The completion callback fires when playback ends **and** on the error
//! path (no output device, sink failure) — playback failure is treated as
//! "done", never propagated to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use super::pcm::{PcmClip, SAMPLE_RATE};

// ---------------------------------------------------------------------------
// PlayRequest
// ---------------------------------------------------------------------------

/// A clip handed to the playback thread together with its completion hook.
pub struct PlayRequest {
    clip: PcmClip,
    done: Box<dyn FnOnce() + Send>,
    busy: Arc<AtomicBool>,
}

impl PlayRequest {
    /// The clip to play.
    pub fn clip(&self) -> &PcmClip {
        &self.clip
    }

    /// Release the busy guard and invoke the completion callback.
    ///
    /// Called by the playback thread after the sink drains or fails.
    pub fn complete(self) {
        self.busy.store(false, Ordering::SeqCst);
        (self.done)();
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Handle to the playback thread.  Cheap to keep in the UI struct; dropping
/// it closes the channel and lets the thread exit.
pub struct Player {
    tx: mpsc::Sender<PlayRequest>,
    busy: Arc<AtomicBool>,
}

impl Player {
    /// Spawn the playback thread and return a handle to it.
    ///
    /// When no output device is available the player still runs: every
    /// request completes immediately (callback fires, guard releases) so the
    /// UI never deadlocks waiting for audio that cannot play.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<PlayRequest>();
        let busy = Arc::new(AtomicBool::new(false));

        std::thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || {
                // The OutputStream is !Send and must be created and kept on
                // this thread for as long as playback is possible.
                let output = OutputStream::try_default();
                if let Err(e) = &output {
                    log::warn!("audio output unavailable: {e} — playback disabled");
                }

                while let Ok(request) = rx.recv() {
                    if let Ok((_stream, handle)) = &output {
                        match Sink::try_new(handle) {
                            Ok(sink) => {
                                let samples = request.clip().samples();
                                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
                                sink.sleep_until_end();
                            }
                            Err(e) => log::warn!("failed to open playback sink: {e}"),
                        }
                    }
                    // Error paths fall through here too: "failed" == "done".
                    request.complete();
                }

                log::debug!("audio-playback thread shutting down");
            })
            .expect("failed to spawn audio-playback thread");

        Self { tx, busy }
    }

    /// Request playback of `clip`, invoking `done` when it finishes.
    ///
    /// Returns `false` without side effects when another clip is already
    /// loading or playing (exclusivity rule), or when the clip is empty.
    pub fn try_play(&self, clip: PcmClip, done: impl FnOnce() + Send + 'static) -> bool {
        if clip.is_empty() {
            return false;
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            return false;
        }

        let request = PlayRequest {
            clip,
            done: Box::new(done),
            busy: Arc::clone(&self.busy),
        };

        if self.tx.send(request).is_err() {
            // Playback thread is gone; release the guard.
            self.busy.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Returns `true` while a clip is loading or playing.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Build a player whose worker is driven manually by the test — requests
    /// arrive on the returned receiver instead of a real output thread.
    #[cfg(test)]
    fn with_manual_worker() -> (Self, mpsc::Receiver<PlayRequest>) {
        let (tx, rx) = mpsc::channel::<PlayRequest>();
        let busy = Arc::new(AtomicBool::new(false));
        (Self { tx, busy }, rx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn one_second_clip() -> PcmClip {
        PcmClip::from_bytes(vec![0; 48_000])
    }

    #[test]
    fn first_play_request_is_accepted() {
        let (player, _rx) = Player::with_manual_worker();
        assert!(player.try_play(one_second_clip(), || {}));
        assert!(player.is_busy());
    }

    #[test]
    fn second_play_request_while_busy_is_a_noop() {
        let (player, rx) = Player::with_manual_worker();
        assert!(player.try_play(one_second_clip(), || {}));
        // Second request must be dropped, not queued.
        assert!(!player.try_play(one_second_clip(), || {}));
        // Only the first request ever reached the worker.
        let _first = rx.try_recv().expect("first request queued");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn completion_releases_the_guard_and_fires_the_callback() {
        let (player, rx) = Player::with_manual_worker();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);

        assert!(player.try_play(one_second_clip(), move || {
            fired_clone.store(true, Ordering::SeqCst);
        }));

        let request = rx.recv().expect("request queued");
        request.complete();

        assert!(fired.load(Ordering::SeqCst));
        assert!(!player.is_busy());
        // A new request is accepted again after completion.
        assert!(player.try_play(one_second_clip(), || {}));
    }

    #[test]
    fn empty_clip_is_rejected_without_taking_the_guard() {
        let (player, rx) = Player::with_manual_worker();
        assert!(!player.try_play(PcmClip::from_bytes(Vec::new()), || {}));
        assert!(!player.is_busy());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_worker_releases_the_guard() {
        let (player, rx) = Player::with_manual_worker();
        drop(rx);
        assert!(!player.try_play(one_second_clip(), || {}));
        assert!(!player.is_busy());
    }
}
