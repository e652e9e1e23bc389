//! Task orchestrator — owns the session and dispatches commands to the
//! service adapters.
//!
//! # Command flow
//!
//! ```text
//! Command::Detect ──────▶ tokio::spawn(detector.detect) ─▶ DetectionComplete
//! Command::FetchWordDetail ▶ tokio::spawn(details.details) ▶ WordDetailReady
//! Command::Synthesize ──▶ tokio::spawn(speech.synthesize) ─▶ AudioReady
//!
//! Command::Login / Register / … ─▶ handled inline (session mutates here)
//! ```
//!
//! Content commands are spawned so slow model calls never block sign-out or
//! each other.  Account commands are handled inline because they read and
//! write the one canonical `Option<Session>`, which lives in the
//! orchestrator — the UI only ever sees copies delivered through events.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::account::{AccountService, AuthError, Session};
use crate::content::details::WordDetailProvider;
use crate::content::detect::ObjectDetector;
use crate::content::speech::SpeechSynthesizer;

use super::{Command, Event};

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives all background work for the app.
///
/// Create with [`Orchestrator::new`], then call [`run`](Self::run) inside a
/// tokio task.  It never returns while the command channel is open.
pub struct Orchestrator {
    detector: Arc<dyn ObjectDetector>,
    details: Arc<dyn WordDetailProvider>,
    speech: Arc<dyn SpeechSynthesizer>,
    accounts: Arc<dyn AccountService>,
    events: mpsc::Sender<Event>,
    session: Option<Session>,
}

impl Orchestrator {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        details: Arc<dyn WordDetailProvider>,
        speech: Arc<dyn SpeechSynthesizer>,
        accounts: Arc<dyn AccountService>,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            detector,
            details,
            speech,
            accounts,
            events,
            session: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `commands` is closed.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }
        log::info!("tasks: command channel closed, orchestrator shutting down");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            // ── content (spawned, concurrent) ──────────────────────────────
            Command::Detect { generation, image } => {
                log::debug!("tasks: detect request (gen {generation})");
                let detector = Arc::clone(&self.detector);
                let events = self.events.clone();
                tokio::spawn(async move {
                    // The detector is wrapped so detect() never fails; a
                    // provider error surfaces as zero objects.
                    let objects = detector.detect(&image).await.unwrap_or_default();
                    let _ = events
                        .send(Event::DetectionComplete {
                            generation,
                            objects,
                        })
                        .await;
                });
            }
            Command::FetchWordDetail { word } => {
                let details = Arc::clone(&self.details);
                let events = self.events.clone();
                tokio::spawn(async move {
                    match details.details(&word).await {
                        Ok(details) => {
                            let _ = events.send(Event::WordDetailReady { details }).await;
                        }
                        Err(e) => {
                            // Unreachable behind the fallback wrapper; logged
                            // in case a bare provider is ever wired in.
                            log::warn!("tasks: word detail failed for {word:?}: {e}");
                        }
                    }
                });
            }
            Command::Synthesize { slot, text, kind } => {
                let speech = Arc::clone(&self.speech);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let clip = match speech.synthesize(&text, kind).await {
                        Ok(clip) => Some(clip),
                        Err(e) => {
                            log::warn!("tasks: synthesis failed for {text:?}: {e}");
                            None
                        }
                    };
                    let _ = events.send(Event::AudioReady { slot, text, clip }).await;
                });
            }

            // ── account (inline — session mutates here) ────────────────────
            Command::Register {
                email,
                password,
                name,
            } => {
                match self.accounts.register(&email, &password, &name).await {
                    Ok(session) => self.accept_session(session).await,
                    Err(e) => self.send(Event::AuthFailed { message: e.to_string() }).await,
                }
            }
            Command::Login { email, password } => {
                match self.accounts.login(&email, &password).await {
                    Ok(session) => self.accept_session(session).await,
                    Err(e) => self.send(Event::AuthFailed { message: e.to_string() }).await,
                }
            }
            Command::ResendVerification => {
                let Some(session) = self.session.clone() else {
                    return;
                };
                match self.accounts.resend_verification(&session).await {
                    Ok(()) => self.send(Event::VerificationSent).await,
                    Err(e) => self.send(Event::AuthFailed { message: e.to_string() }).await,
                }
            }
            Command::LoadProfile => {
                let Some(session) = self.session.clone() else {
                    self.send(Event::ProfileError {
                        message: "Not signed in.".into(),
                    })
                    .await;
                    return;
                };
                match self.accounts.load_profile(&session).await {
                    Ok(profile) => self.send(Event::ProfileLoaded { profile }).await,
                    Err(e) => self.send(Event::ProfileError { message: e.to_string() }).await,
                }
            }
            Command::SaveProfile {
                name,
                photo_file_name,
            } => {
                let Some(session) = self.session.clone() else {
                    self.send(Event::ProfileError {
                        message: "Not signed in.".into(),
                    })
                    .await;
                    return;
                };
                match self
                    .accounts
                    .update_profile(&session, &name, &photo_file_name)
                    .await
                {
                    Ok(()) => {
                        // Keep the canonical session's display name current.
                        if let Some(s) = self.session.as_mut() {
                            s.display_name = Some(name.clone());
                        }
                        self.send(Event::ProfileSaved { name }).await;
                    }
                    Err(e) => self.send(Event::ProfileError { message: e.to_string() }).await,
                }
            }
            Command::DeleteAccount => {
                let Some(session) = self.session.clone() else {
                    return;
                };
                match self.accounts.delete_account(&session).await {
                    Ok(()) => {
                        self.session = None;
                        self.send(Event::AccountDeleted).await;
                    }
                    Err(e @ AuthError::RequiresRecentLogin) => {
                        // Session stays valid; the user just has to re-login
                        // before retrying the deletion.
                        self.send(Event::ProfileError { message: e.to_string() }).await;
                    }
                    Err(e) => self.send(Event::ProfileError { message: e.to_string() }).await,
                }
            }
            Command::SignOut => {
                self.session = None;
                self.send(Event::SignedOut).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Install a fresh session.  Unverified accounts get an automatic
    /// verification re-send; its outcome is logged, not surfaced — the gate
    /// screen offers a manual re-send button.
    async fn accept_session(&mut self, session: Session) {
        if !session.email_verified {
            if let Err(e) = self.accounts.resend_verification(&session).await {
                log::warn!("tasks: verification re-send failed: {e}");
            }
        }
        self.session = Some(session.clone());
        self.send(Event::SignedIn { session }).await;
    }

    async fn send(&self, event: Event) {
        let _ = self.events.send(event).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::account::UserProfile;
    use crate::audio::PcmClip;
    use crate::content::speech::SpeechKind;
    use crate::content::{
        BoundingBox, ContentError, DetectedObject, ImagePayload, WordDetails,
    };
    use crate::tasks::AudioSlot;

    // ---- mock services ---

    struct FixedDetector;

    #[async_trait]
    impl ObjectDetector for FixedDetector {
        async fn detect(
            &self,
            _image: &ImagePayload,
        ) -> Result<Vec<DetectedObject>, ContentError> {
            Ok(vec![DetectedObject {
                id: "obj-0-test".into(),
                label: "cup".into(),
                bounding_box: BoundingBox::from_wire([0, 0, 1000, 1000]).unwrap(),
            }])
        }
    }

    struct FixedDetails;

    #[async_trait]
    impl WordDetailProvider for FixedDetails {
        async fn details(&self, word: &str) -> Result<WordDetails, ContentError> {
            Ok(WordDetails {
                word: word.to_string(),
                phonetic: Some("/kʌp/".into()),
                sentences: vec!["A sentence.".into()],
            })
        }
    }

    struct FailingSpeech;

    #[async_trait]
    impl SpeechSynthesizer for FailingSpeech {
        async fn synthesize(
            &self,
            _text: &str,
            _kind: SpeechKind,
        ) -> Result<PcmClip, ContentError> {
            Err(ContentError::EmptyResponse)
        }
    }

    struct OkSpeech;

    #[async_trait]
    impl SpeechSynthesizer for OkSpeech {
        async fn synthesize(
            &self,
            _text: &str,
            _kind: SpeechKind,
        ) -> Result<PcmClip, ContentError> {
            Ok(PcmClip::from_bytes(vec![0, 1, 0, 1]))
        }
    }

    /// Configurable account-service double.
    #[derive(Default)]
    struct MockAccounts {
        fail_login: bool,
        verified: bool,
        delete_requires_recent: bool,
        resend_calls: AtomicUsize,
    }

    impl MockAccounts {
        fn session(&self) -> Session {
            Session {
                account_id: "uid-1".into(),
                id_token: "token".into(),
                email: "a@b.test".into(),
                display_name: Some("Ada".into()),
                email_verified: self.verified,
            }
        }
    }

    #[async_trait]
    impl AccountService for MockAccounts {
        async fn register(
            &self,
            _email: &str,
            _password: &str,
            _name: &str,
        ) -> Result<Session, AuthError> {
            Ok(self.session())
        }

        async fn login(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
            if self.fail_login {
                Err(AuthError::WrongCredentials)
            } else {
                Ok(self.session())
            }
        }

        async fn load_profile(&self, session: &Session) -> Result<UserProfile, AuthError> {
            Ok(UserProfile {
                name: "Ada".into(),
                email: session.email.clone(),
                photo_file_name: String::new(),
            })
        }

        async fn update_profile(
            &self,
            _session: &Session,
            _name: &str,
            _photo_file_name: &str,
        ) -> Result<(), AuthError> {
            Ok(())
        }

        async fn delete_account(&self, _session: &Session) -> Result<(), AuthError> {
            if self.delete_requires_recent {
                Err(AuthError::RequiresRecentLogin)
            } else {
                Ok(())
            }
        }

        async fn resend_verification(&self, _session: &Session) -> Result<(), AuthError> {
            self.resend_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // ---- harness ---

    fn start(
        accounts: Arc<MockAccounts>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> (mpsc::Sender<Command>, mpsc::Receiver<Event>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let orchestrator = Orchestrator::new(
            Arc::new(FixedDetector),
            Arc::new(FixedDetails),
            speech,
            accounts,
            event_tx,
        );
        tokio::spawn(orchestrator.run(cmd_rx));
        (cmd_tx, event_rx)
    }

    // ---- content commands ---

    #[tokio::test]
    async fn detect_carries_its_generation_back() {
        let (tx, mut rx) = start(Arc::new(MockAccounts::default()), Arc::new(OkSpeech));
        tx.send(Command::Detect {
            generation: 7,
            image: ImagePayload::new(vec![1], "image/jpeg"),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::DetectionComplete {
                generation,
                objects,
            } => {
                assert_eq!(generation, 7);
                assert_eq!(objects[0].label, "cup");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn word_detail_is_forwarded() {
        let (tx, mut rx) = start(Arc::new(MockAccounts::default()), Arc::new(OkSpeech));
        tx.send(Command::FetchWordDetail { word: "cup".into() })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            Event::WordDetailReady { details } => assert_eq!(details.word, "cup"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn synthesis_failure_yields_empty_slot() {
        let (tx, mut rx) = start(Arc::new(MockAccounts::default()), Arc::new(FailingSpeech));
        tx.send(Command::Synthesize {
            slot: AudioSlot::Sentence(1),
            text: "A sentence.".into(),
            kind: SpeechKind::Sentence,
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::AudioReady { slot, text, clip } => {
                assert_eq!(slot, AudioSlot::Sentence(1));
                assert_eq!(text, "A sentence.");
                assert!(clip.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn synthesis_success_carries_the_clip() {
        let (tx, mut rx) = start(Arc::new(MockAccounts::default()), Arc::new(OkSpeech));
        tx.send(Command::Synthesize {
            slot: AudioSlot::Word,
            text: "cup".into(),
            kind: SpeechKind::Word,
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::AudioReady { slot, clip, .. } => {
                assert_eq!(slot, AudioSlot::Word);
                assert_eq!(clip.unwrap().len_samples(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    // ---- account commands ---

    #[tokio::test]
    async fn login_success_emits_signed_in() {
        let accounts = Arc::new(MockAccounts {
            verified: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(Arc::clone(&accounts), Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::SignedIn { session } => assert!(session.email_verified),
            other => panic!("unexpected event {other:?}"),
        }
        // Verified login does not trigger a verification mail.
        assert_eq!(accounts.resend_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_failure_emits_auth_failed() {
        let accounts = Arc::new(MockAccounts {
            fail_login: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(accounts, Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::AuthFailed { message } => {
                assert_eq!(message, "Password or Email Incorrect")
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn unverified_login_resends_verification() {
        let accounts = Arc::new(MockAccounts::default()); // verified: false
        let (tx, mut rx) = start(Arc::clone(&accounts), Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            Event::SignedIn { session } => assert!(!session.email_verified),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(accounts.resend_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn profile_round_trip_through_session() {
        let accounts = Arc::new(MockAccounts {
            verified: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(accounts, Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedIn { .. }));

        tx.send(Command::LoadProfile).await.unwrap();
        match rx.recv().await.unwrap() {
            Event::ProfileLoaded { profile } => assert_eq!(profile.name, "Ada"),
            other => panic!("unexpected event {other:?}"),
        }

        tx.send(Command::SaveProfile {
            name: "Grace".into(),
            photo_file_name: "avatar.png".into(),
        })
        .await
        .unwrap();
        match rx.recv().await.unwrap() {
            Event::ProfileSaved { name } => assert_eq!(name, "Grace"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_profile_without_session_errors() {
        let (tx, mut rx) = start(Arc::new(MockAccounts::default()), Arc::new(OkSpeech));
        tx.send(Command::LoadProfile).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::ProfileError { .. }
        ));
    }

    #[tokio::test]
    async fn sign_out_drops_the_session() {
        let accounts = Arc::new(MockAccounts {
            verified: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(accounts, Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedIn { .. }));

        tx.send(Command::SignOut).await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedOut));

        // Session is gone, so profile loads now fail.
        tx.send(Command::LoadProfile).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::ProfileError { .. }
        ));
    }

    #[tokio::test]
    async fn delete_account_clears_the_session() {
        let accounts = Arc::new(MockAccounts {
            verified: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(accounts, Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedIn { .. }));

        tx.send(Command::DeleteAccount).await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::AccountDeleted));

        tx.send(Command::LoadProfile).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::ProfileError { .. }
        ));
    }

    #[tokio::test]
    async fn stale_credential_delete_keeps_the_session() {
        let accounts = Arc::new(MockAccounts {
            verified: true,
            delete_requires_recent: true,
            ..Default::default()
        });
        let (tx, mut rx) = start(accounts, Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedIn { .. }));

        tx.send(Command::DeleteAccount).await.unwrap();
        match rx.recv().await.unwrap() {
            Event::ProfileError { message } => {
                assert_eq!(
                    message,
                    "Please sign out and sign in again to delete your account."
                );
            }
            other => panic!("unexpected event {other:?}"),
        }

        // The session survived the failed deletion.
        tx.send(Command::LoadProfile).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::ProfileLoaded { .. }
        ));
    }

    #[tokio::test]
    async fn manual_resend_emits_verification_sent() {
        let accounts = Arc::new(MockAccounts::default());
        let (tx, mut rx) = start(Arc::clone(&accounts), Arc::new(OkSpeech));
        tx.send(Command::Login {
            email: "a@b.test".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), Event::SignedIn { .. }));

        tx.send(Command::ResendVerification).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::VerificationSent
        ));
        // One automatic re-send at login plus the manual one.
        assert_eq!(accounts.resend_calls.load(Ordering::SeqCst), 2);
    }
}
