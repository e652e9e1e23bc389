//! SnapLearn — egui/eframe application.
//!
//! # Architecture
//!
//! [`SnapLearnApp`] is the top-level [`eframe::App`].  It owns all UI state
//! and two channel endpoints:
//!
//! * `command_tx` — sends [`Command`]s to the task orchestrator.
//! * `event_rx`   — receives [`Event`]s back, drained every frame.
//!
//! The window is gated by session state, then routed by the screen state
//! machine:
//!
//! | Gate | Rendered |
//! |------|----------|
//! | `SignedOut` | Login / registration form |
//! | `Unverified` | "Verify your email" prompt + re-send button |
//! | `Active` | Home, Camera, Analyzing, Results, Detail, Word Book, Profile |
//!
//! Pronunciation playback is exclusive: while a clip plays every other play
//! button is inert, released by the audio thread's done callback arriving on
//! `audio_done_rx`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::account::{Session, UserProfile};
use crate::audio::{PcmClip, Player};
use crate::config::AppConfig;
use crate::content::speech::SpeechKind;
use crate::content::{DetectedObject, ImagePayload, WordDetails};
use crate::flow::{Flow, Gate, Screen};
use crate::tasks::{AudioSlot, Command, Event};
use crate::wordbook::WordBook;

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Register,
}

/// Login / registration form fields.
struct AuthForm {
    mode: AuthMode,
    email: String,
    password: String,
    name: String,
    busy: bool,
    error: Option<String>,
    notice: Option<String>,
}

impl AuthForm {
    fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            password: String::new(),
            name: String::new(),
            busy: false,
            error: None,
            notice: None,
        }
    }
}

/// Profile editor fields, filled in when `ProfileLoaded` arrives.
struct ProfileForm {
    loaded: Option<UserProfile>,
    name: String,
    photo_file_name: String,
    busy: bool,
    status: Option<String>,
    confirm_delete: bool,
}

impl ProfileForm {
    fn new() -> Self {
        Self {
            loaded: None,
            name: String::new(),
            photo_file_name: String::new(),
            busy: false,
            status: None,
            confirm_delete: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Detail-view state
// ---------------------------------------------------------------------------

/// Per-slot clip cache state.
enum ClipState {
    Pending,
    Ready(PcmClip),
    Failed,
}

/// Transient state for the word-detail screen, rebuilt whenever a new word
/// is opened.
struct DetailView {
    word: String,
    details: Option<WordDetails>,
    clips: HashMap<AudioSlot, ClipState>,
    /// Slot whose play button was pressed while its clip was still pending;
    /// played as soon as the clip arrives.
    queued: Option<AudioSlot>,
}

impl DetailView {
    fn new(word: String) -> Self {
        Self {
            word,
            details: None,
            clips: HashMap::new(),
            queued: None,
        }
    }

    /// The text a slot speaks, used to match `AudioReady` echoes.
    fn text_for(&self, slot: AudioSlot) -> Option<(String, SpeechKind)> {
        match slot {
            AudioSlot::Word => Some((self.word.clone(), SpeechKind::Word)),
            AudioSlot::Sentence(i) => self
                .details
                .as_ref()
                .and_then(|d| d.sentences.get(i))
                .map(|s| (s.clone(), SpeechKind::Sentence)),
        }
    }
}

// ---------------------------------------------------------------------------
// SnapLearnApp
// ---------------------------------------------------------------------------

/// eframe application — the SnapLearn window.
pub struct SnapLearnApp {
    // ── Session / navigation ────────────────────────────────────────────
    session: Option<Session>,
    flow: Flow,

    // ── Screen-local state ──────────────────────────────────────────────
    auth: AuthForm,
    profile: ProfileForm,
    detail: Option<DetailView>,
    word_book: Option<WordBook>,
    search: String,
    /// File-path entry on the capture screen.
    path_input: String,
    capture_error: Option<String>,
    /// Decoded photo texture, keyed by the capture generation it belongs to.
    photo_texture: Option<(u64, egui::TextureHandle)>,

    // ── Audio ───────────────────────────────────────────────────────────
    player: Player,
    playing: Option<AudioSlot>,
    audio_done_tx: std_mpsc::Sender<()>,
    audio_done_rx: std_mpsc::Receiver<()>,

    // ── Channels ────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<Command>,
    event_rx: mpsc::Receiver<Event>,

    /// Application configuration (read-only after startup).
    #[allow(dead_code)]
    config: AppConfig,
}

impl SnapLearnApp {
    pub fn new(
        command_tx: mpsc::Sender<Command>,
        event_rx: mpsc::Receiver<Event>,
        player: Player,
        config: AppConfig,
    ) -> Self {
        let (audio_done_tx, audio_done_rx) = std_mpsc::channel();
        Self {
            session: None,
            flow: Flow::new(),
            auth: AuthForm::new(),
            profile: ProfileForm::new(),
            detail: None,
            word_book: None,
            search: String::new(),
            path_input: String::new(),
            capture_error: None,
            photo_texture: None,
            player,
            playing: None,
            audio_done_tx,
            audio_done_rx,
            command_tx,
            event_rx,
            config,
        }
    }

    fn send(&self, command: Command) {
        let _ = self.command_tx.try_send(command);
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending orchestrator events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                Event::DetectionComplete {
                    generation,
                    objects,
                } => {
                    self.flow.detection_complete(generation, objects);
                }
                Event::WordDetailReady { details } => {
                    if let Some(view) = self.detail.as_mut() {
                        if view.word == details.word {
                            view.details = Some(details);
                        }
                    }
                }
                Event::AudioReady { slot, text, clip } => {
                    self.on_audio_ready(slot, &text, clip);
                }
                Event::SignedIn { session } => {
                    self.word_book = Some(WordBook::open(&session.account_id));
                    self.session = Some(session);
                    self.auth = AuthForm::new();
                    self.flow.reset();
                }
                Event::AuthFailed { message } => {
                    self.auth.busy = false;
                    self.auth.error = Some(message);
                }
                Event::SignedOut => self.clear_session(None),
                Event::AccountDeleted => {
                    self.clear_session(Some("Account deleted.".into()));
                }
                Event::VerificationSent => {
                    self.auth.notice = Some("Verification email sent.".into());
                }
                Event::ProfileLoaded { profile } => {
                    self.profile.name = profile.name.clone();
                    self.profile.photo_file_name = profile.photo_file_name.clone();
                    self.profile.loaded = Some(profile);
                    self.profile.busy = false;
                }
                Event::ProfileSaved { name } => {
                    if let Some(s) = self.session.as_mut() {
                        s.display_name = Some(name);
                    }
                    self.profile.busy = false;
                    self.profile.status = Some("Profile saved.".into());
                }
                Event::ProfileError { message } => {
                    self.profile.busy = false;
                    self.profile.status = Some(message);
                }
            }
        }
    }

    /// A finished (or failed) synthesis arrived.  Discarded when the detail
    /// view has moved on to different text.
    fn on_audio_ready(&mut self, slot: AudioSlot, text: &str, clip: Option<PcmClip>) {
        let queued;
        {
            let Some(view) = self.detail.as_mut() else {
                return;
            };
            match view.text_for(slot) {
                Some((expected, _)) if expected == text => {}
                _ => return,
            }
            match clip {
                Some(clip) => {
                    view.clips.insert(slot, ClipState::Ready(clip));
                }
                None => {
                    view.clips.insert(slot, ClipState::Failed);
                }
            }
            queued = view.queued.take_if(|q| *q == slot).is_some();
        }
        if queued {
            self.play_slot(slot);
        }
    }

    fn clear_session(&mut self, notice: Option<String>) {
        self.session = None;
        self.word_book = None;
        self.detail = None;
        self.photo_texture = None;
        self.profile = ProfileForm::new();
        self.auth = AuthForm::new();
        self.auth.notice = notice;
        self.flow.reset();
    }

    // ── Audio helpers ────────────────────────────────────────────────────

    /// Start exclusive playback of a cached clip, or queue the slot and
    /// request synthesis when no clip is cached yet.
    fn play_slot(&mut self, slot: AudioSlot) {
        if self.playing.is_some() {
            return;
        }
        enum Action {
            Play(PcmClip),
            Request(String, SpeechKind),
            Nothing,
        }
        let action = {
            let Some(view) = self.detail.as_mut() else {
                return;
            };
            match view.clips.get(&slot) {
                Some(ClipState::Ready(clip)) => Action::Play(clip.clone()),
                Some(ClipState::Pending) => {
                    view.queued = Some(slot);
                    Action::Nothing
                }
                Some(ClipState::Failed) => Action::Nothing,
                None => match view.text_for(slot) {
                    Some((text, kind)) => {
                        view.clips.insert(slot, ClipState::Pending);
                        view.queued = Some(slot);
                        Action::Request(text, kind)
                    }
                    None => Action::Nothing,
                },
            }
        };
        match action {
            Action::Play(clip) => {
                let done = self.audio_done_tx.clone();
                if self.player.try_play(clip, move || {
                    let _ = done.send(());
                }) {
                    self.playing = Some(slot);
                }
            }
            Action::Request(text, kind) => {
                self.send(Command::Synthesize { slot, text, kind });
            }
            Action::Nothing => {}
        }
    }

    fn poll_audio_done(&mut self) {
        while self.audio_done_rx.try_recv().is_ok() {
            self.playing = None;
        }
    }

    // ── Navigation helpers ───────────────────────────────────────────────

    /// Open the detail screen for `word` and kick off the detail fetch plus
    /// the headword pronunciation.
    fn open_detail(&mut self, word: &str) {
        if !self.flow.select_word(word) {
            return;
        }
        self.detail = Some(DetailView::new(word.to_string()));
        self.send(Command::FetchWordDetail {
            word: word.to_string(),
        });
        if let Some(view) = self.detail.as_mut() {
            view.clips.insert(AudioSlot::Word, ClipState::Pending);
        }
        self.send(Command::Synthesize {
            slot: AudioSlot::Word,
            text: word.to_string(),
            kind: SpeechKind::Word,
        });
    }

    fn open_profile(&mut self) {
        self.flow.open_profile();
        self.profile = ProfileForm::new();
        self.profile.busy = true;
        self.send(Command::LoadProfile);
    }

    // ── Image capture ────────────────────────────────────────────────────

    /// Load an image file, enter Analyzing and dispatch detection.
    fn capture_from_path(&mut self, path: &Path) {
        let Some(mime) = mime_for_path(path) else {
            self.capture_error = Some("Unsupported image type.".into());
            return;
        };
        match std::fs::read(path) {
            Ok(bytes) => {
                self.capture_error = None;
                let image = ImagePayload::new(bytes, mime);
                let generation = self.flow.image_captured(image.clone());
                self.send(Command::Detect { generation, image });
            }
            Err(e) => {
                self.capture_error = Some(format!("Could not read file: {e}"));
            }
        }
    }

    /// Decode and upload the current photo once per capture generation.
    fn ensure_photo_texture(
        &mut self,
        ctx: &egui::Context,
        image: &ImagePayload,
    ) -> Option<egui::TextureHandle> {
        let generation = self.flow.generation();
        if let Some((cached_gen, handle)) = &self.photo_texture {
            if *cached_gen == generation {
                return Some(handle.clone());
            }
        }
        let decoded = match image::load_from_memory(&image.bytes) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                log::warn!("app: failed to decode photo: {e}");
                return None;
            }
        };
        let size = [decoded.width() as usize, decoded.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, decoded.as_raw());
        let handle = ctx.load_texture("photo", color, egui::TextureOptions::LINEAR);
        self.photo_texture = Some((generation, handle.clone()));
        Some(handle)
    }

    // ── Gate screens ─────────────────────────────────────────────────────

    fn draw_auth(&mut self, ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.heading("SnapLearn");
            ui.label(
                egui::RichText::new("Learn words from the world around you")
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(12.0),
            );
        });
        ui.add_space(16.0);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.auth.mode, AuthMode::Login, "Sign in");
            ui.selectable_value(&mut self.auth.mode, AuthMode::Register, "Create account");
        });
        ui.add_space(8.0);

        if self.auth.mode == AuthMode::Register {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.auth.name);
        }
        ui.label("Email");
        ui.text_edit_singleline(&mut self.auth.email);
        ui.label("Password");
        ui.add(egui::TextEdit::singleline(&mut self.auth.password).password(true));
        ui.add_space(8.0);

        if let Some(ref msg) = self.auth.error {
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), msg);
        }
        if let Some(ref msg) = self.auth.notice {
            ui.colored_label(egui::Color32::from_rgb(80, 200, 120), msg);
        }

        let label = match self.auth.mode {
            AuthMode::Login => "Sign in",
            AuthMode::Register => "Create account",
        };
        let can_submit = !self.auth.busy
            && !self.auth.email.trim().is_empty()
            && !self.auth.password.is_empty();
        if ui.add_enabled(can_submit, egui::Button::new(label)).clicked() {
            self.auth.busy = true;
            self.auth.error = None;
            self.auth.notice = None;
            let email = self.auth.email.trim().to_string();
            let password = self.auth.password.clone();
            match self.auth.mode {
                AuthMode::Login => self.send(Command::Login { email, password }),
                AuthMode::Register => self.send(Command::Register {
                    email,
                    password,
                    name: self.auth.name.trim().to_string(),
                }),
            }
        }
        if self.auth.busy {
            ui.add_space(4.0);
            ui.spinner();
        }
    }

    fn draw_verify_gate(&mut self, ui: &mut egui::Ui, email: &str) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.heading("Verify your email");
        });
        ui.add_space(8.0);
        ui.label(format!(
            "We sent a verification link to {email}. Open it, then sign in again."
        ));
        ui.add_space(8.0);
        if let Some(ref msg) = self.auth.notice {
            ui.colored_label(egui::Color32::from_rgb(80, 200, 120), msg);
        }
        if let Some(ref msg) = self.auth.error {
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), msg);
        }
        ui.horizontal(|ui| {
            if ui.button("Resend email").clicked() {
                self.auth.notice = None;
                self.send(Command::ResendVerification);
            }
            if ui.button("Sign out").clicked() {
                self.send(Command::SignOut);
            }
        });
    }

    // ── Active screens ───────────────────────────────────────────────────

    /// Navigation strip shown on every active screen.
    fn draw_nav(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let show_back = !matches!(self.flow.screen(), Screen::Home);
            if show_back && ui.button("←").clicked() {
                if matches!(self.flow.screen(), Screen::Detail { .. }) {
                    self.detail = None;
                }
                self.flow.back();
            }
            ui.label(
                egui::RichText::new(self.flow.screen().label())
                    .size(15.0)
                    .strong(),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Profile").clicked() {
                    self.open_profile();
                }
                if ui.button("Words").clicked() {
                    self.flow.open_word_book();
                }
            });
        });
        ui.separator();
    }

    fn draw_home(&mut self, ui: &mut egui::Ui) {
        let greeting = self
            .session
            .as_ref()
            .and_then(|s| s.display_name.clone())
            .unwrap_or_else(|| "Learner".into());
        ui.add_space(16.0);
        ui.heading(format!("Hi, {greeting}!"));
        ui.label(
            egui::RichText::new("Photograph an object to learn its English name.")
                .color(egui::Color32::from_rgb(140, 140, 140)),
        );
        ui.add_space(16.0);
        if ui
            .add_sized([ui.available_width(), 44.0], egui::Button::new("📷  Take a Photo"))
            .clicked()
        {
            self.path_input.clear();
            self.capture_error = None;
            self.flow.start_capture();
        }
        ui.add_space(8.0);
        let count = self.word_book.as_ref().map(WordBook::len).unwrap_or(0);
        if ui
            .add_sized(
                [ui.available_width(), 44.0],
                egui::Button::new(format!("📖  My Word Book ({count})")),
            )
            .clicked()
        {
            self.flow.open_word_book();
        }
    }

    fn draw_camera(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(8.0);
        ui.label("Choose a photo (or drop one onto the window):");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.path_input);
            if ui.button("Load").clicked() {
                let path = std::path::PathBuf::from(self.path_input.trim());
                self.capture_from_path(&path);
            }
        });
        if let Some(ref msg) = self.capture_error {
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), msg);
        }
        ui.add_space(8.0);
        if ui.button("Cancel").clicked() {
            self.flow.cancel_capture();
        }

        // Drag-and-drop capture.
        let dropped: Vec<std::path::PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.first() {
            self.capture_from_path(path);
        }
    }

    fn draw_analyzing(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, image: &ImagePayload) {
        if let Some(texture) = self.ensure_photo_texture(ctx, image) {
            let _ = draw_photo(ui, &texture, &[]);
        }
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Analyzing photo…");
        });
    }

    fn draw_results(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        image: &ImagePayload,
        objects: &[DetectedObject],
    ) {
        let mut tapped: Option<String> = None;
        if let Some(texture) = self.ensure_photo_texture(ctx, image) {
            tapped = draw_photo(ui, &texture, objects);
        }

        ui.add_space(8.0);
        if objects.is_empty() {
            ui.label(
                egui::RichText::new("No objects recognized — try another photo.")
                    .color(egui::Color32::from_rgb(140, 140, 140)),
            );
        } else {
            ui.label(
                egui::RichText::new("Tap an object to learn the word.")
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(11.0),
            );
        }
        ui.add_space(4.0);
        if ui.button("New Photo").clicked() {
            self.path_input.clear();
            self.capture_error = None;
            self.flow.reset();
            self.flow.start_capture();
        }

        if let Some(word) = tapped {
            // Tapping an object also saves the word.
            if let Some(book) = self.word_book.as_mut() {
                book.add(&word);
            }
            self.open_detail(&word);
        }
    }

    fn draw_detail(&mut self, ui: &mut egui::Ui, word: &str) {
        let word = word.to_string();
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.heading(&word);
            let state = self
                .detail
                .as_ref()
                .and_then(|v| v.clips.get(&AudioSlot::Word));
            let (label, enabled) = play_button(state, self.playing, AudioSlot::Word);
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                self.play_slot(AudioSlot::Word);
            }
        });

        let details = self.detail.as_ref().and_then(|v| v.details.clone());
        match details {
            None => {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading details…");
                });
            }
            Some(details) => {
                if let Some(ref phonetic) = details.phonetic {
                    ui.label(
                        egui::RichText::new(phonetic.as_str())
                            .color(egui::Color32::from_rgb(140, 140, 140))
                            .italics(),
                    );
                }
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Example sentences").strong());
                for (i, sentence) in details.sentences.iter().enumerate() {
                    let slot = AudioSlot::Sentence(i);
                    ui.horizontal(|ui| {
                        let state = self.detail.as_ref().and_then(|v| v.clips.get(&slot));
                        let (label, enabled) = play_button(state, self.playing, slot);
                        if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                            self.play_slot(slot);
                        }
                        ui.label(sentence.as_str());
                    });
                }
            }
        }

        ui.add_space(12.0);
        let saved = self
            .word_book
            .as_ref()
            .map(|b| b.words().iter().any(|w| w == &word))
            .unwrap_or(false);
        if saved {
            ui.label(
                egui::RichText::new("✓ In your word book")
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(11.0),
            );
        } else if ui.button("＋ Save to word book").clicked() {
            if let Some(book) = self.word_book.as_mut() {
                book.add(&word);
            }
        }
    }

    fn draw_word_book(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("🔍");
            ui.text_edit_singleline(&mut self.search);
        });
        ui.add_space(4.0);

        let filter = self.search.trim().to_lowercase();
        let words: Vec<String> = self
            .word_book
            .as_ref()
            .map(|b| {
                b.words()
                    .iter()
                    .filter(|w| filter.is_empty() || w.to_lowercase().contains(&filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if words.is_empty() {
            ui.add_space(16.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(if filter.is_empty() {
                        "No words saved yet. Photograph something!"
                    } else {
                        "No matches."
                    })
                    .color(egui::Color32::from_rgb(140, 140, 140)),
                );
            });
            return;
        }

        let mut open: Option<String> = None;
        let mut delete: Option<String> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for word in &words {
                ui.horizontal(|ui| {
                    if ui
                        .add(egui::Button::new(word.as_str()).frame(false))
                        .clicked()
                    {
                        open = Some(word.clone());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add(egui::Button::new(
                                egui::RichText::new("🗑")
                                    .color(egui::Color32::from_rgb(200, 100, 100)),
                            ))
                            .clicked()
                        {
                            delete = Some(word.clone());
                        }
                    });
                });
                ui.separator();
            }
        });

        if let Some(word) = delete {
            if let Some(book) = self.word_book.as_mut() {
                book.remove(&word);
            }
        }
        if let Some(word) = open {
            self.open_detail(&word);
        }
    }

    fn draw_profile(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        if self.profile.busy && self.profile.loaded.is_none() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading profile…");
            });
            return;
        }

        let email = self
            .profile
            .loaded
            .as_ref()
            .map(|p| p.email.clone())
            .or_else(|| self.session.as_ref().map(|s| s.email.clone()))
            .unwrap_or_default();

        ui.label("Name");
        ui.text_edit_singleline(&mut self.profile.name);
        ui.label("Photo file name");
        ui.text_edit_singleline(&mut self.profile.photo_file_name);
        ui.label(
            egui::RichText::new(format!("Email: {email}"))
                .color(egui::Color32::from_rgb(140, 140, 140))
                .size(11.0),
        );
        ui.add_space(8.0);

        if let Some(ref msg) = self.profile.status {
            ui.label(egui::RichText::new(msg.as_str()).size(11.0));
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.profile.busy, egui::Button::new("Save"))
                .clicked()
            {
                self.profile.busy = true;
                self.profile.status = None;
                self.send(Command::SaveProfile {
                    name: self.profile.name.trim().to_string(),
                    photo_file_name: self.profile.photo_file_name.trim().to_string(),
                });
            }
            if ui.button("Sign out").clicked() {
                self.send(Command::SignOut);
            }
        });

        ui.add_space(16.0);
        ui.separator();
        if self.profile.confirm_delete {
            ui.colored_label(
                egui::Color32::from_rgb(255, 136, 68),
                "This permanently deletes your account and profile.",
            );
            ui.horizontal(|ui| {
                if ui
                    .button(
                        egui::RichText::new("Yes, delete")
                            .color(egui::Color32::from_rgb(200, 100, 100)),
                    )
                    .clicked()
                {
                    self.profile.confirm_delete = false;
                    self.profile.busy = true;
                    self.send(Command::DeleteAccount);
                }
                if ui.button("Keep my account").clicked() {
                    self.profile.confirm_delete = false;
                }
            });
        } else if ui
            .button(
                egui::RichText::new("Delete account…")
                    .color(egui::Color32::from_rgb(200, 100, 100)),
            )
            .clicked()
        {
            self.profile.confirm_delete = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// MIME type for an image path, by extension.
fn mime_for_path(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("bmp") => Some("image/bmp"),
        _ => None,
    }
}

/// Label and enabled-state for a play button given its clip cache state and
/// the current exclusive-playback slot.
fn play_button(
    state: Option<&ClipState>,
    playing: Option<AudioSlot>,
    slot: AudioSlot,
) -> (&'static str, bool) {
    if playing == Some(slot) {
        return ("🔊", false);
    }
    // Another slot is playing — every other button is inert.
    let exclusive = playing.is_some();
    match state {
        Some(ClipState::Pending) => ("…", false),
        Some(ClipState::Failed) => ("🔇", false),
        _ => ("▶", !exclusive),
    }
}

/// Draw the photo scaled to fit, overlay the detection boxes, and return the
/// label of a tapped box, if any.
fn draw_photo(
    ui: &mut egui::Ui,
    texture: &egui::TextureHandle,
    objects: &[DetectedObject],
) -> Option<String> {
    let avail = ui.available_width();
    let tex_size = texture.size_vec2();
    let scale = (avail / tex_size.x).min(420.0 / tex_size.y).min(1.0);
    let size = tex_size * scale;

    let (rect, _) = ui.allocate_exact_size(egui::vec2(avail, size.y), egui::Sense::hover());
    let image_rect = egui::Rect::from_center_size(rect.center(), size);
    ui.painter().image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let mut tapped = None;
    for object in objects {
        let overlay = object.bounding_box.overlay();
        let min = egui::pos2(
            image_rect.left() + image_rect.width() * overlay.left_pct / 100.0,
            image_rect.top() + image_rect.height() * overlay.top_pct / 100.0,
        );
        let box_size = egui::vec2(
            image_rect.width() * overlay.width_pct / 100.0,
            image_rect.height() * overlay.height_pct / 100.0,
        );
        let box_rect = egui::Rect::from_min_size(min, box_size);

        let response = ui.interact(
            box_rect,
            ui.id().with(&object.id),
            egui::Sense::click(),
        );
        let color = if response.hovered() {
            egui::Color32::from_rgb(80, 200, 120)
        } else {
            egui::Color32::from_rgb(255, 255, 255)
        };
        ui.painter().rect_stroke(
            box_rect,
            egui::CornerRadius::same(2),
            egui::Stroke::new(2.0, color),
            egui::StrokeKind::Outside,
        );
        ui.painter().text(
            box_rect.left_top() + egui::vec2(2.0, 2.0),
            egui::Align2::LEFT_TOP,
            &object.label,
            egui::FontId::proportional(11.0),
            color,
        );
        if response.clicked() {
            tapped = Some(object.label.clone());
        }
    }
    tapped
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for SnapLearnApp {
    /// Called every frame by eframe.  Drains channels, then renders the
    /// gate / screen the state machine selects.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Poll non-blocking channels ------------------------------------
        self.poll_events();
        self.poll_audio_done();

        // --- Schedule repaints while background work is pending -----------
        let animated = self.auth.busy
            || self.profile.busy
            || self.playing.is_some()
            || self.flow.screen().is_analyzing();
        if animated {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            match Gate::for_session(self.session.as_ref()) {
                Gate::SignedOut => self.draw_auth(ui),
                Gate::Unverified { email } => self.draw_verify_gate(ui, &email),
                Gate::Active => {
                    self.draw_nav(ui);
                    // Clone the payload out of the state machine so screen
                    // renderers can take &mut self.
                    let screen = self.flow.screen().clone();
                    match screen {
                        Screen::Home => self.draw_home(ui),
                        Screen::Camera => self.draw_camera(ui, ctx),
                        Screen::Analyzing { image } => self.draw_analyzing(ui, ctx, &image),
                        Screen::Results { image, objects } => {
                            self.draw_results(ui, ctx, &image, &objects)
                        }
                        Screen::Detail { word, .. } => self.draw_detail(ui, &word),
                        Screen::WordBook => self.draw_word_book(ui),
                        Screen::Profile => self.draw_profile(ui),
                    }
                }
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("SnapLearn closing");
    }
}
