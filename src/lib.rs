//! SnapLearn — photograph objects, learn their English names.
//!
//! Library crate backing the desktop app:
//!
//! * [`config`]   — TOML settings and platform paths.
//! * [`content`]  — multimodal API adapters (detection, word details, TTS).
//! * [`account`]  — identity + profile-document REST adapters.
//! * [`wordbook`] — per-account saved word list.
//! * [`audio`]    — PCM decoding and exclusive playback.
//! * [`flow`]     — session gate and screen state machine.
//! * [`tasks`]    — background orchestrator (commands in, events out).
//! * [`app`]      — the egui/eframe application.

pub mod account;
pub mod app;
pub mod audio;
pub mod config;
pub mod content;
pub mod flow;
pub mod tasks;
pub mod wordbook;
