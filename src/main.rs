//! Application entry point — SnapLearn.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the service adapters (detector, word details, TTS, accounts).
//! 5. Create task channels (`command`, `event`).
//! 6. Spawn the task orchestrator on the tokio runtime.
//! 7. Spawn the audio playback thread.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use snaplearn::{
    account::{AccountService, RestAccountService},
    app::SnapLearnApp,
    audio::Player,
    config::AppConfig,
    content::{
        client::GeminiClient,
        details::{FallbackDetails, GeminiDetails, WordDetailProvider},
        detect::{FallbackDetector, GeminiDetector, ObjectDetector},
        speech::{GeminiSpeech, SpeechSynthesizer},
    },
    tasks::{Command, Event, Orchestrator},
};

// ---------------------------------------------------------------------------
// Window options
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (w, h) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([w, h])
        .with_min_inner_size([360.0, 560.0])
        .with_title("SnapLearn");

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("SnapLearn starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if config.content.api_key.is_empty() {
        log::warn!("No content API key configured — detection and TTS will fail");
    }

    // 3. Tokio runtime (2 workers — detection and TTS calls overlap)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Service adapters.  Detection and word details are wrapped so a
    //    provider failure degrades (empty results / template sentences)
    //    instead of erroring; synthesis failures surface as missing audio.
    let client = GeminiClient::from_config(&config.content);
    let detector: Arc<dyn ObjectDetector> =
        Arc::new(FallbackDetector::new(GeminiDetector::new(client.clone())));
    let details: Arc<dyn WordDetailProvider> =
        Arc::new(FallbackDetails::new(GeminiDetails::new(client.clone())));
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(GeminiSpeech::new(client));
    let accounts: Arc<dyn AccountService> =
        Arc::new(RestAccountService::from_config(&config.account));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let (event_tx, event_rx) = mpsc::channel::<Event>(32);

    // 6. Spawn task orchestrator onto the tokio runtime
    let orchestrator = Orchestrator::new(detector, details, speech, accounts, event_tx);
    rt.spawn(orchestrator.run(command_rx));

    // 7. Audio playback thread
    let player = Player::spawn();

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = SnapLearnApp::new(command_tx, event_rx, player, config.clone());
    let options = native_options(&config);

    eframe::run_native("SnapLearn", options, Box::new(move |_cc| Ok(Box::new(app))))
}
