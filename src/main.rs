//! Application entry point — Transcript Purifier.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the purifier ([`Purifier`]) from config.
//! 5. Create session channels (`command`, `event`).
//! 6. Spawn the session worker on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use transcript_purifier::{
    app::PurifierApp,
    config::{AppConfig, AppPaths},
    llm::{Purifier, TranscriptPurifier},
    session::{run_worker, SessionCommand, SessionEvent},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("Transcript Purifier")
        .with_inner_size([width, height])
        .with_min_inner_size([720.0, 480.0])
        .with_drag_and_drop(true);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Transcript Purifier starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if config.purifier.resolve_api_key().is_none() {
        log::warn!(
            "No API key configured (set `{}` or `purifier.api_key`); purify calls will fail",
            config.purifier.api_key_env
        );
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Purifier
    let purifier: Arc<dyn TranscriptPurifier> = Arc::new(Purifier::from_config(&config));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(16);

    // 6. Session worker
    rt.spawn(run_worker(purifier, command_rx, event_tx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let export_dir = AppPaths::new().export_dir;
    log::info!("Exports will be written to {}", export_dir.display());

    let options = native_options(&config);
    let app = PurifierApp::new(command_tx, event_rx, config, export_dir);

    eframe::run_native(
        "Transcript Purifier",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("window closed with an error: {e}"))
}
