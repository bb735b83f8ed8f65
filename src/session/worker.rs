//! Background worker — runs document extraction and purify calls off the UI
//! thread.
//!
//! The UI sends [`SessionCommand`]s; the worker answers each with exactly
//! one [`SessionEvent`].  Extraction is blocking library work and goes to
//! `tokio::task::spawn_blocking`.  Each purify call runs in its own task, so
//! a slow or retrying call never holds up a file load queued behind it.
//! Loads are answered in the order they were sent.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::document::{self, DocumentError, LoadedDocument};
use crate::llm::{PurificationResult, PurifyError, TranscriptPurifier};

use super::controller::PurifyTicket;

/// Commands sent from the UI thread to the worker.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Extract the text of the file at `path`.
    Load { path: PathBuf },
    /// Extract an in-memory file (e.g. dropped without a path).
    LoadBytes { name: String, bytes: Arc<[u8]> },
    /// Run one purify call.
    Purify(PurifyTicket),
}

/// Results delivered from the worker to the UI.
#[derive(Debug)]
pub enum SessionEvent {
    Loaded(LoadedDocument),
    LoadFailed(DocumentError),
    Purified {
        generation: u64,
        outcome: Result<PurificationResult, PurifyError>,
    },
}

/// Run the worker until `command_rx` is closed or the UI stops listening.
///
/// Purify tasks already spawned keep running after that and deliver their
/// outcome if the UI is still listening.
pub async fn run_worker(
    purifier: Arc<dyn TranscriptPurifier>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    while let Some(command) = command_rx.recv().await {
        let event = match command {
            SessionCommand::Load { path } => {
                log::debug!("worker: loading {}", path.display());
                load_blocking(move || document::load_path(&path)).await
            }
            SessionCommand::LoadBytes { name, bytes } => {
                log::debug!("worker: loading {name} from memory ({} bytes)", bytes.len());
                load_blocking(move || document::load_bytes(&name, &bytes)).await
            }
            SessionCommand::Purify(ticket) => {
                spawn_purify(Arc::clone(&purifier), ticket, event_tx.clone());
                continue;
            }
        };

        if event_tx.send(event).await.is_err() {
            break;
        }
    }

    log::info!("worker: command channel closed, shutting down");
}

fn spawn_purify(
    purifier: Arc<dyn TranscriptPurifier>,
    ticket: PurifyTicket,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    log::debug!("worker: purifying (generation {})", ticket.generation);
    tokio::spawn(async move {
        let outcome = purifier.purify(&ticket.text, &ticket.hints).await;
        let event = SessionEvent::Purified {
            generation: ticket.generation,
            outcome,
        };
        if event_tx.send(event).await.is_err() {
            log::debug!(
                "worker: UI gone, dropping purify outcome (generation {})",
                ticket.generation
            );
        }
    });
}

async fn load_blocking<F>(load: F) -> SessionEvent
where
    F: FnOnce() -> Result<LoadedDocument, DocumentError> + Send + 'static,
{
    match tokio::task::spawn_blocking(load).await {
        Ok(Ok(doc)) => SessionEvent::Loaded(doc),
        Ok(Err(e)) => SessionEvent::LoadFailed(e),
        Err(e) => SessionEvent::LoadFailed(DocumentError::ExtractionFailed(format!(
            "extraction task failed: {e}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
