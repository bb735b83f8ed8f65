//! Session module — the application state controller.
//!
//! ```text
//! UI thread (egui update)                      tokio runtime
//! ───────────────────────                      ─────────────
//! SessionController ──SessionCommand (mpsc)──▶ run_worker
//!   ├─ begin_load / begin_purify                 ├─ spawn_blocking(document::load_*)
//!   ├─ tick(now): cooldown, reset expiry         └─ TranscriptPurifier::purify
//!   └─ apply_* / finish_purify ◀──SessionEvent (mpsc)──┘
//! ```
//!
//! The controller is only ever touched by the UI thread, so it needs no
//! locking; the worker only sees owned copies of the text it works on.

pub mod controller;
pub mod export;
pub mod state;
pub mod worker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{PurifyRefused, PurifyTicket, ResetGuard, ResetOutcome, SessionController};
pub use export::{export_content, export_file_name, write_export};
pub use state::{ErrorOrigin, SessionError, SessionState, SessionStatus};
pub use worker::{run_worker, SessionCommand, SessionEvent};
