//! Session status and the single session-state object.
//!
//! [`SessionStatus`] drives the screen the UI shows.  [`SessionState`] holds
//! everything about the current document; it is owned by the
//! [`SessionController`](super::SessionController) and lives for the whole
//! run of the application, reset to its defaults on an explicit reset.

use crate::llm::PurificationResult;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// States of the session.
///
/// ```text
/// Idle ──file loaded──▶ Reviewing ──purify requested──▶ Loading
///                          ▲                              │
///                          └────── success or failure ────┘
/// any ──reset confirmed──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No document loaded; the upload screen is shown.
    #[default]
    Idle,
    /// A document is loaded and can be edited, purified or exported.
    Reviewing,
    /// A purify call is in flight.
    Loading,
}

impl SessionStatus {
    /// Returns `true` while a purify call is in flight.
    ///
    /// ```
    /// use transcript_purifier::session::SessionStatus;
    ///
    /// assert!(!SessionStatus::Idle.is_busy());
    /// assert!(!SessionStatus::Reviewing.is_busy());
    /// assert!(SessionStatus::Loading.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }

    /// A short human-readable label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Waiting for a transcript",
            SessionStatus::Reviewing => "Reviewing",
            SessionStatus::Loading => "Purifying",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Which step produced the error in the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    Load,
    Purify,
}

/// A user-facing error together with the step it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub origin: ErrorOrigin,
    pub message: String,
}

impl SessionError {
    pub fn new(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
        }
    }

    /// Banner heading for this error.
    pub fn title(&self) -> &'static str {
        match self.origin {
            ErrorOrigin::Load => "Could not load the file",
            ErrorOrigin::Purify => "Purification failed",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The single source of truth for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Current screen state.
    pub status: SessionStatus,

    /// Transcript as loaded (editable by the user before purifying).
    pub original_text: String,

    /// Display name of the loaded file; empty before the first load.
    pub file_name: String,

    /// Last successful purification, replaced wholesale by the next one.
    pub purified: Option<PurificationResult>,

    /// Purified text as edited by the user.  Seeded from
    /// `purified.purified_text` whenever a new result arrives.
    pub edited_text: String,

    /// Names and terminology the user wants the model to respect.
    pub hints: String,

    /// Error shown in the dismissible banner.
    pub error: Option<SessionError>,

    /// Seconds left before another purify request is allowed.
    pub cooldown_secs: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a document has been loaded.
    pub fn has_document(&self) -> bool {
        !self.original_text.is_empty() || !self.file_name.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
