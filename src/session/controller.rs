//! Session controller — the state machine behind the UI.
//!
//! [`SessionController`] owns the [`SessionState`], the two-step reset
//! confirmation ([`ResetGuard`]) and the rate-limit cooldown.  It is driven
//! from the UI thread only; time is passed in explicitly so the timers can be
//! tested without sleeping.
//!
//! Each purify request is tagged with a generation number.  Loading a file
//! or resetting moves to a new generation, so a result that resolves after
//! either is discarded instead of overwriting the new session.

use std::time::{Duration, Instant};

use thiserror::Error;

use super::export;
use super::state::{ErrorOrigin, SessionError, SessionState, SessionStatus};
use crate::annotate::{annotate, Segment};
use crate::config::SessionConfig;
use crate::document::{DocumentError, LoadedDocument};
use crate::llm::{PurificationResult, PurifyError};

// ---------------------------------------------------------------------------
// ResetGuard
// ---------------------------------------------------------------------------

/// Two-step confirmation: the first request arms the guard, a second one
/// within `window` confirms.  The guard disarms itself once `window` has
/// passed.
#[derive(Debug, Clone)]
pub struct ResetGuard {
    armed_at: Option<Instant>,
    window: Duration,
}

impl ResetGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            armed_at: None,
            window,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Disarm if the confirmation window has elapsed at `now`.
    pub fn expire(&mut self, now: Instant) {
        if let Some(armed_at) = self.armed_at {
            if now.saturating_duration_since(armed_at) >= self.window {
                self.armed_at = None;
            }
        }
    }

    /// Register a request at `now`.  Returns `true` when it confirms an
    /// earlier one.
    pub fn request(&mut self, now: Instant) -> bool {
        self.expire(now);
        if self.armed_at.take().is_some() {
            true
        } else {
            self.armed_at = Some(now);
            false
        }
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
    }
}

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// Result of a reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// First request: waiting for confirmation.
    Armed,
    /// Confirmed: the session is back to its initial state.
    Cleared,
}

/// Why a purify request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PurifyRefused {
    #[error("no transcript loaded")]
    NoDocument,
    #[error("a purification is already running")]
    Busy,
    #[error("a file is still being loaded")]
    FilePending,
    #[error("cooling down for {0} more seconds")]
    CoolingDown(u32),
}

/// An accepted purify request, to be handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurifyTicket {
    pub generation: u64,
    pub text: String,
    pub hints: String,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns and mutates the session state in response to user actions and
/// worker results.
pub struct SessionController {
    state: SessionState,
    config: SessionConfig,
    reset_guard: ResetGuard,
    /// Instant of the last cooldown decrement (or of arming the cooldown).
    cooldown_tick: Option<Instant>,
    generation: u64,
    file_pending: bool,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let window = Duration::from_secs(config.reset_confirm_secs);
        Self {
            state: SessionState::new(),
            config,
            reset_guard: ResetGuard::new(window),
            cooldown_tick: None,
            generation: 0,
            file_pending: false,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the reset button is waiting for its confirmation click.
    pub fn reset_armed(&self) -> bool {
        self.reset_guard.is_armed()
    }

    /// Whether a file is being extracted in the background.
    pub fn file_pending(&self) -> bool {
        self.file_pending
    }

    /// Whether the purify trigger should be enabled.
    pub fn can_purify(&self) -> bool {
        !self.state.original_text.is_empty()
            && !self.state.status.is_busy()
            && !self.file_pending
            && self.state.cooldown_secs == 0
    }

    /// Characters shown in the footer: edited text, or the original when
    /// nothing has been purified yet.
    pub fn character_count(&self) -> usize {
        if self.state.edited_text.is_empty() {
            self.state.original_text.chars().count()
        } else {
            self.state.edited_text.chars().count()
        }
    }

    /// Segments of the edited text with corrections highlighted.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        match &self.state.purified {
            Some(result) => annotate(&self.state.edited_text, &result.corrections),
            None => vec![Segment::Plain(&self.state.edited_text)],
        }
    }

    pub fn export_content(&self) -> Option<&str> {
        export::export_content(&self.state)
    }

    pub fn export_file_name(&self) -> String {
        export::export_file_name(&self.state, &self.config)
    }

    // ── Free-form edits ──────────────────────────────────────────────────

    pub fn hints_mut(&mut self) -> &mut String {
        &mut self.state.hints
    }

    pub fn original_text_mut(&mut self) -> &mut String {
        &mut self.state.original_text
    }

    pub fn edited_text_mut(&mut self) -> &mut String {
        &mut self.state.edited_text
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    // ── Document loading ─────────────────────────────────────────────────

    /// Mark that a file has been handed to the worker for extraction.
    pub fn begin_load(&mut self) {
        self.file_pending = true;
    }

    /// Install a freshly loaded document and move to `Reviewing`.
    pub fn apply_loaded(&mut self, doc: LoadedDocument) {
        self.file_pending = false;
        self.generation += 1;

        self.state.original_text = doc.text;
        self.state.file_name = doc.display_name;
        self.state.purified = None;
        self.state.edited_text.clear();
        self.state.error = None;
        self.state.status = SessionStatus::Reviewing;
        self.reset_guard.disarm();

        log::info!(
            "session: loaded {} ({} chars)",
            self.state.file_name,
            self.state.original_text.chars().count()
        );
    }

    /// Report a failed load; the current document stays untouched.
    pub fn apply_load_failed(&mut self, err: &DocumentError) {
        self.file_pending = false;
        log::warn!("session: document load failed: {err}");
        self.state.error = Some(SessionError::new(ErrorOrigin::Load, err.to_string()));
    }

    // ── Purification ─────────────────────────────────────────────────────

    /// Move to `Loading` and hand out a ticket for the worker, unless the
    /// request is currently blocked.
    pub fn begin_purify(&mut self) -> Result<PurifyTicket, PurifyRefused> {
        if self.state.original_text.is_empty() {
            return Err(PurifyRefused::NoDocument);
        }
        if self.state.status.is_busy() {
            return Err(PurifyRefused::Busy);
        }
        if self.file_pending {
            return Err(PurifyRefused::FilePending);
        }
        if self.state.cooldown_secs > 0 {
            return Err(PurifyRefused::CoolingDown(self.state.cooldown_secs));
        }

        self.state.status = SessionStatus::Loading;
        self.state.error = None;

        Ok(PurifyTicket {
            generation: self.generation,
            text: self.state.original_text.clone(),
            hints: self.state.hints.clone(),
        })
    }

    /// Apply the outcome of the purify call issued with `generation`.
    ///
    /// Returns `false` (and changes nothing) when the outcome belongs to an
    /// earlier generation.
    pub fn finish_purify(
        &mut self,
        generation: u64,
        outcome: Result<PurificationResult, PurifyError>,
        now: Instant,
    ) -> bool {
        if generation != self.generation {
            log::debug!(
                "session: discarding stale purify outcome (generation {generation}, current {})",
                self.generation
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                self.state.edited_text = result.purified_text.clone();
                self.state.purified = Some(result);
                self.state.error = None;
            }
            Err(err) => {
                log::warn!("session: purification failed: {err}");
                if err == PurifyError::RateLimitExceeded {
                    self.state.cooldown_secs = self.config.cooldown_secs;
                    self.cooldown_tick = Some(now);
                }
                self.state.error = Some(SessionError::new(ErrorOrigin::Purify, err.to_string()));
            }
        }

        self.state.status = SessionStatus::Reviewing;
        true
    }

    // ── Reset ────────────────────────────────────────────────────────────

    /// First call arms the confirmation; a second call within the window
    /// clears every field of the session.
    pub fn request_reset(&mut self, now: Instant) -> ResetOutcome {
        if !self.reset_guard.request(now) {
            return ResetOutcome::Armed;
        }

        self.state = SessionState::new();
        self.cooldown_tick = None;
        self.file_pending = false;
        self.generation += 1;
        log::info!("session: reset");
        ResetOutcome::Cleared
    }

    // ── Timers ───────────────────────────────────────────────────────────

    /// Advance timers to `now`: expire the reset confirmation and count the
    /// cooldown down once per elapsed second.
    pub fn tick(&mut self, now: Instant) {
        self.reset_guard.expire(now);

        let Some(mut last) = self.cooldown_tick else {
            return;
        };

        while self.state.cooldown_secs > 0
            && now.saturating_duration_since(last) >= Duration::from_secs(1)
        {
            self.state.cooldown_secs -= 1;
            last += Duration::from_secs(1);
        }

        self.cooldown_tick = (self.state.cooldown_secs > 0).then_some(last);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Correction;

    fn controller() -> SessionController {
        SessionController::new(SessionConfig::default())
    }

    fn doc(text: &str, name: &str) -> LoadedDocument {
        LoadedDocument {
            text: text.into(),
            display_name: name.into(),
        }
    }

    fn result(text: &str) -> PurificationResult {
        PurificationResult {
            purified_text: text.into(),
            corrections: vec![Correction::new("teh", "the", "typo")],
            uncertain_parts: vec!["unclear name".into()],
        }
    }

    fn loaded_controller() -> SessionController {
        let mut c = controller();
        c.apply_loaded(doc("um teh plan", "plan.txt"));
        c
    }

    // ---- loading ---

    #[test]
    fn file_load_moves_to_reviewing() {
        let c = loaded_controller();
        assert_eq!(c.state().status, SessionStatus::Reviewing);
        assert_eq!(c.state().original_text, "um teh plan");
        assert_eq!(c.state().file_name, "plan.txt");
    }

    #[test]
    fn failed_load_leaves_previous_document_untouched() {
        let mut c = loaded_controller();
        let before = c.state().clone();

        let err = crate::document::load_bytes("sheet.csv", b"a,b").unwrap_err();
        c.apply_load_failed(&err);

        let error = c.state().error.as_ref().expect("load error shown");
        assert_eq!(error.origin, ErrorOrigin::Load);
        assert_eq!(c.state().original_text, before.original_text);
        assert_eq!(c.state().file_name, before.file_name);
        assert_eq!(c.state().status, SessionStatus::Reviewing);
    }

    #[test]
    fn failed_load_from_idle_stays_idle() {
        let mut c = controller();
        c.begin_load();
        assert!(c.file_pending());
        c.apply_load_failed(&DocumentError::ExtractionFailed("scan".into()));
        assert!(!c.file_pending());
        assert_eq!(c.state().status, SessionStatus::Idle);
    }

    #[test]
    fn new_load_clears_previous_result() {
        let mut c = loaded_controller();
        let t = c.begin_purify().unwrap();
        c.finish_purify(t.generation, Ok(result("the plan")), Instant::now());

        c.apply_loaded(doc("second", "b.md"));
        assert!(c.state().purified.is_none());
        assert!(c.state().edited_text.is_empty());
    }

    // ---- purification ---

    #[test]
    fn purify_requires_a_document() {
        let mut c = controller();
        assert_eq!(c.begin_purify(), Err(PurifyRefused::NoDocument));
    }

    #[test]
    fn purify_waits_for_pending_file() {
        let mut c = loaded_controller();
        c.begin_load();
        assert!(!c.can_purify());
        assert_eq!(c.begin_purify(), Err(PurifyRefused::FilePending));
        assert_eq!(c.state().status, SessionStatus::Reviewing);

        c.apply_loaded(doc("fresh text", "fresh.txt"));
        assert!(c.can_purify());
        let ticket = c.begin_purify().unwrap();
        assert_eq!(ticket.text, "fresh text");
    }

    #[test]
    fn purify_cycle_seeds_edited_text() {
        let mut c = loaded_controller();
        c.hints_mut().push_str("plan is a project name");

        let ticket = c.begin_purify().unwrap();
        assert_eq!(c.state().status, SessionStatus::Loading);
        assert_eq!(ticket.text, "um teh plan");
        assert_eq!(ticket.hints, "plan is a project name");
        assert_eq!(c.begin_purify(), Err(PurifyRefused::Busy));

        assert!(c.finish_purify(ticket.generation, Ok(result("the plan")), Instant::now()));
        assert_eq!(c.state().status, SessionStatus::Reviewing);
        assert_eq!(c.state().edited_text, "the plan");
        assert_eq!(c.character_count(), "the plan".len());
    }

    #[test]
    fn failed_purify_keeps_text_and_shows_error() {
        let mut c = loaded_controller();
        let t = c.begin_purify().unwrap();

        c.finish_purify(
            t.generation,
            Err(PurifyError::RemoteCallFailed("HTTP 500".into())),
            Instant::now(),
        );
        assert_eq!(c.state().status, SessionStatus::Reviewing);
        assert_eq!(c.state().original_text, "um teh plan");
        assert_eq!(
            c.state().error,
            Some(SessionError::new(ErrorOrigin::Purify, "HTTP 500"))
        );
        assert_eq!(c.state().cooldown_secs, 0);

        c.dismiss_error();
        assert!(c.state().error.is_none());
    }

    #[test]
    fn rate_limit_arms_cooldown_that_counts_down() {
        let mut c = loaded_controller();
        let t0 = Instant::now();
        let ticket = c.begin_purify().unwrap();
        c.finish_purify(ticket.generation, Err(PurifyError::RateLimitExceeded), t0);

        assert_eq!(c.state().cooldown_secs, 20);
        assert_eq!(c.begin_purify(), Err(PurifyRefused::CoolingDown(20)));
        assert!(!c.can_purify());

        c.tick(t0 + Duration::from_millis(999));
        assert_eq!(c.state().cooldown_secs, 20);
        c.tick(t0 + Duration::from_millis(1500));
        assert_eq!(c.state().cooldown_secs, 19);
        c.tick(t0 + Duration::from_secs(5));
        assert_eq!(c.state().cooldown_secs, 15);
        c.tick(t0 + Duration::from_secs(60));
        assert_eq!(c.state().cooldown_secs, 0);

        assert!(c.can_purify());
        assert!(c.begin_purify().is_ok());
    }

    #[test]
    fn stale_result_after_reset_is_discarded() {
        let mut c = loaded_controller();
        let ticket = c.begin_purify().unwrap();
        let now = Instant::now();

        c.request_reset(now);
        assert_eq!(c.request_reset(now), ResetOutcome::Cleared);

        assert!(!c.finish_purify(ticket.generation, Ok(result("late")), now));
        assert_eq!(*c.state(), SessionState::new());
    }

    #[test]
    fn stale_result_after_new_upload_is_discarded() {
        let mut c = loaded_controller();
        let ticket = c.begin_purify().unwrap();

        c.apply_loaded(doc("another transcript", "other.txt"));
        assert!(!c.finish_purify(ticket.generation, Ok(result("late")), Instant::now()));
        assert!(c.state().purified.is_none());
        assert_eq!(c.state().original_text, "another transcript");
    }

    #[test]
    fn segments_highlight_corrections_in_edited_text() {
        let mut c = loaded_controller();
        let t = c.begin_purify().unwrap();
        c.finish_purify(t.generation, Ok(result("the plan")), Instant::now());

        let segments = c.segments();
        assert_eq!(segments[0].text(), "the");
        assert!(segments[0].correction().is_some());
        assert_eq!(segments[1], Segment::Plain(" plan"));
    }

    #[test]
    fn segments_tolerate_user_edits() {
        let mut c = loaded_controller();
        let t = c.begin_purify().unwrap();
        c.finish_purify(t.generation, Ok(result("the plan")), Instant::now());

        *c.edited_text_mut() = "a completely rewritten plan".into();
        assert_eq!(
            c.segments(),
            vec![Segment::Plain("a completely rewritten plan")]
        );
    }

    // ---- reset ---

    #[test]
    fn single_reset_only_arms_the_flag() {
        let mut c = loaded_controller();
        let before = c.state().clone();

        assert_eq!(c.request_reset(Instant::now()), ResetOutcome::Armed);
        assert!(c.reset_armed());
        assert_eq!(*c.state(), before);
    }

    #[test]
    fn second_reset_within_window_clears_everything() {
        let mut c = loaded_controller();
        c.hints_mut().push_str("hint");
        let t0 = Instant::now();

        c.request_reset(t0);
        assert_eq!(
            c.request_reset(t0 + Duration::from_millis(2900)),
            ResetOutcome::Cleared
        );
        assert_eq!(*c.state(), SessionState::new());
        assert!(!c.reset_armed());
    }

    #[test]
    fn reset_clears_cooldown() {
        let mut c = loaded_controller();
        let t0 = Instant::now();
        let ticket = c.begin_purify().unwrap();
        c.finish_purify(ticket.generation, Err(PurifyError::RateLimitExceeded), t0);

        c.request_reset(t0);
        c.request_reset(t0);
        assert_eq!(c.state().cooldown_secs, 0);
        c.tick(t0 + Duration::from_secs(3));
        assert_eq!(c.state().cooldown_secs, 0);
    }

    #[test]
    fn armed_reset_expires_after_window() {
        let mut c = loaded_controller();
        let before = c.state().clone();
        let t0 = Instant::now();

        c.request_reset(t0);
        c.tick(t0 + Duration::from_millis(3100));
        assert!(!c.reset_armed());
        assert_eq!(*c.state(), before);

        // A click after expiry arms again instead of clearing.
        assert_eq!(
            c.request_reset(t0 + Duration::from_millis(3200)),
            ResetOutcome::Armed
        );
        assert_eq!(*c.state(), before);
    }

    #[test]
    fn late_second_click_without_tick_still_only_arms() {
        let mut c = loaded_controller();
        let t0 = Instant::now();
        c.request_reset(t0);
        assert_eq!(
            c.request_reset(t0 + Duration::from_secs(4)),
            ResetOutcome::Armed
        );
        assert!(c.state().has_document());
    }

    #[test]
    fn loading_a_file_disarms_reset() {
        let mut c = loaded_controller();
        c.request_reset(Instant::now());
        c.apply_loaded(doc("x", "x.txt"));
        assert!(!c.reset_armed());
    }

    // ---- export ---

    #[test]
    fn export_prefers_edited_text() {
        let mut c = loaded_controller();
        assert_eq!(c.export_content(), Some("um teh plan"));

        let t = c.begin_purify().unwrap();
        c.finish_purify(t.generation, Ok(result("the plan")), Instant::now());
        assert_eq!(c.export_content(), Some("the plan"));

        *c.edited_text_mut() = "the final plan".into();
        assert_eq!(c.export_content(), Some("the final plan"));
        assert_eq!(c.export_file_name(), "purified_plan.txt");
    }
}
