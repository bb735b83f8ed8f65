//! Remote purification for transcript cleanup.
//!
//! This module provides:
//! * [`TranscriptPurifier`] — async trait the session talks to.
//! * [`Purifier`] — builds the prompt, retries transient faults, parses JSON.
//! * [`StructuredCompletion`] / [`GeminiClient`] — the single outbound call.
//! * [`RetryPolicy`] — pure fault-kind → retry decision mapping.
//! * [`PromptBuilder`] — fixed editorial instruction and response schema.
//! * [`PurificationResult`] / [`Correction`] — the structured result.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use transcript_purifier::config::AppConfig;
//! use transcript_purifier::llm::{Purifier, TranscriptPurifier};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let purifier = Purifier::from_config(&config);
//!
//!     let result = purifier
//!         .purify("um so the the budget was uh approved", "")
//!         .await
//!         .unwrap();
//!     println!("{}", result.purified_text);
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod purifier;
pub mod retry;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{FaultKind, GeminiClient, RemoteError, StructuredCompletion};
pub use prompt::PromptBuilder;
pub use purifier::{Purifier, PurifyError, TranscriptPurifier};
pub use retry::{RetryDecision, RetryPolicy};
pub use types::{Correction, PurificationResult};
