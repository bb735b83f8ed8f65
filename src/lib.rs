//! Transcript purifier — cleans up speech-to-text transcripts with a hosted
//! model and highlights each correction.
//!
//! * [`document`] — `.txt` / `.md` / `.docx` / `.pdf` → plain text.
//! * [`llm`] — remote purify call with retry and typed fault classification.
//! * [`annotate`] — maps reported corrections back onto spans of the text.
//! * [`session`] — session state machine, background worker and export.
//! * [`app`] — the egui window.
//! * [`config`] — TOML settings.

pub mod annotate;
pub mod app;
pub mod config;
pub mod document;
pub mod llm;
pub mod session;
