//! Correction highlighting for the purified text.
//!
//! The model reports its edits as `(original, corrected, reason)` triples
//! without positions.  [`annotate`] locates each `corrected` string in the
//! displayed text and splits the text into [`Segment`]s so the UI can
//! highlight the edits.
//!
//! This is a substring heuristic, not a positional diff: an unrelated
//! identical-looking occurrence elsewhere in the document can be credited
//! with a correction, and text the user has since edited may no longer
//! contain a correction at all.

pub mod spans;

pub use spans::{annotate, locate_spans, plain_text, Segment, Span};
