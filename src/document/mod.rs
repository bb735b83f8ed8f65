//! Document loading for uploaded transcripts.
//!
//! * [`load_path`] / [`load_bytes`] — turn a `.txt`, `.md`, `.docx` or `.pdf`
//!   file into one plain-text string plus a display name.
//! * [`DocumentFormat`] — the fixed allow-list of accepted extensions.
//! * [`DocumentError`] — unsupported format, extraction failure, I/O error.

pub mod loader;

pub use loader::{
    load_bytes, load_path, DocumentError, DocumentFormat, LoadedDocument, SUPPORTED_EXTENSIONS,
};
