//! Export of the session's best available text as a plain-text file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::state::SessionState;
use crate::config::SessionConfig;

/// Pick the text to export: the user-edited purified text, then the
/// unedited purified text, then the original transcript.
///
/// Returns `None` when all three are empty.
pub fn export_content(state: &SessionState) -> Option<&str> {
    let purified = state
        .purified
        .as_ref()
        .map(|r| r.purified_text.as_str())
        .unwrap_or_default();

    [state.edited_text.as_str(), purified, state.original_text.as_str()]
        .into_iter()
        .find(|t| !t.is_empty())
}

/// Export file name: the configured marker followed by the loaded file's
/// name (or the default name when nothing was loaded).
pub fn export_file_name(state: &SessionState, config: &SessionConfig) -> String {
    let base = if state.file_name.is_empty() {
        config.default_file_name.as_str()
    } else {
        state.file_name.as_str()
    };
    format!("{}{}", config.export_prefix, base)
}

/// Write the export into `dir`, returning the written path.
pub fn write_export(state: &SessionState, config: &SessionConfig, dir: &Path) -> Result<PathBuf> {
    let content = export_content(state).context("nothing to export")?;
    let path = dir.join(export_file_name(state, config));

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

    log::info!("export: wrote {} chars to {}", content.chars().count(), path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
