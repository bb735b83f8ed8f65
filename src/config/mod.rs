//! Configuration module for the transcript purifier.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the remote
//! model, retry policy, session timers and window, `AppPaths` for
//! cross-platform directories, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, PurifierConfig, RetryConfig, SessionConfig, UiConfig, FALLBACK_API_KEY_ENV,
};
