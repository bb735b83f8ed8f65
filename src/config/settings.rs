//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// PurifierConfig
// ---------------------------------------------------------------------------

/// Settings for the hosted model that performs the purification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurifierConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model identifier (e.g. `"gemini-3-flash-preview"`).
    pub model: String,
    /// API key stored in the settings file.  When `None`, the key is read
    /// from the environment (see [`api_key_env`](Self::api_key_env)).
    pub api_key: Option<String>,
    /// Environment variable consulted for the API key.
    pub api_key_env: String,
    /// Secondary environment variable, checked when `api_key_env` is unset.
    pub fallback_api_key_env: String,
    /// Sampling temperature.  Kept low so the output stays close to the
    /// transcript.
    pub temperature: f32,
    /// Maximum seconds to wait for a single remote call.
    pub timeout_secs: u64,
}

/// Default for [`PurifierConfig::fallback_api_key_env`].
pub const FALLBACK_API_KEY_ENV: &str = "GEMINI_API_KEY";

impl PurifierConfig {
    /// Resolve the API credential: explicit config value first, then the
    /// configured environment variable, then the fallback variable.
    ///
    /// Empty strings count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let from_config = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        from_config.or_else(|| {
            [self.api_key_env.as_str(), self.fallback_api_key_env.as_str()]
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .map(|k| k.trim().to_string())
                .find(|k| !k.is_empty())
        })
    }
}

impl Default for PurifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-3-flash-preview".into(),
            api_key: None,
            api_key_env: "API_KEY".into(),
            fallback_api_key_env: FALLBACK_API_KEY_ENV.into(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Local retry policy for transient remote faults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay unit; retry *n* waits `base_delay_ms × n`.
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timers and naming used by the session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds new purify requests stay blocked after a rate-limit failure.
    pub cooldown_secs: u32,
    /// Window in which a second reset click confirms the first.
    pub reset_confirm_secs: u64,
    /// Marker prefixed to the exported file name.
    pub export_prefix: String,
    /// File name used for export when nothing was loaded from disk.
    pub default_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 20,
            reset_confirm_secs: 3,
            export_prefix: "purified_".into(),
            default_file_name: "transcript.txt".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner size of the window `(width, height)`.
    pub window_size: (f32, f32),
    /// Show correction highlighting in the purified tab by default.
    pub show_diff: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (1100.0, 760.0),
            show_diff: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use transcript_purifier::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote model settings.
    pub purifier: PurifierConfig,
    /// Retry policy for transient faults.
    pub retry: RetryConfig,
    /// Cooldown, reset confirmation and export naming.
    pub session: SessionConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
