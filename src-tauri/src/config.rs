//! Upload settings: endpoint URL and history retention.
//!
//! Persisted as JSON in the platform config dir:
//!   macOS:   ~/Library/Application Support/snip-upload/settings.json
//!   Linux:   ~/.config/snip-upload/settings.json
//!   Windows: %APPDATA%/snip-upload/settings.json
//!
//! `SNIP_UPLOAD_URL` (also read from a `.env` file at start-up) overrides the
//! stored endpoint when it is set and non-empty.

use crate::history::DEFAULT_HISTORY_MAX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured endpoint.
pub const UPLOAD_URL_ENV: &str = "SNIP_UPLOAD_URL";

/// Read access to the settings the uploader needs.
///
/// Reads are synchronous and re-evaluated on every call, so a change made in
/// the settings UI is picked up by the next uploader.
pub trait ConfigSource: Send + Sync {
    fn custom_upload_url(&self) -> String;

    fn upload_history_max(&self) -> usize {
        DEFAULT_HISTORY_MAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub custom_upload_url: String,
    pub upload_history_max: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            custom_upload_url: String::new(),
            upload_history_max: DEFAULT_HISTORY_MAX,
        }
    }
}

impl ConfigSource for Settings {
    fn custom_upload_url(&self) -> String {
        self.custom_upload_url.clone()
    }

    fn upload_history_max(&self) -> usize {
        self.upload_history_max
    }
}

/// Settings stored in a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snip-upload")
            .join("settings.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file. A missing file is not an error and yields defaults.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        log::info!("[CONFIG] Settings written to {}", self.path.display());
        Ok(())
    }

    fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_else(|e| {
            log::warn!(
                "[CONFIG] Ignoring unreadable settings at {}: {}",
                self.path.display(),
                e
            );
            Settings::default()
        })
    }
}

impl ConfigSource for SettingsFile {
    fn custom_upload_url(&self) -> String {
        resolve_upload_url(
            std::env::var(UPLOAD_URL_ENV).ok(),
            &self.load_or_default(),
        )
    }

    fn upload_history_max(&self) -> usize {
        self.load_or_default().upload_history_max
    }
}

/// Picks the effective endpoint: a non-empty override wins over the file.
pub fn resolve_upload_url(env_override: Option<String>, settings: &Settings) -> String {
    match env_override {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => settings.custom_upload_url.trim().to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
