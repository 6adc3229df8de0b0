//! Upload history: one PNG file per successful upload.
//!
//! The file name itself carries the record: `<tag>~<token>~<file>`, where
//! `tag` names the provider, `token` is the result URL in URL-safe base64
//! and `file` is the display name. Files live in the platform cache dir:
//!   macOS:   ~/Library/Caches/snip-upload/history/
//!   Linux:   ~/.cache/snip-upload/history/
//!   Windows: %LOCALAPPDATA%/snip-upload/history/

use base64::{engine::general_purpose::URL_SAFE, Engine};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Separates tag, token and display name in a packed history name.
/// Not part of the URL-safe base64 alphabet.
pub const HISTORY_SEPARATOR: char = '~';

/// Retention limit used when the settings don't say otherwise.
pub const DEFAULT_HISTORY_MAX: usize = 25;

/// File name length limit shared by the common file systems (bytes).
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// The three parts of a packed history file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFileName {
    pub kind: String,
    pub token: String,
    pub file: String,
}

/// A stored history file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub name: HistoryFileName,
}

impl HistoryEntry {
    /// The upload URL recovered from the token, if it decodes.
    pub fn url(&self) -> Option<String> {
        decode_token(&self.name.token)
    }
}

#[derive(Debug, Clone)]
pub struct History {
    dir: PathBuf,
    max_entries: usize,
}

impl History {
    /// `max_entries` is clamped to at least one so a save never deletes the
    /// file it just wrote.
    pub fn new(dir: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            dir: dir.into(),
            max_entries: max_entries.max(1),
        }
    }

    /// Base directory for history files.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snip-upload")
            .join("history")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Packs provider tag, token and display name into one file name.
    ///
    /// An empty tag yields the bare file name; an empty token yields
    /// `tag~file`.
    pub fn pack_file_name(kind: &str, token: &str, file: &str) -> String {
        if kind.is_empty() {
            return file.to_string();
        }
        if token.is_empty() {
            return format!("{kind}{HISTORY_SEPARATOR}{file}");
        }
        format!("{kind}{HISTORY_SEPARATOR}{token}{HISTORY_SEPARATOR}{file}")
    }

    /// Inverse of [`History::pack_file_name`]. Accepts a bare name or a full
    /// path; only the last path component is considered.
    ///
    /// The display name is everything after the second separator, so it may
    /// itself contain separators.
    pub fn unpack_file_name(packed: &str) -> HistoryFileName {
        let name = packed.rsplit(['/', '\\']).next().unwrap_or(packed);
        let parts: Vec<&str> = name.splitn(3, HISTORY_SEPARATOR).collect();

        match parts.as_slice() {
            [kind, token, file] => HistoryFileName {
                kind: kind.to_string(),
                token: token.to_string(),
                file: file.to_string(),
            },
            [kind, file] => HistoryFileName {
                kind: kind.to_string(),
                token: String::new(),
                file: file.to_string(),
            },
            _ => HistoryFileName {
                kind: String::new(),
                token: String::new(),
                file: name.to_string(),
            },
        }
    }

    /// Shortens the display name `file` so that the packed name stays within
    /// [`MAX_FILE_NAME_BYTES`], keeping its extension.
    ///
    /// Returns `None` when tag and token alone leave no room, which happens
    /// for result URLs longer than roughly 180 bytes.
    pub fn fit_display_name(kind: &str, token: &str, file: &str) -> Option<String> {
        let overhead = Self::pack_file_name(kind, token, "").len();
        let room = MAX_FILE_NAME_BYTES.checked_sub(overhead)?;
        if file.len() <= room {
            return Some(file.to_string());
        }

        let ext = file
            .rfind('.')
            .map(|i| &file[i..])
            .filter(|ext| ext.len() < room)
            .unwrap_or("");
        let stem = &file[..file.len() - ext.len()];
        let mut cut = (room - ext.len()).min(stem.len());
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            return None;
        }
        Some(format!("{}{}", &stem[..cut], ext))
    }

    /// Writes image bytes under `packed_name`, then prunes the oldest files
    /// beyond the retention limit.
    pub fn save(&self, image_bytes: &[u8], packed_name: &str) -> Result<PathBuf, HistoryError> {
        if packed_name.is_empty()
            || packed_name.len() > MAX_FILE_NAME_BYTES
            || packed_name.contains(['/', '\\'])
        {
            return Err(HistoryError::InvalidName(packed_name.to_string()));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(packed_name);
        fs::write(&path, image_bytes)?;
        log::info!(
            "[HISTORY] Saved {} ({} bytes)",
            path.display(),
            image_bytes.len()
        );

        self.prune(&path)?;
        Ok(path)
    }

    /// Stored entries, newest first.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self
            .files_newest_first()?
            .into_iter()
            .filter_map(|path| {
                let file_name = path.file_name()?.to_str()?.to_string();
                Some(HistoryEntry {
                    name: Self::unpack_file_name(&file_name),
                    path,
                })
            })
            .collect())
    }

    fn prune(&self, keep: &Path) -> Result<(), HistoryError> {
        let stale: Vec<PathBuf> = self
            .files_newest_first()?
            .into_iter()
            .filter(|path| path != keep)
            .skip(self.max_entries - 1)
            .collect();

        for path in stale {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("[HISTORY] Pruned {}", path.display()),
                Err(e) => log::warn!("[HISTORY] Failed to prune {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    fn files_newest_first(&self) -> Result<Vec<PathBuf>, HistoryError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<(SystemTime, PathBuf)> = fs::read_dir(&self.dir)?
            .flatten()
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                Some((modified, entry.path()))
            })
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }
}

/// Encodes an upload URL as a history token.
pub fn encode_token(url: &str) -> String {
    URL_SAFE.encode(url.as_bytes())
}

/// Recovers the upload URL from a history token.
pub fn decode_token(token: &str) -> Option<String> {
    let bytes = URL_SAFE.decode(token).ok()?;
    String::from_utf8(bytes).ok()
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid history file name: '{0}'")]
    InvalidName(String),
}
