//! Image upload domain: public API.
//!
//! Providers are tagged alternatives selected by name. Only `custom` (POST
//! to a user-configured endpoint) is registered; adding a provider means a
//! new `Provider` / `Backend` pair, callers stay the same.

pub mod custom;
pub mod latest;
pub mod manager;
pub mod response;
pub mod session;

pub use custom::CustomUploader;
pub use latest::{LatestUpload, Ticket};
pub use manager::UploaderManager;
pub use session::{UploadServices, UploadSession, UploadState};

use crate::capture::Capture;
use crate::history::History;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Registered upload providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Custom,
}

impl Provider {
    pub const ALL: &'static [Provider] = &[Provider::Custom];

    /// Name used in settings and as the history tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Custom => "custom",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UploadError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wanted = name.trim();
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UploadError::UnknownProvider(wanted.to_string()))
    }
}

/// Provider-specific half of an uploader.
pub enum Backend {
    Custom(CustomUploader),
}

impl Backend {
    fn for_provider(provider: Provider, endpoint: String) -> Self {
        match provider {
            Provider::Custom => Backend::Custom(CustomUploader::new(endpoint)),
        }
    }
}

/// A provider backend paired with the session it drives.
pub struct Uploader {
    backend: Backend,
    session: UploadSession,
}

impl Uploader {
    pub fn new(
        provider: Provider,
        endpoint: impl Into<String>,
        capture: Capture,
        services: UploadServices,
    ) -> Self {
        Self {
            backend: Backend::for_provider(provider, endpoint.into()),
            session: UploadSession::new(capture, services),
        }
    }

    pub fn provider(&self) -> Provider {
        match self.backend {
            Backend::Custom(_) => Provider::Custom,
        }
    }

    pub fn endpoint(&self) -> &str {
        match &self.backend {
            Backend::Custom(custom) => custom.endpoint(),
        }
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut UploadSession {
        &mut self.session
    }

    pub fn state(&self) -> &UploadState {
        self.session.state()
    }

    /// Runs the upload to a terminal state.
    pub async fn upload(&mut self) {
        match &self.backend {
            Backend::Custom(custom) => custom.upload(&mut self.session).await,
        }
    }

    pub fn delete_image(&mut self, file_name: &str, delete_token: &str) {
        match &self.backend {
            Backend::Custom(custom) => {
                custom.delete_image(&mut self.session, file_name, delete_token)
            }
        }
    }

    /// Deletes the uploaded image using the provider tag and token stored in
    /// its history name. Returns `false` when nothing was uploaded yet.
    pub fn delete_current_image(&mut self) -> bool {
        let Some(packed) = self.session.current_image_name() else {
            return false;
        };
        let unpacked = History::unpack_file_name(packed);
        self.delete_image(&unpacked.file, &unpacked.token);
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Custom upload URL is not configured. Please configure in Settings.")]
    NotConfigured,

    #[error("Nothing to upload: the capture is empty")]
    EmptyCapture,

    #[error("Upload failed: Invalid response")]
    InvalidResponse,

    #[error("Upload failed: {0}")]
    Transport(String),

    #[error("Failed to parse URL. Response: {snippet}")]
    UnparseableResponse { snippet: String },

    #[error("Unknown upload provider: '{0}'")]
    UnknownProvider(String),

    #[error("The upload already has a result and can't be changed")]
    ResultLocked,
}
