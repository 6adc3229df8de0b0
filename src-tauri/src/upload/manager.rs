//! Single entry point the rest of the app uses to get an uploader.

use super::{Provider, UploadError, UploadServices, Uploader};
use crate::capture::Capture;
use crate::config::ConfigSource;
use std::sync::Arc;

pub struct UploaderManager {
    config: Arc<dyn ConfigSource>,
    provider: Provider,
    url: String,
}

impl UploaderManager {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        let mut manager = Self {
            config,
            provider: Provider::default(),
            url: String::new(),
        };
        manager.init();
        manager
    }

    /// Re-reads the endpoint. An empty endpoint is kept as is; the uploader
    /// reports it when asked to upload.
    fn init(&mut self) {
        self.url = self.config.custom_upload_url();
        if self.url.is_empty() {
            log::debug!("[UPLOAD] No upload endpoint configured");
        }
    }

    /// Builds an uploader for the capture and, unless the capture is empty,
    /// runs the upload. The future resolves once the upload has reached a
    /// terminal state; the uploader is returned either way.
    ///
    /// Holds `&mut self` for the whole round trip. Callers sharing the manager
    /// behind a lock should use [`UploaderManager::prepare`] instead and run
    /// the upload after releasing it.
    pub async fn uploader(&mut self, capture: Capture, services: UploadServices) -> Uploader {
        let mut uploader = self.prepare(capture, services);
        if !uploader.session().capture().is_empty() {
            uploader.upload().await;
        }
        uploader
    }

    /// Re-reads the settings and builds an uploader for the capture without
    /// sending anything. The returned uploader is independent of the manager.
    pub fn prepare(&mut self, capture: Capture, services: UploadServices) -> Uploader {
        self.init();
        Uploader::new(self.provider, self.url.clone(), capture, services)
    }

    /// Selects a provider by name, re-reads the settings and returns a fresh
    /// uploader that hasn't sent anything. Used to show current settings.
    pub fn uploader_for(
        &mut self,
        provider_name: &str,
        services: UploadServices,
    ) -> Result<Uploader, UploadError> {
        self.provider = provider_name.parse()?;
        self.init();
        Ok(Uploader::new(self.provider, self.url.clone(), Capture::empty(), services))
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.as_str()
    }

    /// The endpoint as of the last read.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retention limit for the history store, from the same settings.
    pub fn history_max(&self) -> usize {
        self.config.upload_history_max()
    }
}
