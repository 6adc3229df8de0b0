//! Per-upload state and presentation hooks shared by every provider.
//!
//! The session owns the capture, the resolved URL and the collaborators that
//! stand in for the GUI: the upload view, the clipboard, the "open URL"
//! service and the save dialog. Providers drive it through the state machine
//! `Idle | Uploading -> Succeeded | Failed`; both terminal states are final
//! for the session.

use super::UploadError;
use crate::capture::{Capture, CaptureError, DragPayload};
use crate::clipboard::ClipboardError;
use crate::history::History;
use image::DynamicImage;
use serde::Serialize;

pub const UPLOADING_TEXT: &str = "Uploading...";
pub const OPEN_FAILED_TEXT: &str = "Unable to open the URL.";
pub const URL_COPIED_TEXT: &str = "URL copied to clipboard.";
pub const IMAGE_COPIED_TEXT: &str = "Screenshot copied to clipboard.";
pub const COPY_FAILED_TEXT: &str = "Unable to copy to the clipboard.";
pub const SAVED_TEXT: &str = "Screenshot saved.";
pub const SAVE_FAILED_TEXT: &str = "Unable to save the screenshot to disk.";

/// The upload window: progress indicator, status label, result view and
/// transient notifications.
pub trait UploadView: Send {
    fn start_progress(&mut self);
    fn stop_progress(&mut self);
    fn set_info_text(&mut self, text: &str);
    /// Replaces progress and status with the URL plus "Open" / "Copy".
    fn show_result(&mut self, url: &str);
    fn notify(&mut self, message: &str);
}

pub trait ClipboardSink: Send {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
    fn set_image(&mut self, image: &DynamicImage) -> Result<(), ClipboardError>;
}

/// Best-effort "open in browser".
pub trait UrlOpener: Send {
    fn open(&mut self, url: &str) -> bool;
}

/// Saves a capture to a user-chosen location. Returns `false` when the user
/// cancels or the write fails.
pub trait ScreenshotSaver: Send {
    fn save(&mut self, capture: &Capture) -> bool;
}

/// Everything a session needs from the outside world.
pub struct UploadServices {
    pub view: Box<dyn UploadView>,
    pub clipboard: Box<dyn ClipboardSink>,
    pub opener: Box<dyn UrlOpener>,
    pub saver: Box<dyn ScreenshotSaver>,
    pub history: History,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UploadState {
    /// Empty capture; nothing was sent.
    Idle,
    Uploading,
    Succeeded { url: String },
    Failed { message: String },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

pub struct UploadSession {
    capture: Capture,
    image_url: Option<String>,
    current_image_name: Option<String>,
    state: UploadState,
    services: UploadServices,
}

impl UploadSession {
    /// A non-empty capture enters `Uploading` immediately and shows progress.
    pub fn new(capture: Capture, services: UploadServices) -> Self {
        let mut session = Self {
            state: UploadState::Idle,
            capture,
            image_url: None,
            current_image_name: None,
            services,
        };

        if !session.capture.is_empty() {
            session.state = UploadState::Uploading;
            session.start_progress();
            session.set_info_text(UPLOADING_TEXT);
        }
        session
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Replaces the capture. Refused once a result exists.
    pub fn set_capture(&mut self, capture: Capture) -> Result<(), UploadError> {
        self.ensure_unlocked()?;
        self.capture = capture;
        Ok(())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Stores the resolved URL. Refused once a result exists.
    pub fn set_image_url(&mut self, url: impl Into<String>) -> Result<(), UploadError> {
        self.ensure_unlocked()?;
        self.image_url = Some(url.into());
        Ok(())
    }

    /// Packed history name of the uploaded image.
    pub fn current_image_name(&self) -> Option<&str> {
        self.current_image_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.services.history
    }

    pub fn start_progress(&mut self) {
        self.services.view.start_progress();
    }

    pub fn stop_progress(&mut self) {
        self.services.view.stop_progress();
    }

    pub fn set_info_text(&mut self, text: &str) {
        self.services.view.set_info_text(text);
    }

    pub fn notify(&mut self, message: &str) {
        self.services.view.notify(message);
    }

    /// Enters the post-upload presentation for the stored URL.
    pub fn show_post_upload(&mut self) {
        let url = self.image_url.clone().unwrap_or_default();
        self.services.view.show_result(&url);
    }

    pub fn open_url(&mut self) {
        let url = self.image_url.clone().unwrap_or_default();
        if url.is_empty() || !self.services.opener.open(&url) {
            self.notify(OPEN_FAILED_TEXT);
        }
    }

    pub fn copy_url(&mut self) {
        let url = self.image_url.clone().unwrap_or_default();
        match self.services.clipboard.set_text(&url) {
            Ok(()) => self.notify(URL_COPIED_TEXT),
            Err(e) => {
                log::warn!("[UPLOAD] Copying URL failed: {}", e);
                self.notify(COPY_FAILED_TEXT);
            }
        }
    }

    pub fn copy_image(&mut self) {
        let result = match self.capture.image() {
            Some(image) => self.services.clipboard.set_image(image),
            None => Err(ClipboardError::WriteFailed("empty capture".into())),
        };
        match result {
            Ok(()) => self.notify(IMAGE_COPIED_TEXT),
            Err(e) => {
                log::warn!("[UPLOAD] Copying image failed: {}", e);
                self.notify(COPY_FAILED_TEXT);
            }
        }
    }

    pub fn save_to_filesystem(&mut self) {
        if self.capture.is_empty() || !self.services.saver.save(&self.capture) {
            self.notify(SAVE_FAILED_TEXT);
            return;
        }
        self.notify(SAVED_TEXT);
    }

    /// Drag-export payload for the capture and its URL.
    pub fn drag_payload(&self) -> Result<DragPayload, CaptureError> {
        DragPayload::new(&self.capture, self.image_url.as_deref())
    }

    /// Enters `Uploading`, showing progress unless it already is.
    pub(crate) fn begin_upload(&mut self) {
        if self.state != UploadState::Uploading {
            self.state = UploadState::Uploading;
            self.start_progress();
            self.set_info_text(UPLOADING_TEXT);
        }
    }

    /// Copies text without user-facing feedback; failures are only logged.
    pub(crate) fn copy_text_quietly(&mut self, text: &str) {
        if let Err(e) = self.services.clipboard.set_text(text) {
            log::warn!("[UPLOAD] Could not copy URL to clipboard: {}", e);
        }
    }

    /// Terminal failure: progress stops, the message replaces the status.
    pub(crate) fn fail(&mut self, error: UploadError) {
        let message = error.to_string();
        log::warn!("[UPLOAD] {}", message);
        self.stop_progress();
        self.set_info_text(&message);
        self.state = UploadState::Failed { message };
    }

    /// Terminal success: stores URL and history name, shows the result view.
    pub(crate) fn succeed(&mut self, url: String, packed_name: String) {
        self.stop_progress();
        self.image_url = Some(url.clone());
        self.current_image_name = Some(packed_name);
        self.state = UploadState::Succeeded { url };
        self.show_post_upload();
    }

    fn ensure_unlocked(&self) -> Result<(), UploadError> {
        match self.state {
            UploadState::Succeeded { .. } => Err(UploadError::ResultLocked),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        progress: Vec<bool>,
        info: Vec<String>,
        results: Vec<String>,
        notes: Vec<String>,
        clipboard: Vec<String>,
        saves: usize,
    }

    type Log = Arc<Mutex<Seen>>;

    struct View(Log);
    impl UploadView for View {
        fn start_progress(&mut self) {
            self.0.lock().unwrap().progress.push(true);
        }
        fn stop_progress(&mut self) {
            self.0.lock().unwrap().progress.push(false);
        }
        fn set_info_text(&mut self, text: &str) {
            self.0.lock().unwrap().info.push(text.into());
        }
        fn show_result(&mut self, url: &str) {
            self.0.lock().unwrap().results.push(url.into());
        }
        fn notify(&mut self, message: &str) {
            self.0.lock().unwrap().notes.push(message.into());
        }
    }

    struct Clip(Log, bool);
    impl ClipboardSink for Clip {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if !self.1 {
                return Err(ClipboardError::Unavailable("no display".into()));
            }
            self.0.lock().unwrap().clipboard.push(text.into());
            Ok(())
        }
        fn set_image(&mut self, _image: &DynamicImage) -> Result<(), ClipboardError> {
            self.0.lock().unwrap().clipboard.push("<image>".into());
            Ok(())
        }
    }

    struct Opener(bool);
    impl UrlOpener for Opener {
        fn open(&mut self, _url: &str) -> bool {
            self.0
        }
    }

    struct Saver(Log);
    impl ScreenshotSaver for Saver {
        fn save(&mut self, _capture: &Capture) -> bool {
            self.0.lock().unwrap().saves += 1;
            true
        }
    }

    fn session(capture: Capture, clipboard_ok: bool, open_ok: bool) -> (UploadSession, Log) {
        let log = Log::default();
        let services = UploadServices {
            view: Box::new(View(log.clone())),
            clipboard: Box::new(Clip(log.clone(), clipboard_ok)),
            opener: Box::new(Opener(open_ok)),
            saver: Box::new(Saver(log.clone())),
            history: History::new(std::env::temp_dir().join("snip-upload-session-tests"), 5),
        };
        (UploadSession::new(capture, services), log)
    }

    fn capture() -> Capture {
        Capture::from_image(DynamicImage::ImageRgba8(RgbaImage::new(4, 4))).unwrap()
    }

    #[test]
    fn non_empty_capture_starts_uploading() {
        let (session, log) = session(capture(), true, true);
        assert_eq!(session.state(), &UploadState::Uploading);
        let seen = log.lock().unwrap();
        assert_eq!(seen.progress, vec![true]);
        assert_eq!(seen.info, vec![UPLOADING_TEXT.to_string()]);
    }

    #[test]
    fn empty_capture_stays_idle() {
        let (session, log) = session(Capture::empty(), true, true);
        assert_eq!(session.state(), &UploadState::Idle);
        assert!(log.lock().unwrap().progress.is_empty());
    }

    #[test]
    fn failure_stops_progress_and_shows_message() {
        let (mut session, log) = session(capture(), true, true);
        session.fail(UploadError::NotConfigured);

        assert!(session.state().is_terminal());
        let seen = log.lock().unwrap();
        assert_eq!(seen.progress, vec![true, false]);
        assert_eq!(seen.info.last().unwrap(), &UploadError::NotConfigured.to_string());
        assert!(seen.results.is_empty());
    }

    #[test]
    fn success_locks_url_and_capture() {
        let (mut session, log) = session(capture(), true, true);
        session.succeed("http://x/s/abc".into(), "custom~t~abc.png".into());

        assert_eq!(session.image_url(), Some("http://x/s/abc"));
        assert_eq!(session.current_image_name(), Some("custom~t~abc.png"));
        assert_eq!(log.lock().unwrap().results, vec!["http://x/s/abc".to_string()]);
        assert!(matches!(
            session.set_image_url("http://x/other"),
            Err(UploadError::ResultLocked)
        ));
        assert!(matches!(
            session.set_capture(Capture::empty()),
            Err(UploadError::ResultLocked)
        ));
        assert_eq!(session.image_url(), Some("http://x/s/abc"));
    }

    #[test]
    fn url_can_change_before_success() {
        let (mut session, _log) = session(capture(), true, true);
        session.set_image_url("http://x/a").unwrap();
        session.set_image_url("http://x/b").unwrap();
        assert_eq!(session.image_url(), Some("http://x/b"));
    }

    #[test]
    fn copy_and_open_report_through_notifications() {
        let (mut session, log) = session(capture(), true, false);
        session.succeed("http://x/s/abc".into(), "custom~t~abc.png".into());

        session.copy_url();
        session.copy_image();
        session.open_url();

        let seen = log.lock().unwrap();
        assert_eq!(seen.clipboard, vec!["http://x/s/abc".to_string(), "<image>".to_string()]);
        assert_eq!(
            seen.notes,
            vec![
                URL_COPIED_TEXT.to_string(),
                IMAGE_COPIED_TEXT.to_string(),
                OPEN_FAILED_TEXT.to_string(),
            ]
        );
    }

    #[test]
    fn copy_failure_is_reported() {
        let (mut session, log) = session(capture(), false, true);
        session.copy_text_quietly("http://x/quiet");
        session.copy_url();

        let seen = log.lock().unwrap();
        assert!(seen.clipboard.is_empty());
        assert_eq!(seen.notes, vec![COPY_FAILED_TEXT.to_string()]);
    }

    #[test]
    fn save_reports_outcome() {
        let (mut session, log) = session(capture(), true, true);
        session.save_to_filesystem();
        assert_eq!(log.lock().unwrap().saves, 1);
        assert_eq!(log.lock().unwrap().notes, vec![SAVED_TEXT.to_string()]);

        let (mut empty, log) = self::session(Capture::empty(), true, true);
        empty.save_to_filesystem();
        assert_eq!(log.lock().unwrap().saves, 0);
        assert_eq!(log.lock().unwrap().notes, vec![SAVE_FAILED_TEXT.to_string()]);
    }

    #[test]
    fn drag_payload_uses_result_url() {
        let (mut session, _log) = session(capture(), true, true);
        session.succeed("http://x/s/abc".into(), "custom~t~abc.png".into());
        let payload = session.drag_payload().unwrap();
        assert_eq!(payload.urls, vec!["http://x/s/abc".to_string()]);
    }
}
