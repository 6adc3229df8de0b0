//! Tauri shell: the upload window and the collaborators behind it.
//!
//! The webview is a thin view: it listens for `upload-*` events and calls
//! the commands in [`commands`]. Everything it shows is also mirrored into a
//! `ViewSnapshot` so a window that finishes loading after a fast failure can
//! still ask what happened. `upload-ready` follows `upload-complete` once the
//! finished uploader is reachable by the commands.

pub mod commands;

use crate::capture::Capture;
use crate::clipboard::SystemClipboard;
use crate::config::SettingsFile;
use crate::history::History;
use crate::placement::{top_right_position, ScreenArea, WINDOW_MAX_HEIGHT, WINDOW_MIN_WIDTH};
use crate::upload::session::{ScreenshotSaver, UploadView, UrlOpener, UPLOADING_TEXT};
use crate::upload::{
    LatestUpload, Ticket, UploadServices, UploadState, Uploader, UploaderManager,
};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_shell::ShellExt;
use tokio::sync::Mutex;

pub const UPLOAD_WINDOW: &str = "upload";

/// What the upload window currently shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub progress: bool,
    pub info: String,
    pub url: Option<String>,
    /// Set once the finished uploader is available to the commands.
    pub ready: bool,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            progress: true,
            info: UPLOADING_TEXT.to_string(),
            url: None,
            ready: false,
        }
    }
}

/// Shell state managed by Tauri.
pub struct DesktopState {
    pub settings: SettingsFile,
    /// Only held while an uploader is being prepared, never across a
    /// network call.
    pub manager: Arc<Mutex<UploaderManager>>,
    /// The finished uploader behind the window; dropped with the window.
    pub current: Arc<LatestUpload<Uploader>>,
    pub snapshot: Arc<std::sync::Mutex<ViewSnapshot>>,
}

impl DesktopState {
    pub fn new(settings: SettingsFile) -> Self {
        let manager = UploaderManager::new(Arc::new(settings.clone()));
        Self {
            settings,
            manager: Arc::new(Mutex::new(manager)),
            current: Arc::new(LatestUpload::new()),
            snapshot: Arc::new(std::sync::Mutex::new(ViewSnapshot::default())),
        }
    }
}

/// Opens the upload window and runs the upload in the background.
///
/// A new upload supersedes any upload still in flight: the older one keeps
/// running to completion, but its view updates and its result are dropped.
pub async fn start_upload(app: &AppHandle, capture: Capture) -> Result<(), String> {
    let state = app.state::<DesktopState>();
    let ticket = state.current.begin().await;
    if let Ok(mut snapshot) = state.snapshot.lock() {
        *snapshot = ViewSnapshot::default();
    }
    show_upload_window(app).map_err(|e| format!("Failed to open upload window: {}", e))?;

    let manager = state.manager.clone();
    let current = state.current.clone();
    let snapshot = state.snapshot.clone();
    let snapshot_ready = state.snapshot.clone();
    let app = app.clone();

    tauri::async_runtime::spawn(async move {
        let mut uploader = {
            let mut manager = manager.lock().await;
            let history_max = manager.history_max();
            let services = desktop_services(&app, snapshot, Some(ticket), history_max);
            manager.prepare(capture, services)
        };

        if !uploader.session().capture().is_empty() {
            uploader.upload().await;
        }

        let succeeded = matches!(uploader.state(), UploadState::Succeeded { .. });
        if !current.finish(ticket, uploader).await {
            log::info!("[UPLOAD] Dropping result of a superseded upload");
            return;
        }
        if succeeded && current.is_current(ticket) {
            if let Ok(mut snapshot) = snapshot_ready.lock() {
                snapshot.ready = true;
            }
            if let Err(e) = app.emit("upload-ready", ()) {
                log::warn!("[UPLOAD] Failed to emit upload-ready: {}", e);
            }
        }
    });

    Ok(())
}

/// Collaborators for an uploader driven by the window. Without a ticket the
/// view stays silent, which is what settings probes want.
pub(crate) fn desktop_services(
    app: &AppHandle,
    snapshot: Arc<std::sync::Mutex<ViewSnapshot>>,
    ticket: Option<Ticket>,
    history_max: usize,
) -> UploadServices {
    let state = app.state::<DesktopState>();
    UploadServices {
        view: Box::new(WebviewView {
            app: app.clone(),
            snapshot,
            latest: state.current.clone(),
            ticket,
        }),
        clipboard: Box::new(SystemClipboard),
        opener: Box::new(ShellOpener { app: app.clone() }),
        saver: Box::new(DialogSaver { app: app.clone() }),
        history: History::new(History::default_dir(), history_max),
    }
}

/// Shows the upload window, creating it at the top-right of the primary
/// monitor if needed.
pub fn show_upload_window(app: &AppHandle) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(UPLOAD_WINDOW) {
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    let mut builder = WebviewWindowBuilder::new(
        app,
        UPLOAD_WINDOW,
        WebviewUrl::App("upload.html".into()),
    )
    .title("Upload image")
    .inner_size(WINDOW_MIN_WIDTH as f64, WINDOW_MAX_HEIGHT as f64)
    .min_inner_size(WINDOW_MIN_WIDTH as f64, 40.0)
    .max_inner_size(4096.0, WINDOW_MAX_HEIGHT as f64)
    .always_on_top(true)
    .skip_taskbar(true)
    .focused(true);

    if let Some((x, y)) = top_right_logical(app) {
        builder = builder.position(x, y);
    }

    builder.build()?;
    Ok(())
}

fn top_right_logical(app: &AppHandle) -> Option<(f64, f64)> {
    let monitor = app.primary_monitor().ok().flatten()?;
    let scale = monitor.scale_factor();
    let area = ScreenArea {
        x: monitor.position().x,
        y: monitor.position().y,
        width: monitor.size().width,
        height: monitor.size().height,
    };
    let width = (WINDOW_MIN_WIDTH as f64 * scale).round() as u32;
    let (x, y) = top_right_position(area, width);
    Some((x as f64 / scale, y as f64 / scale))
}

struct WebviewView {
    app: AppHandle,
    snapshot: Arc<std::sync::Mutex<ViewSnapshot>>,
    latest: Arc<LatestUpload<Uploader>>,
    ticket: Option<Ticket>,
}

impl WebviewView {
    /// Whether this view still belongs to the upload the window shows.
    fn is_live(&self) -> bool {
        self.ticket.is_some_and(|t| self.latest.is_current(t))
    }

    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) {
        if !self.is_live() {
            return;
        }
        if let Err(e) = self.app.emit(event, payload) {
            log::warn!("[UPLOAD] Failed to emit {}: {}", event, e);
        }
    }

    fn update(&self, f: impl FnOnce(&mut ViewSnapshot)) {
        if !self.is_live() {
            return;
        }
        if let Ok(mut snapshot) = self.snapshot.lock() {
            f(&mut snapshot);
        }
    }
}

impl UploadView for WebviewView {
    fn start_progress(&mut self) {
        self.update(|s| s.progress = true);
        self.emit("upload-progress", true);
    }

    fn stop_progress(&mut self) {
        self.update(|s| s.progress = false);
        self.emit("upload-progress", false);
    }

    fn set_info_text(&mut self, text: &str) {
        self.update(|s| s.info = text.to_string());
        self.emit("upload-status", text.to_string());
    }

    fn show_result(&mut self, url: &str) {
        self.update(|s| {
            s.progress = false;
            s.url = Some(url.to_string());
        });
        self.emit("upload-complete", url.to_string());
        if !self.is_live() {
            return;
        }
        if let Some(window) = self.app.get_webview_window(UPLOAD_WINDOW) {
            let _ = window.show();
            let _ = window.set_focus();
        }
    }

    fn notify(&mut self, message: &str) {
        self.emit("upload-notification", message.to_string());
    }
}

struct ShellOpener {
    app: AppHandle,
}

impl UrlOpener for ShellOpener {
    fn open(&mut self, url: &str) -> bool {
        #[allow(deprecated)]
        let result = self.app.shell().open(url, None);
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[UPLOAD] Failed to open {}: {}", url, e);
                false
            }
        }
    }
}

struct DialogSaver {
    app: AppHandle,
}

impl ScreenshotSaver for DialogSaver {
    fn save(&mut self, capture: &Capture) -> bool {
        let Some(bytes) = capture.png_bytes() else {
            return false;
        };

        let default_name = format!("screenshot_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        let Some(target) = self
            .app
            .dialog()
            .file()
            .add_filter("PNG image", &["png"])
            .set_file_name(default_name)
            .blocking_save_file()
        else {
            log::info!("[UPLOAD] Save dialog cancelled");
            return false;
        };

        let path = match target.into_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("[UPLOAD] Save target is not a local path: {}", e);
                return false;
            }
        };

        match std::fs::write(&path, bytes) {
            Ok(()) => {
                log::info!("[UPLOAD] Screenshot saved to {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("[UPLOAD] Failed to write {}: {}", path.display(), e);
                false
            }
        }
    }
}
