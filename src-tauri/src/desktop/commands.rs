//! Tauri commands behind the upload window and the settings page.

use super::{desktop_services, start_upload, DesktopState, ViewSnapshot, UPLOAD_WINDOW};
use crate::capture::{Capture, DragPayload};
use crate::history::{History, HistoryEntry};
use crate::upload::Uploader;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tauri::{AppHandle, Manager};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSettingsView {
    pub provider: String,
    pub url: String,
    pub history_max: usize,
}

/// Tauri command: current provider and endpoint, read fresh from settings.
#[tauri::command]
pub async fn get_upload_settings(
    app: AppHandle,
    state: tauri::State<'_, DesktopState>,
    provider: Option<String>,
) -> Result<UploadSettingsView, String> {
    let mut manager = state.manager.lock().await;
    let name = provider.unwrap_or_else(|| manager.provider_name().to_string());
    let history_max = manager.history_max();

    let services = desktop_services(&app, state.snapshot.clone(), None, history_max);
    let probe = manager.uploader_for(&name, services).map_err(|e| e.to_string())?;

    Ok(UploadSettingsView {
        provider: probe.provider().to_string(),
        url: probe.endpoint().to_string(),
        history_max,
    })
}

/// Tauri command: store a new endpoint URL.
#[tauri::command]
pub fn set_upload_url(state: tauri::State<'_, DesktopState>, url: String) -> Result<(), String> {
    let mut settings = state.settings.load().map_err(|e| e.to_string())?;
    settings.custom_upload_url = url.trim().to_string();
    state.settings.save(&settings).map_err(|e| e.to_string())
}

/// Tauri command: upload a PNG handed over by the webview (base64).
#[tauri::command]
pub async fn upload_png(app: AppHandle, png_base64: String) -> Result<(), String> {
    let bytes = STANDARD
        .decode(png_base64.as_bytes())
        .map_err(|e| format!("Invalid base64 image: {}", e))?;
    let capture = Capture::from_encoded(&bytes).map_err(|e| e.to_string())?;
    start_upload(&app, capture).await
}

/// Tauri command: what the upload window should show right now.
#[tauri::command]
pub fn get_upload_view(state: tauri::State<'_, DesktopState>) -> Result<ViewSnapshot, String> {
    state
        .snapshot
        .lock()
        .map(|s| s.clone())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn open_upload_url(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    with_uploader(&state, |uploader| uploader.session_mut().open_url()).await
}

#[tauri::command]
pub async fn copy_upload_url(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    with_uploader(&state, |uploader| uploader.session_mut().copy_url()).await
}

#[tauri::command]
pub async fn copy_upload_image(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    with_uploader(&state, |uploader| uploader.session_mut().copy_image()).await
}

/// Tauri command: save the capture through a native save dialog.
///
/// The dialog blocks, so it runs on the blocking pool.
#[tauri::command]
pub async fn save_upload_image(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    let current = state.current.clone();
    tauri::async_runtime::spawn_blocking(move || {
        let mut guard = current.blocking_lock();
        let uploader = guard.as_mut().ok_or("No upload to save")?;
        uploader.session_mut().save_to_filesystem();
        Ok::<(), String>(())
    })
    .await
    .map_err(|e| e.to_string())?
}

#[tauri::command]
pub async fn delete_upload_image(state: tauri::State<'_, DesktopState>) -> Result<bool, String> {
    with_uploader(&state, |uploader| uploader.delete_current_image()).await
}

#[tauri::command]
pub async fn upload_drag_payload(
    state: tauri::State<'_, DesktopState>,
) -> Result<DragPayload, String> {
    with_uploader(&state, |uploader| uploader.session().drag_payload())
        .await?
        .map_err(|e| e.to_string())
}

/// Tauri command: stored uploads, newest first.
#[tauri::command]
pub async fn list_upload_history(
    state: tauri::State<'_, DesktopState>,
) -> Result<Vec<HistoryEntry>, String> {
    let history_max = state.manager.lock().await.history_max();
    History::new(History::default_dir(), history_max)
        .entries()
        .map_err(|e| e.to_string())
}

/// Tauri command: close the upload window and drop its uploader.
#[tauri::command]
pub async fn close_upload_window(
    app: AppHandle,
    state: tauri::State<'_, DesktopState>,
) -> Result<(), String> {
    if let Some(window) = app.get_webview_window(UPLOAD_WINDOW) {
        window.close().map_err(|e| e.to_string())?;
    }
    state.current.reset().await;
    Ok(())
}

async fn with_uploader<T>(
    state: &DesktopState,
    f: impl FnOnce(&mut Uploader) -> T,
) -> Result<T, String> {
    let mut guard = state.current.lock().await;
    let uploader = guard.as_mut().ok_or("No finished upload")?;
    Ok(f(uploader))
}
