//! Snip Upload: screenshot uploader.
//!
//! The library holds the upload domain and can be used without a GUI:
//! - Capture value and PNG encoding (capture/)
//! - Upload providers, response parsing, per-upload session (upload/)
//! - Upload history on disk (history.rs)
//! - Settings file and environment override (config.rs)
//!
//! With the `desktop` feature it also builds the Tauri shell: tray icon,
//! upload window and the commands the webview calls.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod placement;
pub mod upload;

#[cfg(feature = "desktop")]
pub mod desktop;
#[cfg(feature = "desktop")]
mod tray;

/// Entry point, called by the desktop binary.
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use config::SettingsFile;
    use desktop::commands;

    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is the normal case.
        if !e.not_found() {
            eprintln!("Ignoring malformed .env: {}", e);
        }
    }
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(desktop::DesktopState::new(SettingsFile::new(
            SettingsFile::default_path(),
        )))
        .invoke_handler(tauri::generate_handler![
            commands::get_upload_settings,
            commands::set_upload_url,
            commands::upload_png,
            commands::get_upload_view,
            commands::open_upload_url,
            commands::copy_upload_url,
            commands::copy_upload_image,
            commands::save_upload_image,
            commands::delete_upload_image,
            commands::upload_drag_payload,
            commands::list_upload_history,
            commands::close_upload_window,
        ])
        .setup(|app| {
            log::info!("Snip Upload starting up");

            tray::setup_tray(app.handle())?;

            log::info!("System tray initialized, ready for snips");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Snip Upload");
}
