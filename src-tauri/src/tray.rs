//! System tray setup and click handler.
//!
//! The tray icon is the primary entry point: clicking it grabs the primary
//! monitor and uploads the screenshot.

use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::TrayIconBuilder,
    AppHandle,
};

/// Sets up the system tray icon with a click handler.
///
/// Left-click: capture and upload.
/// Right-click: context menu with Quit.
pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let quit_item = MenuItemBuilder::with_id("quit", "Quit Snip Upload").build(app)?;
    let menu = MenuBuilder::new(app).item(&quit_item).build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("Snip Upload: click to capture and upload")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                log::info!("Tray icon clicked, capturing screen for upload");
                capture_and_upload(tray_icon.app_handle().clone());
            }
        })
        .on_menu_event(|app, event| {
            if event.id() == "quit" {
                log::info!("Quit requested from tray menu");
                app.exit(0);
            }
        })
        .build(app)?;

    Ok(())
}

/// Grabs the primary monitor off the UI thread, then hands the capture to
/// the upload window.
fn capture_and_upload(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let start = std::time::Instant::now();
        let captured =
            tauri::async_runtime::spawn_blocking(crate::capture::capture_primary_monitor).await;

        let capture = match captured {
            Ok(Ok(capture)) => capture,
            Ok(Err(e)) => {
                log::error!("Screen capture failed: {}", e);
                return;
            }
            Err(e) => {
                log::error!("Screen capture task failed: {}", e);
                return;
            }
        };
        log::info!("Screen captured and encoded in {}ms", start.elapsed().as_millis());

        if let Err(e) = crate::desktop::start_upload(&app, capture).await {
            log::error!("Failed to start upload: {}", e);
        }
    });
}
