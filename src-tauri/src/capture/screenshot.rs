//! Full-screen capture using the `xcap` crate.
//!
//! This is the infrastructure layer that talks to the OS. Only the tray
//! flow of the desktop shell calls it.

use super::{Capture, CaptureError};
use image::DynamicImage;
use xcap::Monitor;

/// Captures the primary monitor and wraps it as an upload-ready `Capture`.
pub fn capture_primary_monitor() -> Result<Capture, ScreenshotError> {
    let monitors =
        Monitor::all().map_err(|e| ScreenshotError::MonitorEnumeration(e.to_string()))?;

    let mut fallback = None;
    let mut primary = None;
    for monitor in monitors {
        if monitor.is_primary().unwrap_or(false) {
            primary = Some(monitor);
            break;
        }
        if fallback.is_none() {
            fallback = Some(monitor);
        }
    }

    // Some compositors report no primary monitor; take the first one.
    let monitor = primary.or(fallback).ok_or(ScreenshotError::NoMonitor)?;

    let image = monitor
        .capture_image()
        .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;

    Ok(Capture::from_image(DynamicImage::ImageRgba8(image))?)
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitor found")]
    NoMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error(transparent)]
    Encoding(#[from] CaptureError),
}
