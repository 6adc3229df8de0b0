//! Screen capture domain: public API.
//!
//! A `Capture` is the unit that gets uploaded: the raster image plus its PNG
//! serialization, encoded once when the capture is taken. Full-screen grabbing
//! through `xcap` lives in `screenshot` and is only compiled for the desktop
//! shell.

#[cfg(feature = "desktop")]
mod screenshot;

#[cfg(feature = "desktop")]
pub use screenshot::{capture_primary_monitor, ScreenshotError};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;

/// Edge length of the square preview attached to drag payloads.
pub const DRAG_PREVIEW_SIZE: u32 = 256;

/// A captured screenshot and its PNG bytes.
///
/// The default value is the empty capture, used when probing an uploader
/// without sending anything.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    image: Option<DynamicImage>,
    png: Vec<u8>,
}

impl Capture {
    /// Wraps an image and encodes it to PNG right away.
    pub fn from_image(image: DynamicImage) -> Result<Self, CaptureError> {
        let png = encode_png(&image)?;
        Ok(Self {
            image: Some(image),
            png,
        })
    }

    /// Decodes already-encoded image bytes (PNG from the webview, a file on
    /// disk). The stored serialization is always re-encoded as PNG.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, CaptureError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CaptureError::DecodingFailed(e.to_string()))?;
        Self::from_image(image)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// PNG bytes, or `None` for the empty capture.
    pub fn png_bytes(&self) -> Option<&[u8]> {
        self.image.as_ref().map(|_| self.png.as_slice())
    }

    /// Square preview filled and center-cropped to `size`, PNG encoded.
    pub fn preview_png(&self, size: u32) -> Result<Vec<u8>, CaptureError> {
        let image = self.image.as_ref().ok_or(CaptureError::Empty)?;
        let preview = image.resize_to_fill(size, size, FilterType::Triangle);
        encode_png(&preview)
    }
}

/// Encodes an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CaptureError> {
    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
    Ok(png_bytes)
}

/// A drag-and-drop export of an uploaded capture: the result URL as a
/// `text/uri-list` entry plus the image itself, base64 encoded for the
/// webview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub urls: Vec<String>,
    pub image_png: String,
    pub preview_png: String,
}

impl DragPayload {
    pub fn new(capture: &Capture, url: Option<&str>) -> Result<Self, CaptureError> {
        let png = capture.png_bytes().ok_or(CaptureError::Empty)?;
        let preview = capture.preview_png(DRAG_PREVIEW_SIZE)?;

        Ok(Self {
            urls: url.map(|u| vec![u.to_string()]).unwrap_or_default(),
            image_png: STANDARD.encode(png),
            preview_png: STANDARD.encode(preview),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No image in this capture")]
    Empty,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Image decoding failed: {0}")]
    DecodingFailed(String),
}
