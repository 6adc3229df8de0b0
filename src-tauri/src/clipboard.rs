//! System clipboard backed by `arboard`.

use crate::upload::session::ClipboardSink;
use image::DynamicImage;
use std::borrow::Cow;

/// Opens the system clipboard per write; arboard handles are cheap and
/// holding one open blocks other apps on some platforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }

    fn set_image(&mut self, image: &DynamicImage) -> Result<(), ClipboardError> {
        let rgba = image.to_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);

        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_image(arboard::ImageData {
                width,
                height,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    WriteFailed(String),
}
