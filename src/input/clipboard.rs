use super::{Captured, ClipboardError};
use crate::rendering::codec;
use crate::storage::{HistoryStore, ItemMeta};
use arboard::Clipboard;
use tracing::{debug, info};

/// Read the current clipboard contents, preferring an image over text
pub fn read() -> Result<Captured, ClipboardError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

    match clipboard.get_image() {
        Ok(image) => {
            let png = codec::encode_rgba_png(
                image.width as u32,
                image.height as u32,
                image.bytes.into_owned(),
            )?;
            debug!(width = image.width, height = image.height, "Read image from clipboard");
            return Ok(Captured::Image(png));
        }
        Err(arboard::Error::ContentNotAvailable) => {}
        Err(e) => debug!(error = %e, "Clipboard image read failed, trying text"),
    }

    match clipboard.get_text() {
        Ok(text) if text.is_empty() => Err(ClipboardError::Empty),
        Ok(text) => Ok(Captured::Text(text)),
        Err(arboard::Error::ContentNotAvailable) => Err(ClipboardError::Empty),
        Err(e) => Err(ClipboardError::Unavailable(e.to_string())),
    }
}

/// Append captured contents to the history
pub fn store_captured<S>(store: &S, captured: Captured) -> Result<ItemMeta, ClipboardError>
where
    S: HistoryStore + ?Sized,
{
    let meta = match captured {
        Captured::Text(text) => store.add_text(&text)?,
        Captured::Image(png) => store.add_image(&png)?,
    };
    info!(id = %meta.id, kind = ?meta.content_type, "Captured clipboard entry");
    Ok(meta)
}

/// Read the clipboard and store whatever it holds
pub fn capture_into<S>(store: &S) -> Result<ItemMeta, ClipboardError>
where
    S: HistoryStore + ?Sized,
{
    store_captured(store, read()?)
}
