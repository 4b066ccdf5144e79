use crate::engine::error::CodecError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard is empty")]
    Empty,

    #[error("Failed to encode clipboard image: {0}")]
    Encode(#[from] CodecError),

    #[error("Failed to store clipboard contents: {0}")]
    Store(#[from] StorageError),
}

/// Contents read from the system clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Text(String),
    /// PNG-encoded image
    Image(Vec<u8>),
}

pub mod clipboard;
