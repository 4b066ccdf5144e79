//! Clipboard history storage
//!
//! The image core only needs two things from storage: the full bytes of an
//! item, and the ordered list of item ids with their content type. Both
//! implementations are safe for concurrent reads from preload threads.

use std::io;
use thiserror::Error;

pub mod dir;
pub mod memory;

pub use dir::DirStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Image,
}

/// Listing entry for one history item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    pub id: String,
    pub content_type: ContentType,
}

impl ItemMeta {
    pub fn new(id: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            id: id.into(),
            content_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type == ContentType::Image
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Read access consumed by the image cache and render path
pub trait Storage: Send + Sync {
    fn fetch_full_bytes(&self, id: &str) -> Result<(Vec<u8>, ContentType), StorageError>;

    /// Items in display order, newest first
    fn list_meta(&self) -> Result<Vec<ItemMeta>, StorageError>;
}

/// Mutations the application performs on its history
pub trait HistoryStore: Storage {
    fn add_text(&self, text: &str) -> Result<ItemMeta, StorageError>;

    fn add_image(&self, bytes: &[u8]) -> Result<ItemMeta, StorageError>;

    fn remove(&self, id: &str) -> Result<(), StorageError>;
}
