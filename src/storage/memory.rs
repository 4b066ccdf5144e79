use super::{ContentType, HistoryStore, ItemMeta, Storage, StorageError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// In-memory history, newest first. Individual ids can be made to fail on
/// fetch, and fetches are counted.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<Vec<(ItemMeta, Vec<u8>)>>,
    failing: RwLock<HashSet<String>>,
    fetches: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an item at the front of the list
    pub fn insert(&self, id: impl Into<String>, content_type: ContentType, bytes: Vec<u8>) -> ItemMeta {
        let meta = ItemMeta::new(id, content_type);
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.retain(|(existing, _)| existing.id != meta.id);
        items.insert(0, (meta.clone(), bytes));
        meta
    }

    /// Append an item at the end of the list
    pub fn push(&self, id: impl Into<String>, content_type: ContentType, bytes: Vec<u8>) -> ItemMeta {
        let meta = ItemMeta::new(id, content_type);
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.retain(|(existing, _)| existing.id != meta.id);
        items.push((meta.clone(), bytes));
        meta
    }

    /// Make every fetch of `id` fail with `Unavailable`
    pub fn fail_on(&self, id: &str) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn generated_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Storage for MemoryStorage {
    fn fetch_full_bytes(&self, id: &str) -> Result<(Vec<u8>, ContentType), StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
        {
            return Err(StorageError::Unavailable(format!("injected failure for {id}")));
        }

        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(meta, _)| meta.id == id)
            .map(|(meta, bytes)| (bytes.clone(), meta.content_type))
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn list_meta(&self) -> Result<Vec<ItemMeta>, StorageError> {
        Ok(self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(meta, _)| meta.clone())
            .collect())
    }
}

impl HistoryStore for MemoryStorage {
    fn add_text(&self, text: &str) -> Result<ItemMeta, StorageError> {
        let id = self.generated_id("text");
        Ok(self.insert(id, ContentType::Text, text.as_bytes().to_vec()))
    }

    fn add_image(&self, bytes: &[u8]) -> Result<ItemMeta, StorageError> {
        let id = self.generated_id("image");
        Ok(self.insert(id, ContentType::Image, bytes.to_vec()))
    }

    fn remove(&self, id: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|(meta, _)| meta.id != id);
        if items.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
