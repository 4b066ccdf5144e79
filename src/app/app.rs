use super::event::AppEvent;
use super::mode::AppMode;
use crate::cache::ImageCache;
use crate::input::{clipboard, Captured, ClipboardError};
use crate::storage::{HistoryStore, ItemMeta, StorageError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// History list state shared by the event loop and the renderer
pub struct App<S: HistoryStore + 'static> {
    store: Arc<S>,
    cache: ImageCache,
    items: Vec<ItemMeta>,
    cursor: usize,
    mode: AppMode,
    status: Option<String>,
    /// Set when something stopped showing an image; the renderer must send
    /// the delete-all frame before drawing the list again
    clear_requested: bool,
    /// Bumped whenever the item list is re-read from storage
    revision: u64,
}

impl<S: HistoryStore + 'static> App<S> {
    pub fn new(store: Arc<S>, cache: ImageCache) -> Result<Self, StorageError> {
        let items = store.list_meta()?;
        let mut app = Self {
            store,
            cache,
            items,
            cursor: 0,
            mode: AppMode::List,
            status: None,
            clear_requested: false,
            revision: 0,
        };
        app.refresh_cache();
        Ok(app)
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn items(&self) -> &[ItemMeta] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&ItemMeta> {
        self.items.get(self.cursor)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Returns true once per pending delete-all request
    pub fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }

    /// Move the cursor by `delta`, clamped to the list
    pub fn move_cursor(&mut self, delta: isize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        let target = self.cursor.saturating_add_signed(delta).min(last);
        self.select(target);
    }

    pub fn jump_to(&mut self, index: usize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        self.select(index.min(last));
    }

    fn select(&mut self, index: usize) {
        if index == self.cursor {
            return;
        }
        self.cursor = index;
        if self.mode == AppMode::Preview {
            self.repin();
        }
        self.refresh_cache();
    }

    /// Evict inline, then refresh the prefetch window in the background
    fn refresh_cache(&self) {
        self.cache.evict(self.cursor, &self.items);
        self.cache.preload_window(self.cursor, &self.items);
    }

    fn repin(&mut self) {
        match self.current() {
            Some(item) if item.is_image() => self.cache.pin(&item.id),
            _ => self.cache.unpin(),
        }
        self.clear_requested = true;
    }

    pub fn open_preview(&mut self) {
        if self.items.is_empty() {
            self.set_status("History is empty");
            return;
        }
        self.mode = AppMode::Preview;
        self.repin();
    }

    pub fn close_preview(&mut self) {
        if self.mode != AppMode::Preview {
            return;
        }
        self.mode = AppMode::List;
        self.cache.unpin();
        self.clear_requested = true;
        self.cache.evict(self.cursor, &self.items);
    }

    /// Remove the item under the cursor from storage and the cache
    pub fn delete_current(&mut self) -> Result<(), StorageError> {
        let Some(item) = self.current().cloned() else {
            return Ok(());
        };
        self.close_preview();
        self.store.remove(&item.id)?;
        self.cache.force_invalidate(&item.id);
        info!(id = %item.id, "Deleted history entry");
        self.reload()?;
        self.set_status(format!("Deleted {}", item.id));
        Ok(())
    }

    /// Re-read the list from storage, keeping the cursor in range
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.items = self.store.list_meta()?;
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
        self.revision += 1;
        debug!(items = self.items.len(), cursor = self.cursor, "Reloaded history");
        self.refresh_cache();
        Ok(())
    }

    /// Store captured contents as the newest entry and select it
    pub fn store_capture(&mut self, captured: Captured) -> Result<ItemMeta, ClipboardError> {
        let meta = clipboard::store_captured(self.store.as_ref(), captured)?;
        self.reload()?;
        if let Some(index) = self.items.iter().position(|item| item.id == meta.id) {
            self.jump_to(index);
        }
        Ok(meta)
    }

    pub fn capture_clipboard(&mut self) -> Result<ItemMeta, ClipboardError> {
        let captured = clipboard::read()?;
        self.store_capture(captured)
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::MoveUp => self.move_cursor(-1),
            AppEvent::MoveDown => self.move_cursor(1),
            AppEvent::Top => self.jump_to(0),
            AppEvent::Bottom => self.jump_to(usize::MAX),
            AppEvent::OpenPreview => self.open_preview(),
            AppEvent::ClosePreview => self.close_preview(),
            AppEvent::Delete => {
                if let Err(e) = self.delete_current() {
                    warn!(error = %e, "Delete failed");
                    self.set_status(format!("Delete failed: {e}"));
                }
            }
            AppEvent::Capture => match self.capture_clipboard() {
                Ok(meta) => self.set_status(format!("Captured {}", meta.id)),
                Err(e) => {
                    warn!(error = %e, "Clipboard capture failed");
                    self.set_status(format!("Capture failed: {e}"));
                }
            },
            AppEvent::Reload => match self.reload() {
                Ok(()) => self.set_status(format!("{} items", self.items.len())),
                Err(e) => self.set_status(format!("Reload failed: {e}")),
            },
            AppEvent::Quit => {
                self.close_preview();
                self.mode = AppMode::Quit;
            }
            AppEvent::None => {}
        }
    }
}
