//! Proximity-bounded image cache
//!
//! Holds decoded image assets only for history items near the list cursor.
//! Cursor movement schedules a background preload of the window around the
//! cursor and synchronously evicts entries that drifted beyond the eviction
//! distance. Overlapping preloads are unordered: inserts are idempotent, and a
//! stale preload that lands after the cursor moved on is removed by the next
//! eviction pass.
//!
//! All state lives behind one mutex shared by the render path, the event loop
//! and the preload threads. Storage I/O and header decoding happen outside it.
//! A panic while loading one item is contained to that item: it becomes a
//! cache miss and the worker moves on.

use super::window::{distance, PrefetchWindow};
use super::CacheError;
use crate::engine::config::CacheConfig;
use crate::rendering::codec::ImageAsset;
use crate::storage::{ContentType, ItemMeta, Storage, StorageError};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// A cached asset and the list index it was last seen at
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub asset: Arc<ImageAsset>,
    pub index: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Queued ids and the generation they were queued under
    queued: HashMap<String, u64>,
    /// Loads scheduled but not yet finished, including ones whose queue
    /// marker was dropped by an invalidation
    running: usize,
    pinned: Option<String>,
    /// Bumped by every invalidation
    generation: u64,
    /// Generation at which each id was last invalidated
    invalidated_at: HashMap<String, u64>,
}

impl CacheState {
    fn invalidated_since(&self, id: &str, generation: u64) -> bool {
        self.invalidated_at
            .get(id)
            .is_some_and(|&invalidated| invalidated > generation)
    }

    /// Drop the queue marker for `id` unless a newer preload re-queued it
    fn finish(&mut self, id: &str, generation: u64) {
        if self.queued.get(id) == Some(&generation) {
            self.queued.remove(id);
        }
        self.running = self.running.saturating_sub(1);
    }
}

type LoadOutcome = Result<Option<ImageAsset>, StorageError>;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

struct Shared {
    state: Mutex<CacheState>,
    storage: Arc<dyn Storage>,
    pool: rayon::ThreadPool,
    radius: usize,
    eviction_distance: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(&self, id: &str) -> LoadOutcome {
        match self.storage.fetch_full_bytes(id)? {
            (bytes, ContentType::Image) => Ok(Some(ImageAsset::decode(bytes))),
            (_, ContentType::Text) => Ok(None),
        }
    }

    /// Fetch and decode one item, then publish it unless it was invalidated
    /// while the fetch was running
    fn load(&self, id: &str, index: usize, generation: u64) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.fetch(id))) {
            Ok(outcome) => self.publish(id, index, generation, outcome),
            Err(payload) => {
                warn!(item = id, panic = panic_message(payload.as_ref()), "Image preload panicked");
                self.lock().finish(id, generation);
            }
        }
    }

    fn publish(&self, id: &str, index: usize, generation: u64, outcome: LoadOutcome) {
        let mut state = self.lock();
        state.finish(id, generation);
        match outcome {
            Ok(Some(asset)) => {
                if state.invalidated_since(id, generation) {
                    debug!(item = id, "Dropping preload of invalidated item");
                    return;
                }
                trace!(item = id, index, len = asset.len(), "Preloaded image");
                state.entries.insert(
                    id.to_string(),
                    CacheEntry {
                        asset: Arc::new(asset),
                        index,
                    },
                );
            }
            Ok(None) => debug!(item = id, "Item is no longer an image, skipping"),
            Err(err) => warn!(item = id, %err, "Image preload failed"),
        }
    }
}

/// Shared handle to the image cache; clones refer to the same cache
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Shared>,
}

impl ImageCache {
    pub fn new(storage: Arc<dyn Storage>, config: &CacheConfig) -> Result<Self, CacheError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("clipdeck-preload-{i}"))
            .panic_handler(|payload| {
                warn!(panic = panic_message(payload.as_ref()), "Preload worker panicked");
            })
            .build()?;

        Ok(Self {
            inner: Arc::new(Shared {
                state: Mutex::new(CacheState::default()),
                storage,
                pool,
                radius: config.radius,
                eviction_distance: config.eviction_distance,
            }),
        })
    }

    pub fn radius(&self) -> usize {
        self.inner.radius
    }

    pub fn eviction_distance(&self) -> usize {
        self.inner.eviction_distance
    }

    /// Schedule a background fetch of every uncached image in the window
    /// around `center`. Returns immediately; nearest items load first.
    pub fn preload_window(&self, center: usize, items: &[ItemMeta]) {
        let Some(window) = PrefetchWindow::around(center, self.inner.radius, items.len()) else {
            return;
        };

        let (generation, mut todo) = {
            let mut state = self.inner.lock();
            let todo: Vec<(String, usize)> = window
                .indices()
                .filter_map(|index| {
                    let item = &items[index];
                    let wanted = item.is_image()
                        && !state.entries.contains_key(&item.id)
                        && !state.queued.contains_key(&item.id);
                    wanted.then(|| (item.id.clone(), index))
                })
                .collect();
            let generation = state.generation;
            for (id, _) in &todo {
                state.queued.insert(id.clone(), generation);
            }
            state.running += todo.len();
            (generation, todo)
        };

        if todo.is_empty() {
            return;
        }
        todo.sort_by_key(|(_, index)| distance(*index, center));
        debug!(center, count = todo.len(), "Scheduling image preload");

        let shared = Arc::clone(&self.inner);
        self.inner.pool.spawn(move || {
            for (id, index) in todo {
                shared.load(&id, index, generation);
            }
        });
    }

    /// Drop entries for images further than the eviction distance from
    /// `center`, and entries whose item left `items`. The pinned item stays.
    pub fn evict(&self, center: usize, items: &[ItemMeta]) {
        let positions: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_image())
            .map(|(index, item)| (item.id.as_str(), index))
            .collect();
        let max_distance = self.inner.eviction_distance;

        let mut state = self.inner.lock();
        let pinned = state.pinned.clone();
        let before = state.entries.len();

        state.entries.retain(|id, entry| {
            if pinned.as_deref() == Some(id.as_str()) {
                return true;
            }
            match positions.get(id.as_str()) {
                Some(&index) => {
                    entry.index = index;
                    distance(index, center) <= max_distance
                }
                None => false,
            }
        });

        if state.running == 0 {
            state.invalidated_at.clear();
        }

        let evicted = before - state.entries.len();
        if evicted > 0 {
            debug!(center, evicted, remaining = state.entries.len(), "Evicted cached images");
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ImageAsset>> {
        self.inner
            .lock()
            .entries
            .get(id)
            .map(|entry| Arc::clone(&entry.asset))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().entries.contains_key(id)
    }

    /// Store an asset fetched outside the preload path
    pub fn insert(&self, id: &str, index: usize, asset: Arc<ImageAsset>) {
        self.inner
            .lock()
            .entries
            .insert(id.to_string(), CacheEntry { asset, index });
    }

    /// Forget `id` after an edit or delete. A preload of `id` that is still
    /// running will discard its result, and the next window may queue it
    /// again right away.
    pub fn force_invalidate(&self, id: &str) {
        let mut state = self.inner.lock();
        state.generation += 1;
        let generation = state.generation;
        state.invalidated_at.insert(id.to_string(), generation);
        state.queued.remove(id);
        if state.entries.remove(id).is_some() {
            debug!(item = id, "Invalidated cached image");
        }
    }

    /// Keep `id` cached regardless of the cursor (full-screen preview)
    pub fn pin(&self, id: &str) {
        self.inner.lock().pinned = Some(id.to_string());
    }

    pub fn unpin(&self) {
        self.inner.lock().pinned = None;
    }

    pub fn pinned(&self) -> Option<String> {
        self.inner.lock().pinned.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads scheduled or running
    pub fn in_flight(&self) -> usize {
        self.inner.lock().running
    }

    /// Cached ids with the index they were last seen at
    pub fn snapshot(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.index))
            .collect();
        entries.sort_by_key(|(_, index)| *index);
        entries
    }
}
