use clipdeck::cache::{distance, ImageCache};
use clipdeck::engine::config::CacheConfig;
use clipdeck::storage::{ContentType, ItemMeta, MemoryStorage, Storage};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn history(len: usize) -> (Arc<MemoryStorage>, Vec<ItemMeta>) {
    let store = Arc::new(MemoryStorage::new());
    for i in 0..len {
        store.push(format!("clip-{i:03}"), ContentType::Image, vec![i as u8; 16]);
    }
    let items = store.list_meta().unwrap();
    (store, items)
}

fn wait_idle(cache: &ImageCache) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while cache.in_flight() > 0 {
        assert!(Instant::now() < deadline, "preload did not finish");
        thread::sleep(Duration::from_millis(5));
    }
}

fn indices(cache: &ImageCache) -> Vec<usize> {
    cache.snapshot().into_iter().map(|(_, index)| index).collect()
}

#[test]
fn test_cursor_five_then_fifty() {
    let (store, items) = history(100);
    let cache = ImageCache::new(store, &CacheConfig::default()).unwrap();

    cache.evict(5, &items);
    cache.preload_window(5, &items);
    wait_idle(&cache);
    assert_eq!(indices(&cache), (0..=15).collect::<Vec<_>>());

    cache.evict(50, &items);
    cache.preload_window(50, &items);
    wait_idle(&cache);
    assert_eq!(indices(&cache), (40..=60).collect::<Vec<_>>());
    for index in indices(&cache) {
        assert!((30..=70).contains(&index));
    }
}

#[test]
fn test_entries_stay_within_eviction_distance() {
    let (store, items) = history(200);
    let config = CacheConfig {
        radius: 4,
        eviction_distance: 8,
        workers: 3,
    };
    let cache = ImageCache::new(store, &config).unwrap();

    // Deterministic jumpy walk over the list
    let mut cursor = 0usize;
    let mut seed = 0x2545_F491u32;
    for _ in 0..60 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let step = (seed % 15) as isize - 7;
        cursor = cursor.saturating_add_signed(step).min(items.len() - 1);

        cache.evict(cursor, &items);
        cache.preload_window(cursor, &items);
        wait_idle(&cache);
        cache.evict(cursor, &items);

        for (id, index) in cache.snapshot() {
            assert!(
                distance(index, cursor) <= config.eviction_distance,
                "{id} at {index} kept with cursor at {cursor}"
            );
        }
        assert!(cache.len() <= 2 * config.eviction_distance + 1);
    }
}

#[test]
fn test_pinned_entry_outlives_the_window() {
    let (store, items) = history(100);
    let cache = ImageCache::new(store, &CacheConfig::default()).unwrap();
    cache.preload_window(0, &items);
    wait_idle(&cache);

    cache.pin("clip-002");
    cache.evict(80, &items);
    cache.preload_window(80, &items);
    wait_idle(&cache);

    assert!(cache.get("clip-002").is_some());
    assert!(cache.get("clip-001").is_none());
    assert!(cache.get("clip-080").is_some());
}

#[test]
fn test_storage_failures_are_cache_misses() {
    let (store, items) = history(10);
    store.fail_on("clip-003");
    let cache = ImageCache::new(store.clone(), &CacheConfig::default()).unwrap();

    cache.preload_window(3, &items);
    wait_idle(&cache);

    assert!(cache.get("clip-003").is_none());
    assert_eq!(cache.len(), 9);
}
