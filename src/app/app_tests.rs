use crate::app::mode::AppMode;
use crate::app::{App, AppEvent};
use crate::cache::ImageCache;
use crate::engine::config::CacheConfig;
use crate::input::Captured;
use crate::storage::{ContentType, MemoryStorage, Storage};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn app_with(len: usize) -> App<MemoryStorage> {
    let store = Arc::new(MemoryStorage::new());
    for i in 0..len {
        let content_type = if i % 5 == 4 {
            ContentType::Text
        } else {
            ContentType::Image
        };
        store.push(format!("item-{i}"), content_type, vec![i as u8; 4]);
    }
    let cache = ImageCache::new(store.clone(), &CacheConfig::default()).unwrap();
    App::new(store, cache).unwrap()
}

fn settle(app: &App<MemoryStorage>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.cache().in_flight() > 0 {
        assert!(Instant::now() < deadline, "preload did not finish");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_app_handle_event_quit() {
    let mut app = app_with(3);
    app.handle_event(AppEvent::Quit);
    assert_eq!(app.mode(), AppMode::Quit);
}

#[test]
fn test_cursor_is_clamped() {
    let mut app = app_with(3);
    app.move_cursor(-4);
    assert_eq!(app.cursor(), 0);
    app.move_cursor(10);
    assert_eq!(app.cursor(), 2);
    app.handle_event(AppEvent::Top);
    assert_eq!(app.cursor(), 0);
    app.handle_event(AppEvent::Bottom);
    assert_eq!(app.cursor(), 2);
}

#[test]
fn test_empty_history_is_navigable() {
    let mut app = app_with(0);
    app.handle_event(AppEvent::MoveDown);
    app.handle_event(AppEvent::OpenPreview);
    app.handle_event(AppEvent::Delete);
    assert_eq!(app.mode(), AppMode::List);
    assert_eq!(app.cursor(), 0);
    assert_eq!(app.status(), Some("History is empty"));
}

#[test]
fn test_startup_preloads_first_window() {
    let app = app_with(40);
    settle(&app);
    // Indices 0..=10 minus the text items at 4 and 9
    assert_eq!(app.cache().len(), 9);
    assert!(app.cache().contains("item-10"));
    assert!(!app.cache().contains("item-11"));
}

#[test]
fn test_moving_far_evicts_old_window() {
    let mut app = app_with(100);
    settle(&app);
    app.jump_to(60);
    settle(&app);

    assert!(!app.cache().contains("item-0"));
    for (id, index) in app.cache().snapshot() {
        assert!(index.abs_diff(60) <= 20, "{id} at {index} still cached");
    }
    assert!(app.cache().contains("item-60"));
}

#[test]
fn test_preview_pins_and_close_requests_clear() {
    let mut app = app_with(100);
    settle(&app);
    app.handle_event(AppEvent::OpenPreview);
    assert_eq!(app.mode(), AppMode::Preview);
    assert_eq!(app.cache().pinned().as_deref(), Some("item-0"));
    app.take_clear_request();

    app.handle_event(AppEvent::ClosePreview);
    assert_eq!(app.mode(), AppMode::List);
    assert_eq!(app.cache().pinned(), None);
    assert!(app.take_clear_request());
    assert!(!app.take_clear_request());
}

#[test]
fn test_preview_of_text_item_does_not_pin() {
    let mut app = app_with(10);
    app.jump_to(4);
    app.open_preview();
    assert_eq!(app.mode(), AppMode::Preview);
    assert_eq!(app.cache().pinned(), None);
}

#[test]
fn test_delete_current_invalidates_and_reloads() {
    let mut app = app_with(5);
    settle(&app);
    assert!(app.cache().contains("item-0"));

    app.handle_event(AppEvent::Delete);
    assert!(!app.cache().contains("item-0"));
    assert_eq!(app.items().len(), 4);
    assert_eq!(app.current().map(|m| m.id.as_str()), Some("item-1"));
    assert!(app.store().fetch_full_bytes("item-0").is_err());
}

#[test]
fn test_delete_last_item_moves_cursor_back() {
    let mut app = app_with(3);
    app.jump_to(2);
    app.delete_current().unwrap();
    assert_eq!(app.cursor(), 1);
}

#[test]
fn test_store_capture_selects_new_entry() {
    let mut app = app_with(3);
    app.jump_to(2);
    let revision = app.revision();

    let meta = app.store_capture(Captured::Text("fresh".into())).unwrap();
    assert_eq!(app.cursor(), 0);
    assert_eq!(app.current(), Some(&meta));
    assert_eq!(app.items().len(), 4);
    assert!(app.revision() > revision);
}
