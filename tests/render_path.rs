use clipdeck::app::{App, AppEvent, AppMode};
use clipdeck::cache::ImageCache;
use clipdeck::engine::config::{CacheConfig, GraphicsConfig};
use clipdeck::rendering::capability::EnvSnapshot;
use clipdeck::rendering::codec::encode_rgba_png;
use clipdeck::rendering::{fallback_notice, CapabilityDetector, DisplayRegion, GraphicsMode, TerminalCapability};
use clipdeck::storage::{DirStorage, HistoryStore, Storage};
use clipdeck::ui::preview::{plan_preview, render_image, GraphicsContext, ImagePlacement, PreviewPlan};
use std::sync::Arc;

fn detector(pairs: &[(&str, &str)]) -> CapabilityDetector {
    CapabilityDetector::with_env(EnvSnapshot::from_pairs(pairs.iter().copied()))
}

fn store_with_image(width: u32, height: u32) -> (tempfile::TempDir, Arc<DirStorage>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirStorage::open(dir.path()).unwrap());
    let png = encode_rgba_png(width, height, vec![90; (width * height * 4) as usize]).unwrap();
    store.add_image(&png).unwrap();
    (dir, store)
}

#[test]
fn test_xterm_gets_text_fallback() {
    let capability = detector(&[("TERM", "xterm")]).resolve(GraphicsMode::Auto);
    assert_eq!(capability, TerminalCapability::Unsupported);

    let (_dir, store) = store_with_image(64, 32);
    let cache = ImageCache::new(store.clone(), &CacheConfig::default()).unwrap();
    let ctx = GraphicsContext::new(capability, &GraphicsConfig::default());
    let item = store.list_meta().unwrap().remove(0);

    match plan_preview(&ctx, &cache, store.as_ref(), &item, 0) {
        PreviewPlan::Text(text) => {
            assert!(text.contains("64x32"));
            assert!(text.contains(fallback_notice()));
        }
        PreviewPlan::Image { .. } => panic!("xterm must not get inline images"),
    }
}

#[test]
fn test_forced_mode_overrides_detection() {
    let kitty = detector(&[("TERM_PROGRAM", "kitty")]);
    assert_eq!(kitty.resolve(GraphicsMode::None), TerminalCapability::Unsupported);

    let xterm = detector(&[("TERM", "xterm-256color")]);
    assert_eq!(xterm.resolve(GraphicsMode::Kitty), TerminalCapability::KittyProtocol);
}

#[test]
fn test_kitty_render_from_directory_history() {
    let capability = detector(&[("TERM_PROGRAM", "WezTerm")]).resolve(GraphicsMode::Auto);
    let (_dir, store) = store_with_image(800, 400);
    let cache = ImageCache::new(store.clone(), &CacheConfig::default()).unwrap();
    let ctx = GraphicsContext::new(capability, &GraphicsConfig::default());
    let item = store.list_meta().unwrap().remove(0);
    assert!(item.id.ends_with(".png"));

    let PreviewPlan::Image { asset, caption } = plan_preview(&ctx, &cache, store.as_ref(), &item, 0) else {
        panic!("expected an image plan");
    };
    assert!(caption.starts_with("800x400 Png"));
    assert!(cache.contains(&item.id));

    let mut out = Vec::new();
    render_image(&ctx, &mut out, &asset, DisplayRegion::new(1, 1, 40, 20)).unwrap();
    let text = String::from_utf8(out).unwrap();

    // Budget 400x360 px: scaled to 400x200, 40x12 cells
    assert!(text.contains("\x1b_Ga=T,f=100,s=400,v=216,q=2,"));
    assert!(text.contains("m=0;"));
}

#[test]
fn test_leaving_preview_deletes_shown_image() {
    let (_dir, store) = store_with_image(64, 64);
    let cache = ImageCache::new(store.clone(), &CacheConfig::default()).unwrap();
    let ctx = GraphicsContext::new(TerminalCapability::KittyProtocol, &GraphicsConfig::default());
    let mut app = App::new(store, cache).unwrap();
    let mut placement = ImagePlacement::new();

    app.handle_event(AppEvent::OpenPreview);
    assert_eq!(app.mode(), AppMode::Preview);
    let item = app.current().cloned().unwrap();
    let PreviewPlan::Image { asset, .. } = plan_preview(&ctx, app.cache(), app.store(), &item, app.cursor()) else {
        panic!("expected an image plan");
    };
    let mut out = Vec::new();
    placement
        .show(&ctx, &mut out, &item.id, &asset, DisplayRegion::new(0, 0, 40, 20))
        .unwrap();
    assert!(!out.is_empty());

    app.handle_event(AppEvent::ClosePreview);
    assert_eq!(app.mode(), AppMode::List);
    assert!(app.take_clear_request());

    let mut out = Vec::new();
    placement.clear(&mut out).unwrap();
    assert_eq!(out, b"\x1b_Ga=d,d=A\x1b\\");
}
