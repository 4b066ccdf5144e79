//! Full-screen preview: pick what to show for an item and put images on screen
//!
//! The graphics decision is made once at startup and carried here in a
//! `GraphicsContext`. Images come from the cache when preloaded, otherwise
//! they are fetched synchronously on the render path.

use crate::cache::ImageCache;
use crate::engine::config::GraphicsConfig;
use crate::engine::error::TransportError;
use crate::rendering::capability::{fallback_notice, TerminalCapability};
use crate::rendering::codec::ImageAsset;
use crate::rendering::kitty::KittyTransport;
use crate::rendering::viewport::{CellMetrics, DisplayRegion};
use crate::storage::{ContentType, ItemMeta, Storage, StorageError};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Terminal graphics decision plus the transport configured for it
#[derive(Debug, Clone)]
pub struct GraphicsContext {
    capability: TerminalCapability,
    metrics: CellMetrics,
    transport: KittyTransport,
}

impl GraphicsContext {
    pub fn new(capability: TerminalCapability, config: &GraphicsConfig) -> Self {
        let metrics = CellMetrics::new(config.cell_width_px, config.cell_height_px);
        let transport = KittyTransport::new(metrics)
            .with_chunk_size(config.chunk_size)
            .with_scale_unit(config.scale);
        Self {
            capability,
            metrics,
            transport,
        }
    }

    pub fn capability(&self) -> TerminalCapability {
        self.capability
    }

    pub fn supports_graphics(&self) -> bool {
        self.capability.supports_graphics()
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    pub fn transport(&self) -> &KittyTransport {
        &self.transport
    }
}

/// What the preview pane shows for one item
#[derive(Debug, Clone)]
pub enum PreviewPlan {
    /// Text body or a notice in place of an image
    Text(String),
    /// Inline image with a one-line caption
    Image {
        asset: Arc<ImageAsset>,
        caption: String,
    },
}

impl PreviewPlan {
    pub fn is_image(&self) -> bool {
        matches!(self, PreviewPlan::Image { .. })
    }
}

/// Dimensions, format and size of an image; byte count alone when the
/// header was not recognized
pub fn image_caption(asset: &ImageAsset) -> String {
    match asset.info() {
        Some(info) => format!(
            "{}x{} {:?}, {} bytes",
            info.width,
            info.height,
            info.format,
            asset.len()
        ),
        None => format!("{} bytes, unrecognized format", asset.len()),
    }
}

/// Image bytes for `item`, from the cache or fetched synchronously. A fetched
/// image is cached at `index`.
pub fn load_asset<S>(
    cache: &ImageCache,
    store: &S,
    item: &ItemMeta,
    index: usize,
) -> Result<Arc<ImageAsset>, StorageError>
where
    S: Storage + ?Sized,
{
    if let Some(asset) = cache.get(&item.id) {
        return Ok(asset);
    }

    debug!(id = %item.id, "Cache miss on render, fetching synchronously");
    let (bytes, _) = store.fetch_full_bytes(&item.id)?;
    let asset = Arc::new(ImageAsset::decode(bytes));
    cache.insert(&item.id, index, Arc::clone(&asset));
    Ok(asset)
}

pub fn plan_preview<S>(
    ctx: &GraphicsContext,
    cache: &ImageCache,
    store: &S,
    item: &ItemMeta,
    index: usize,
) -> PreviewPlan
where
    S: Storage + ?Sized,
{
    if item.content_type == ContentType::Text {
        return match store.fetch_full_bytes(&item.id) {
            Ok((bytes, _)) => PreviewPlan::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => PreviewPlan::Text(format!("Failed to load {}: {e}", item.id)),
        };
    }

    match load_asset(cache, store, item, index) {
        Ok(asset) if ctx.supports_graphics() => {
            let caption = image_caption(&asset);
            PreviewPlan::Image { asset, caption }
        }
        Ok(asset) => PreviewPlan::Text(format!(
            "[image: {}]\n\n{}",
            image_caption(&asset),
            fallback_notice()
        )),
        Err(e) => PreviewPlan::Text(format!("Failed to load {}: {e}", item.id)),
    }
}

/// Cells covered by an image of `width` x `height` pixels, at most the region
fn footprint(width: u32, height: u32, metrics: CellMetrics, region: DisplayRegion) -> (u16, u16) {
    let cols = width.div_ceil(metrics.width_px.max(1)).max(1);
    let rows = height.div_ceil(metrics.height_px.max(1)).max(1);
    (
        cols.min(u32::from(region.cols)) as u16,
        rows.min(u32::from(region.rows)) as u16,
    )
}

/// Escape sequence placing `asset` into `region`, scaled down to fit and
/// keeping its aspect ratio. Empty when nothing can be shown.
pub fn image_sequence(ctx: &GraphicsContext, asset: &ImageAsset, region: DisplayRegion) -> String {
    if region.is_empty() || asset.is_empty() {
        return String::new();
    }

    let (max_width, max_height) = region.pixel_budget(ctx.metrics);
    let fitted = asset.fitted_to_budget(max_width, max_height);
    let (cols, rows) = match fitted.dimensions() {
        Some((width, height)) => footprint(width, height, ctx.metrics, region),
        None => (region.cols, region.rows),
    };
    ctx.transport.encode(fitted.bytes(), cols, rows)
}

/// Move to the region's top-left cell and transmit the image
pub fn render_image<W: Write>(
    ctx: &GraphicsContext,
    writer: &mut W,
    asset: &ImageAsset,
    region: DisplayRegion,
) -> Result<(), TransportError> {
    let sequence = image_sequence(ctx, asset, region);
    if sequence.is_empty() {
        return Ok(());
    }
    queue!(writer, MoveTo(region.x, region.y))?;
    KittyTransport::write_to(writer, &sequence)
}

/// The image currently composited on screen, if any.
///
/// Kitty keeps a placement until told otherwise, so whatever stops showing
/// an image has to go through `clear` before the list is drawn again.
#[derive(Debug, Default)]
pub struct ImagePlacement {
    shown: Option<(String, DisplayRegion)>,
}

impl ImagePlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_showing(&self) -> bool {
        self.shown.is_some()
    }

    /// Transmit `asset` into `region` unless it is already shown there.
    /// A different image or region replaces the old placement. Returns
    /// whether anything was written.
    pub fn show<W: Write>(
        &mut self,
        ctx: &GraphicsContext,
        writer: &mut W,
        id: &str,
        asset: &ImageAsset,
        region: DisplayRegion,
    ) -> Result<bool, TransportError> {
        if self
            .shown
            .as_ref()
            .is_some_and(|(shown, at)| shown == id && *at == region)
        {
            return Ok(false);
        }
        if self.shown.take().is_some() {
            KittyTransport::clear(writer)?;
        }
        render_image(ctx, writer, asset, region)?;
        self.shown = Some((id.to_string(), region));
        Ok(true)
    }

    /// Send the delete-all frame if an image may be on screen
    pub fn clear<W: Write>(&mut self, writer: &mut W) -> Result<bool, TransportError> {
        if self.shown.take().is_none() {
            return Ok(false);
        }
        KittyTransport::clear(writer)?;
        Ok(true)
    }
}
