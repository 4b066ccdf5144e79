//! Image measuring and aspect-preserving downscaling
//!
//! `measure` reads only the header. The `try_fit_*` functions report failures
//! as `CodecError`; the `fit_*` wrappers apply the display policy on top of
//! them: an image that cannot be resized is sent at its original size rather
//! than not at all.

use crate::engine::error::CodecError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header information of an encoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Result of a successful fit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fit {
    /// The image already fits; use the input bytes
    Unchanged,
    /// Resampled and re-encoded as PNG
    Resized(Vec<u8>),
}

/// Read dimensions and format from the image header
pub fn measure(bytes: &[u8]) -> Result<ImageInfo, CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| CodecError::Decode("unrecognized image format".to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    Ok(ImageInfo {
        width,
        height,
        format,
    })
}

/// Downscale so the image fits `max_width` x `max_height`, never upscaling.
///
/// `scale = min(max_w / w, max_h / h)`; with `scale >= 1` the input is left
/// alone, otherwise the image is bilinear-resampled to
/// `round(w * scale) x round(h * scale)`.
pub fn try_fit_to_budget(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
) -> Result<Fit, CodecError> {
    check_target(max_width, max_height)?;
    let info = measure(bytes)?;

    match budget_dimensions(info.width, info.height, max_width, max_height) {
        None => Ok(Fit::Unchanged),
        Some((width, height)) => {
            debug!(
                from_w = info.width,
                from_h = info.height,
                to_w = width,
                to_h = height,
                "Downscaling image to budget"
            );
            resample(bytes, info.format, width, height).map(Fit::Resized)
        }
    }
}

/// Resample to `width` x `height` without any aspect adjustment.
///
/// Used when the caller has already computed an aspect-correct target. Each
/// axis is capped at the source size, so nothing is ever upscaled; a target
/// at least as large as the source on both axes leaves the image alone.
pub fn try_fit_to_exact(bytes: &[u8], width: u32, height: u32) -> Result<Fit, CodecError> {
    check_target(width, height)?;
    let info = measure(bytes)?;

    let width = width.min(info.width);
    let height = height.min(info.height);
    if width == info.width && height == info.height {
        return Ok(Fit::Unchanged);
    }
    resample(bytes, info.format, width, height).map(Fit::Resized)
}

/// `try_fit_to_budget`, falling back to the original bytes on any failure
pub fn fit_to_budget(bytes: &[u8], max_width: u32, max_height: u32) -> Cow<'_, [u8]> {
    apply_fallback(bytes, try_fit_to_budget(bytes, max_width, max_height))
}

/// `try_fit_to_exact`, falling back to the original bytes on any failure
pub fn fit_to_exact(bytes: &[u8], width: u32, height: u32) -> Cow<'_, [u8]> {
    apply_fallback(bytes, try_fit_to_exact(bytes, width, height))
}

fn apply_fallback(bytes: &[u8], result: Result<Fit, CodecError>) -> Cow<'_, [u8]> {
    match result {
        Ok(Fit::Unchanged) => Cow::Borrowed(bytes),
        Ok(Fit::Resized(resized)) => Cow::Owned(resized),
        Err(err) => {
            warn!(%err, len = bytes.len(), "Image fit failed, keeping original bytes");
            Cow::Borrowed(bytes)
        }
    }
}

/// Encode a raw RGBA buffer (as handed out by the system clipboard) as PNG
pub fn encode_rgba_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>, CodecError> {
    let buffer = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        CodecError::Encode(format!("RGBA buffer does not match {width}x{height}"))
    })?;
    encode_png(&DynamicImage::ImageRgba8(buffer))
}

fn check_target(width: u32, height: u32) -> Result<(), CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::InvalidTarget { width, height });
    }
    Ok(())
}

/// Target size for a budget, or `None` when no downscale is needed.
/// Callers guarantee a non-zero budget.
fn budget_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }

    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));
    if scale >= 1.0 {
        return None;
    }

    let scaled_w = (f64::from(width) * scale).round() as u32;
    let scaled_h = (f64::from(height) * scale).round() as u32;
    Some((scaled_w.clamp(1, max_width), scaled_h.clamp(1, max_height)))
}

fn resample(bytes: &[u8], format: ImageFormat, width: u32, height: u32) -> Result<Vec<u8>, CodecError> {
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    let resized = image.resize_exact(width, height, FilterType::Triangle);
    encode_png(&resized)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Immutable image bytes plus whatever the header revealed.
///
/// Clones share the byte buffer. Resizing yields a new asset, so a reader
/// holding an asset never sees its bytes change.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    info: Option<ImageInfo>,
}

impl ImageAsset {
    /// Wrap bytes, measuring the header. Undecodable bytes are kept with
    /// unknown dimensions so they can still be transmitted as-is.
    pub fn decode(bytes: Vec<u8>) -> Self {
        let info = match measure(&bytes) {
            Ok(info) => Some(info),
            Err(err) => {
                debug!(%err, len = bytes.len(), "Image header not recognized");
                None
            }
        };
        Self {
            bytes: bytes.into(),
            info,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn info(&self) -> Option<ImageInfo> {
        self.info
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.info.map(|info| (info.width, info.height))
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.info.map(|info| info.format)
    }

    /// A copy fitted to the pixel budget; unknown dimensions skip scaling
    pub fn fitted_to_budget(&self, max_width: u32, max_height: u32) -> ImageAsset {
        if self.info.is_none() {
            return self.clone();
        }
        match try_fit_to_budget(&self.bytes, max_width, max_height) {
            Ok(Fit::Unchanged) => self.clone(),
            Ok(Fit::Resized(resized)) => ImageAsset::decode(resized),
            Err(err) => {
                warn!(%err, "Image fit failed, keeping original asset");
                self.clone()
            }
        }
    }
}
