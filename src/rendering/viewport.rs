//! Cell-to-pixel geometry for inline images
//!
//! Terminals only report their cell size in pixels through a query/response
//! round trip, which the render path never waits for. Image budgets are
//! therefore derived from fixed per-cell estimates that slightly undershoot
//! common fonts, so a fitted image stays inside its character region.

use ratatui::layout::Rect;

/// Assumed pixel size of one terminal cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width_px: u32,
    pub height_px: u32,
}

impl CellMetrics {
    pub const DEFAULT: CellMetrics = CellMetrics {
        width_px: 10,
        height_px: 18,
    };

    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Convert a size in cells to pixels
    pub fn cells_to_pixels(&self, cols: u16, rows: u16) -> (u32, u32) {
        (
            u32::from(cols) * self.width_px,
            u32::from(rows) * self.height_px,
        )
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Character region an image is placed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRegion {
    /// Column of the top-left cell (0-based)
    pub x: u16,
    /// Row of the top-left cell (0-based)
    pub y: u16,
    pub cols: u16,
    pub rows: u16,
}

impl DisplayRegion {
    pub fn new(x: u16, y: u16, cols: u16, rows: u16) -> Self {
        Self { x, y, cols, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Largest pixel size an image may have to fit the region
    pub fn pixel_budget(&self, metrics: CellMetrics) -> (u32, u32) {
        metrics.cells_to_pixels(self.cols, self.rows)
    }
}

impl From<Rect> for DisplayRegion {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics() {
        let metrics = CellMetrics::default();
        assert_eq!(metrics.width_px, 10);
        assert_eq!(metrics.height_px, 18);
    }

    #[test]
    fn test_cells_to_pixels() {
        let metrics = CellMetrics::default();
        assert_eq!(metrics.cells_to_pixels(80, 24), (800, 432));
        assert_eq!(metrics.cells_to_pixels(0, 0), (0, 0));
    }

    #[test]
    fn test_region_from_rect() {
        let region = DisplayRegion::from(Rect::new(2, 3, 40, 10));
        assert_eq!(region, DisplayRegion::new(2, 3, 40, 10));
        assert_eq!(region.pixel_budget(CellMetrics::new(8, 16)), (320, 160));
    }

    #[test]
    fn test_zero_sized_region_is_empty() {
        assert!(DisplayRegion::new(0, 0, 0, 5).is_empty());
        assert!(DisplayRegion::new(0, 0, 5, 0).is_empty());
        assert!(!DisplayRegion::new(0, 0, 1, 1).is_empty());
    }
}
