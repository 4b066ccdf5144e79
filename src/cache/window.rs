use std::ops::RangeInclusive;

/// Contiguous list indices `[center - radius, center + radius]`, clipped to
/// the list bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchWindow {
    pub start: usize,
    /// Inclusive
    pub end: usize,
}

impl PrefetchWindow {
    /// `None` for an empty list or a center past its end
    pub fn around(center: usize, radius: usize, len: usize) -> Option<Self> {
        if center >= len {
            return None;
        }
        Some(Self {
            start: center.saturating_sub(radius),
            end: center.saturating_add(radius).min(len - 1),
        })
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Number of indices covered; a window always covers its center
    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Index distance between two list positions
pub fn distance(a: usize, b: usize) -> usize {
    a.abs_diff(b)
}
