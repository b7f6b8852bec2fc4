//! Column width bounds

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Column id -> width in pixels.
pub type ColumnSizing = BTreeMap<String, u32>;

/// Default column width when a column declares none.
pub const DEFAULT_COLUMN_SIZE: u32 = 150;
/// Narrowest width a column may be resized to.
pub const DEFAULT_MIN_COLUMN_SIZE: u32 = 20;
/// Widest width a column may be resized to.
pub const DEFAULT_MAX_COLUMN_SIZE: u32 = 1000;

/// Declared size of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    /// Initial width.
    pub size: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            size: DEFAULT_COLUMN_SIZE,
            min: DEFAULT_MIN_COLUMN_SIZE,
            max: DEFAULT_MAX_COLUMN_SIZE,
        }
    }
}

impl SizeBounds {
    /// Bounds with the given initial width and default limits.
    pub fn sized(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
        .normalized()
    }

    /// Sets the minimum width.
    pub fn with_min(mut self, min: u32) -> Self {
        self.min = min;
        self.normalized()
    }

    /// Sets the maximum width.
    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self.normalized()
    }

    /// Clamps a requested width into `[min, max]`.
    pub fn clamp(&self, width: u32) -> u32 {
        width.clamp(self.min, self.max.max(self.min))
    }

    fn normalized(mut self) -> Self {
        if self.max < self.min {
            self.max = self.min;
        }
        self.size = self.clamp(self.size);
        self
    }
}

/// Initial width map derived from each column's declared size.
pub fn default_sizing<'a>(columns: impl IntoIterator<Item = (&'a str, SizeBounds)>) -> ColumnSizing {
    columns
        .into_iter()
        .map(|(id, bounds)| (id.to_string(), bounds.size))
        .collect()
}
