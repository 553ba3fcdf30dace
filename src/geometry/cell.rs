//! Grid cells, inclusive cell rectangles and document bounds.

use bevy::math::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};

/// One grid unit in map space. `x` is the column, `y` the row; rows grow downward.
pub type Cell = IVec2;

/// Rectangle of cells with inclusive `min` and `max` corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub min: Cell,
    pub max: Cell,
}

impl CellRect {
    /// Build a rectangle from any two opposite corners
    pub fn from_corners(a: Cell, b: Cell) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn single(cell: Cell) -> Self {
        Self {
            min: cell,
            max: cell,
        }
    }

    /// Rectangle covering `size` cells starting at `origin`. A zero dimension is treated as 1.
    /// The far corner saturates at the edge of the `i32` range.
    pub fn from_origin_size(origin: Cell, size: UVec2) -> Self {
        let extent = (size.max(UVec2::ONE) - UVec2::ONE)
            .min(UVec2::splat(i32::MAX as u32))
            .as_ivec2();
        Self {
            min: origin,
            max: origin.saturating_add(extent),
        }
    }

    /// Columns covered, saturating at `u32::MAX`
    pub fn width(&self) -> u32 {
        span(self.min.x, self.max.x)
    }

    /// Rows covered, saturating at `u32::MAX`
    pub fn height(&self) -> u32 {
        span(self.min.y, self.max.y)
    }

    /// Number of cells covered
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    pub fn contains_rect(&self, other: &CellRect) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn intersect(&self, other: &CellRect) -> Option<CellRect> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.x <= max.x && min.y <= max.y).then_some(CellRect { min, max })
    }

    /// Shift by `delta`, saturating at the edge of the `i32` range
    pub fn translate(&self, delta: IVec2) -> Self {
        Self {
            min: self.min.saturating_add(delta),
            max: self.max.saturating_add(delta),
        }
    }

    /// Cells in row-major order (top row first, left to right)
    pub fn iter(&self) -> impl Iterator<Item = Cell> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec2::new(x, y)))
    }
}

fn span(min: i32, max: i32) -> u32 {
    (max as i64 - min as i64 + 1).clamp(0, u32::MAX as i64) as u32
}

/// Bounding size of a document, in cells. Valid cells are `0..width` × `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: u32,
    pub height: u32,
}

impl MapBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    pub fn contains_rect(&self, rect: &CellRect) -> bool {
        self.contains(rect.min) && self.contains(rect.max)
    }

    /// Return the cell unchanged if it lies inside the map, `OutOfBounds` otherwise
    pub fn check(&self, cell: Cell) -> EditResult<Cell> {
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(EditError::OutOfBounds { cell })
        }
    }

    /// Fail with the first cell of `rect` (row-major) that lies outside the map
    pub fn check_rect(&self, rect: &CellRect) -> EditResult<()> {
        if self.contains_rect(rect) {
            return Ok(());
        }
        // First outside cell in row-major order, found without walking the rect
        let cell = if !self.contains(rect.min) {
            rect.min
        } else if rect.max.x as i64 >= self.width as i64 {
            IVec2::new(self.width as i32, rect.min.y)
        } else {
            IVec2::new(rect.min.x, self.height as i32)
        };
        Err(EditError::OutOfBounds { cell })
    }

    /// The whole map as a cell rectangle, or `None` for an empty map
    pub fn as_rect(&self) -> Option<CellRect> {
        if self.is_empty() {
            return None;
        }
        Some(CellRect {
            min: IVec2::ZERO,
            max: IVec2::new(self.width as i32 - 1, self.height as i32 - 1),
        })
    }

    /// Clip `rect` to the map; `None` if they do not overlap
    pub fn clamp_rect(&self, rect: &CellRect) -> Option<CellRect> {
        self.as_rect()?.intersect(rect)
    }
}
