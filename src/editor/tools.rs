use bevy::math::{IVec2, UVec2};

use crate::map::{ElementSource, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditorTool {
    #[default]
    Paint,
    Erase,
    Select,
}

impl EditorTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            EditorTool::Paint => "Paint (B)",
            EditorTool::Erase => "Erase (E)",
            EditorTool::Select => "Select (V)",
        }
    }

    pub fn all() -> &'static [EditorTool] {
        &[EditorTool::Paint, EditorTool::Erase, EditorTool::Select]
    }

    /// Returns true for tools that drag out strokes
    pub fn is_stroke_tool(&self) -> bool {
        matches!(self, EditorTool::Paint | EditorTool::Erase)
    }
}

/// What the paint tool places
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub source: ElementSource,
    /// Footprint of each painted element in cells
    pub size: UVec2,
    pub orientation: Orientation,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            source: ElementSource::default(),
            size: UVec2::ONE,
            orientation: Orientation::default(),
        }
    }
}

impl Brush {
    pub fn tile(tileset: u32, tile: u32) -> Self {
        Self {
            source: ElementSource::Tile { tileset, tile },
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size = size.max(UVec2::ONE);
        self
    }
}

/// One-cell step for keyboard nudges. Rows grow downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn offset(&self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}
