use std::fmt;

use bevy::math::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{Cell, CellRect};

/// Document-unique identifier of a placed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Triangle,
}

/// Vector shape drawn directly from its description, no asset lookup needed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub color: [f32; 4],
    #[serde(default)]
    pub stroke_width: f32,
}

impl Default for ShapeDescriptor {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Rectangle,
            color: [1.0, 1.0, 1.0, 1.0],
            stroke_width: 0.0,
        }
    }
}

/// What an element shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementSource {
    /// A tile from a tileset, resolved through the asset provider at draw time
    Tile { tileset: u32, tile: u32 },
    Shape(ShapeDescriptor),
}

impl Default for ElementSource {
    fn default() -> Self {
        ElementSource::Tile {
            tileset: 0,
            tile: 0,
        }
    }
}

impl ElementSource {
    pub fn is_tile(&self) -> bool {
        matches!(self, ElementSource::Tile { .. })
    }
}

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn clockwise(&self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Orientation {
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
}

/// A placed map entity.
///
/// The element occupies `size` cells starting at `origin` (its top-left cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub origin: Cell,
    pub size: UVec2,
    pub source: ElementSource,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Element {
    /// Single-cell element with default orientation
    pub fn new(id: ElementId, origin: Cell, source: ElementSource) -> Self {
        Self {
            id,
            origin,
            size: UVec2::ONE,
            source,
            orientation: Orientation::default(),
        }
    }

    pub fn tile(id: ElementId, origin: Cell, tileset: u32, tile: u32) -> Self {
        Self::new(id, origin, ElementSource::Tile { tileset, tile })
    }

    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size = size.max(UVec2::ONE);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn footprint(&self) -> CellRect {
        CellRect::from_origin_size(self.origin, self.size)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        self.footprint().iter()
    }

    /// Copy of this element shifted by `delta` cells, saturating at the edge of
    /// the `i32` range
    pub fn translated(&self, delta: IVec2) -> Self {
        Self {
            origin: self.origin.saturating_add(delta),
            ..self.clone()
        }
    }
}
