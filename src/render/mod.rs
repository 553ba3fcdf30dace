//! Render dispatch: turns the visible part of a document into draw calls.
//!
//! ## Module Structure
//!
//! - [`catalog`] - An in-memory [`AssetProvider`] keyed by tileset and tile
//!
//! Layers are walked bottom to top (index 0 first) so later draws cover
//! earlier ones. Hidden layers are skipped. Within a layer, elements are drawn
//! in id order. Only elements touching the viewport's visible cells are
//! emitted. Tiles that cannot be resolved are drawn as placeholders and the
//! frame carries on.

mod catalog;

pub use catalog::TilesetCatalog;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use bevy::math::{Rect, Vec2};
use thiserror::Error;
use tracing::warn;

use crate::geometry::{Viewport, cell_rect_to_screen, cell_rect_to_world};
use crate::map::{ElementId, ElementSource, LayerId, MapDocument, Orientation, ShapeDescriptor};

/// Opaque handle to a resolved tile image, owned by the host's asset system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tile {tile} of tileset {tileset} not found")]
pub struct AssetNotFound {
    pub tileset: u32,
    pub tile: u32,
}

/// Resolves tile references to drawable assets
pub trait AssetProvider {
    fn resolve_asset(&self, tileset: u32, tile: u32) -> Result<AssetHandle, AssetNotFound>;
}

/// What to draw for one element
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRef {
    Tile(AssetHandle),
    Shape(ShapeDescriptor),
    /// Stand-in for a tile the provider could not resolve
    Placeholder { tileset: u32, tile: u32 },
}

impl AssetRef {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, AssetRef::Placeholder { .. })
    }
}

/// Drawing backend
pub trait Renderer {
    /// Draw `asset` into `dest` (screen pixels) with the given orientation
    fn draw_tile(&mut self, asset: &AssetRef, dest: Rect, orientation: Orientation);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub layer: LayerId,
    pub element: ElementId,
    pub asset: AssetRef,
    /// Destination rectangle in screen pixels
    pub dest: Rect,
    pub orientation: Orientation,
}

/// Counters for one dispatched frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub layers_drawn: usize,
    pub elements_drawn: usize,
    pub placeholders: usize,
}

/// Draw instructions for everything visible through `viewport`, in painter's order
pub fn collect_draw_instructions(
    doc: &MapDocument,
    viewport: &Viewport,
    assets: &impl AssetProvider,
) -> Vec<DrawInstruction> {
    let cell_size = doc.cell_size();
    let Some(visible) = viewport.visible_cells(cell_size, doc.bounds()) else {
        return Vec::new();
    };

    // Each tile is resolved (and reported missing) at most once per frame
    let mut resolved: HashMap<(u32, u32), AssetRef> = HashMap::new();
    let mut instructions = Vec::new();

    for layer in doc.layers().iter().filter(|layer| layer.visible) {
        for id in layer.store().query_region(&visible) {
            let Some(element) = layer.store().get(id) else {
                continue;
            };
            let asset = match &element.source {
                ElementSource::Shape(shape) => AssetRef::Shape(shape.clone()),
                ElementSource::Tile { tileset, tile } => {
                    match resolved.entry((*tileset, *tile)) {
                        Entry::Occupied(entry) => entry.get().clone(),
                        Entry::Vacant(entry) => entry
                            .insert(resolve(assets, *tileset, *tile))
                            .clone(),
                    }
                }
            };
            instructions.push(DrawInstruction {
                layer: layer.id(),
                element: id,
                asset,
                dest: cell_rect_to_screen(&element.footprint(), viewport, cell_size),
                orientation: element.orientation,
            });
        }
    }
    instructions
}

/// Send every visible element to `renderer`
pub fn dispatch(
    doc: &MapDocument,
    viewport: &Viewport,
    assets: &impl AssetProvider,
    renderer: &mut impl Renderer,
) -> DispatchStats {
    let instructions = collect_draw_instructions(doc, viewport, assets);
    let mut stats = DispatchStats::default();
    let mut last_layer = None;

    for instruction in &instructions {
        if last_layer != Some(instruction.layer) {
            stats.layers_drawn += 1;
            last_layer = Some(instruction.layer);
        }
        if instruction.asset.is_placeholder() {
            stats.placeholders += 1;
        }
        renderer.draw_tile(&instruction.asset, instruction.dest, instruction.orientation);
        stats.elements_drawn += 1;
    }
    stats
}

/// Viewport showing all of the document's content (or the whole map when it
/// is empty) in a panel of `screen_size`, for overview/minimap panels
pub fn overview_viewport(doc: &MapDocument, screen_size: Vec2) -> Viewport {
    let cells = doc.content_bounds().or_else(|| doc.bounds().as_rect());
    match cells {
        Some(cells) => Viewport::fit_to(cell_rect_to_world(&cells, doc.cell_size()), screen_size),
        None => Viewport::new(screen_size),
    }
}

fn resolve(assets: &impl AssetProvider, tileset: u32, tile: u32) -> AssetRef {
    match assets.resolve_asset(tileset, tile) {
        Ok(handle) => AssetRef::Tile(handle),
        Err(err) => {
            warn!("Drawing placeholder: {}", err);
            AssetRef::Placeholder { tileset, tile }
        }
    }
}
