//! The map document: layers, bounds, grid and edit history.

use bevy::prelude::*;
use tracing::{debug, info};

use crate::config::EditorConfigData;
use crate::constants::{DEFAULT_CELL_SIZE, DEFAULT_LAYER_NAME, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
use crate::editor::history::{Change, Command, CommandKind, CommandStack, MAX_HISTORY_SIZE};
use crate::error::{EditError, EditResult};
use crate::geometry::{CellRect, MapBounds};

use super::element::{Element, ElementId};
use super::layer::{Layer, LayerId};
use super::layer_stack::LayerStack;

/// A layered 2D map being edited.
///
/// The document always has at least one layer and a positive cell size. All
/// content changes go through the command stack, so they can be undone.
#[derive(Resource, Debug, Clone)]
pub struct MapDocument {
    pub name: String,
    cell_size: f32,
    layers: LayerStack,
    history: CommandStack,
    /// Exclusivity given to layers created with [`MapDocument::add_layer`]
    exclusive_by_default: bool,
    next_layer_id: u32,
    next_element_id: u64,
    dirty: bool,
}

impl Default for MapDocument {
    fn default() -> Self {
        let first = Layer::new(LayerId(1), DEFAULT_LAYER_NAME, true);
        Self {
            name: "Untitled Map".to_string(),
            cell_size: DEFAULT_CELL_SIZE,
            layers: LayerStack::new(MapBounds::new(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT), first),
            history: CommandStack::new(MAX_HISTORY_SIZE),
            exclusive_by_default: true,
            next_layer_id: 2,
            next_element_id: 1,
            dirty: false,
        }
    }
}

impl MapDocument {
    /// New document with a single exclusive layer
    pub fn new(name: impl Into<String>, bounds: MapBounds, cell_size: f32) -> EditResult<Self> {
        validate_geometry(bounds, cell_size)?;
        Ok(Self {
            name: name.into(),
            cell_size,
            layers: LayerStack::new(bounds, Layer::new(LayerId(1), DEFAULT_LAYER_NAME, true)),
            ..Self::default()
        })
    }

    /// New document using the sizes, history depth and layer mode from config
    pub fn from_config(config: &EditorConfigData) -> EditResult<Self> {
        let bounds = MapBounds::new(config.default_map_width, config.default_map_height);
        validate_geometry(bounds, config.default_cell_size)?;
        Ok(Self {
            cell_size: config.default_cell_size,
            layers: LayerStack::new(
                bounds,
                Layer::new(LayerId(1), DEFAULT_LAYER_NAME, config.exclusive_layers),
            ),
            history: CommandStack::new(config.history_depth),
            exclusive_by_default: config.exclusive_layers,
            ..Self::default()
        })
    }

    /// Rebuild a document from validated layers (used by persistence)
    pub(crate) fn from_layers(
        name: String,
        cell_size: f32,
        layers: LayerStack,
        history_depth: usize,
    ) -> Self {
        let next_layer_id = layers.iter().map(|l| l.id().0).max().unwrap_or(0) + 1;
        let next_element_id = layers
            .iter()
            .flat_map(|l| l.elements().map(|e| e.id.0))
            .max()
            .unwrap_or(0)
            + 1;
        let exclusive_by_default = layers.at(0).is_none_or(Layer::is_exclusive);
        Self {
            name,
            cell_size,
            layers,
            history: CommandStack::new(history_depth),
            exclusive_by_default,
            next_layer_id,
            next_element_id,
            dirty: false,
        }
    }

    pub fn bounds(&self) -> MapBounds {
        self.layers.bounds()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> EditResult<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Topmost layer; a document is never without one
    pub fn top_layer_id(&self) -> LayerId {
        self.layers.top().map(Layer::id).unwrap_or(LayerId(1))
    }

    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    pub fn set_history_depth(&mut self, depth: usize) {
        self.history.set_max_depth(depth);
    }

    pub fn exclusive_by_default(&self) -> bool {
        self.exclusive_by_default
    }

    pub fn set_exclusive_by_default(&mut self, exclusive: bool) {
        self.exclusive_by_default = exclusive;
    }

    pub fn find_element(&self, id: ElementId) -> Option<(LayerId, &Element)> {
        self.layers.find_element(id)
    }

    pub fn element_count(&self) -> usize {
        self.layers.element_count()
    }

    /// Smallest cell rectangle covering every element on every layer
    pub fn content_bounds(&self) -> Option<CellRect> {
        self.layers
            .iter()
            .flat_map(Layer::elements)
            .map(Element::footprint)
            .reduce(|a, b| CellRect {
                min: a.min.min(b.min),
                max: a.max.max(b.max),
            })
    }

    /// Returns true if the document changed since it was created, loaded or saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Reserve a fresh element id. Ids are never reused within a session.
    pub(crate) fn allocate_element_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;
        id
    }

    fn allocate_layer_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }

    // ---- Command stack ----

    /// Apply and record a command
    pub fn execute(&mut self, command: Command) -> EditResult<()> {
        self.history.execute(command, &mut self.layers)?;
        self.dirty = true;
        Ok(())
    }

    pub fn undo(&mut self) -> EditResult<CommandKind> {
        let kind = self.history.undo(&mut self.layers)?;
        self.dirty = true;
        Ok(kind)
    }

    pub fn redo(&mut self) -> EditResult<CommandKind> {
        let kind = self.history.redo(&mut self.layers)?;
        self.dirty = true;
        Ok(kind)
    }

    // ---- Layer manager ----

    /// Add an empty layer on top; it takes the document's default exclusivity
    pub fn add_layer(&mut self, name: impl Into<String>) -> EditResult<LayerId> {
        let exclusive = self.exclusive_by_default;
        self.add_layer_with(name, exclusive)
    }

    pub fn add_layer_with(&mut self, name: impl Into<String>, exclusive: bool) -> EditResult<LayerId> {
        let id = self.allocate_layer_id();
        let layer = Layer::new(id, name, exclusive);
        let index = self.layers.len();
        self.execute(Command::new(
            CommandKind::AddLayer,
            id,
            Change::InsertLayer { index, layer },
        ))?;
        info!("Added layer {}", id);
        Ok(id)
    }

    /// Remove a layer and its elements. The last remaining layer cannot be removed.
    pub fn remove_layer(&mut self, id: LayerId) -> EditResult<()> {
        let index = self.layers.index_of(id)?;
        if self.layers.len() <= 1 {
            return Err(EditError::LastLayer);
        }
        let layer = self.layers.get(id)?.clone();
        self.execute(Command::new(
            CommandKind::RemoveLayer,
            id,
            Change::DeleteLayer { index, layer },
        ))?;
        info!("Removed layer {}", id);
        Ok(())
    }

    /// Copy a layer (with fresh element ids) directly above the original
    pub fn duplicate_layer(&mut self, id: LayerId) -> EditResult<LayerId> {
        let index = self.layers.index_of(id)?;
        let source = self.layers.get(id)?.clone();
        let new_id = self.allocate_layer_id();
        let name = format!("{} copy", source.name);
        let copy = source.duplicate(new_id, name, || self.allocate_element_id())?;
        self.execute(Command::new(
            CommandKind::DuplicateLayer,
            new_id,
            Change::InsertLayer {
                index: index + 1,
                layer: copy,
            },
        ))?;
        info!("Duplicated layer {} as {}", id, new_id);
        Ok(new_id)
    }

    /// Move a layer to `new_index` (clamped), shifting the others.
    ///
    /// Returns the index the layer ended up at.
    pub fn reorder(&mut self, id: LayerId, new_index: usize) -> EditResult<usize> {
        let from = self.layers.index_of(id)?;
        let to = new_index.min(self.layers.len() - 1);
        if from == to {
            return Ok(to);
        }
        self.execute(Command::new(
            CommandKind::ReorderLayer,
            id,
            Change::MoveLayer { layer: id, from, to },
        ))?;
        debug!("Moved layer {} from {} to {}", id, from, to);
        Ok(to)
    }

    /// Move a layer one step up; no-op when it is already on top
    pub fn move_layer_forward(&mut self, id: LayerId) -> EditResult<usize> {
        let index = self.layers.index_of(id)?;
        self.reorder(id, index + 1)
    }

    /// Move a layer one step down; no-op when it is already at the bottom
    pub fn move_layer_backward(&mut self, id: LayerId) -> EditResult<usize> {
        let index = self.layers.index_of(id)?;
        self.reorder(id, index.saturating_sub(1))
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> EditResult<()> {
        let name = name.into();
        let before = self.layers.get(id)?.name.clone();
        if before == name {
            return Ok(());
        }
        self.execute(Command::new(
            CommandKind::RenameLayer,
            id,
            Change::RenameLayer {
                layer: id,
                before,
                after: name,
            },
        ))
    }

    /// Switch the one-element-per-cell rule. Enabling fails with `CellOccupied`
    /// while any cell of the layer is shared.
    pub fn set_exclusive(&mut self, id: LayerId, exclusive: bool) -> EditResult<()> {
        let layer = self.layers.get(id)?;
        if layer.is_exclusive() == exclusive {
            return Ok(());
        }
        if exclusive {
            layer.store().clone().set_exclusive(true)?;
        }
        self.execute(Command::new(
            CommandKind::SetExclusive,
            id,
            Change::SetExclusive {
                layer: id,
                before: !exclusive,
                after: exclusive,
            },
        ))
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> EditResult<()> {
        let layer = self.layers.get_mut(id)?;
        if layer.visible != visible {
            layer.visible = visible;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> EditResult<()> {
        let layer = self.layers.get_mut(id)?;
        if layer.locked != locked {
            layer.locked = locked;
            self.dirty = true;
        }
        Ok(())
    }

    /// Full consistency check of every layer's cell index and element bounds
    pub fn check_integrity(&self) -> EditResult<()> {
        self.layers.check_integrity()
    }
}

fn validate_geometry(bounds: MapBounds, cell_size: f32) -> EditResult<()> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(EditError::InvalidArgument(format!(
            "cell size must be positive, got {cell_size}"
        )));
    }
    if bounds.is_empty() {
        return Err(EditError::InvalidArgument(format!(
            "map size must be non-zero, got {}x{}",
            bounds.width, bounds.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::history::ElementDelta;
    use bevy::math::IVec2;

    fn ids(doc: &MapDocument) -> Vec<LayerId> {
        doc.layers().iter().map(Layer::id).collect()
    }

    fn paint(doc: &mut MapDocument, layer: LayerId, x: i32, y: i32) -> ElementId {
        let id = doc.allocate_element_id();
        let element = Element::tile(id, IVec2::new(x, y), 0, 1);
        doc.execute(Command::elements(
            CommandKind::Paint,
            ElementDelta::new(layer, vec![], vec![element]),
        ))
        .unwrap();
        id
    }

    #[test]
    fn test_default_document() {
        let doc = MapDocument::default();
        assert_eq!(doc.name, "Untitled Map");
        assert_eq!(doc.layer_count(), 1);
        assert_eq!(doc.cell_size(), DEFAULT_CELL_SIZE);
        assert_eq!(doc.bounds(), MapBounds::new(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT));
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_new_rejects_bad_geometry() {
        assert!(matches!(
            MapDocument::new("m", MapBounds::new(4, 4), 0.0),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            MapDocument::new("m", MapBounds::new(4, 4), f32::NAN),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            MapDocument::new("m", MapBounds::new(0, 4), 16.0),
            Err(EditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = EditorConfigData {
            default_map_width: 10,
            default_map_height: 20,
            default_cell_size: 48.0,
            history_depth: 7,
            exclusive_layers: false,
            ..EditorConfigData::default()
        };
        let doc = MapDocument::from_config(&config).unwrap();
        assert_eq!(doc.bounds(), MapBounds::new(10, 20));
        assert_eq!(doc.cell_size(), 48.0);
        assert_eq!(doc.history().max_depth(), 7);
        assert!(!doc.layers().at(0).unwrap().is_exclusive());
        assert!(!doc.exclusive_by_default());
    }

    #[test]
    fn test_add_layer_appends_on_top() {
        let mut doc = MapDocument::default();
        let id = doc.add_layer("Objects").unwrap();
        assert_eq!(doc.top_layer_id(), id);
        assert_eq!(doc.layers().index_of(id), Ok(1));
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_remove_last_layer_fails() {
        let mut doc = MapDocument::default();
        let only = doc.top_layer_id();
        assert_eq!(doc.remove_layer(only), Err(EditError::LastLayer));
        assert_eq!(ids(&doc), vec![only]);
    }

    #[test]
    fn test_remove_missing_layer() {
        let mut doc = MapDocument::default();
        assert_eq!(
            doc.remove_layer(LayerId(99)),
            Err(EditError::LayerNotFound { layer: LayerId(99) })
        );
    }

    #[test]
    fn test_remove_layer_undo_restores_content_and_position() {
        let mut doc = MapDocument::default();
        let bottom = doc.top_layer_id();
        let middle = doc.add_layer("middle").unwrap();
        let top = doc.add_layer("top").unwrap();
        let element = paint(&mut doc, middle, 2, 2);
        let before = doc.layers().clone();

        doc.remove_layer(middle).unwrap();
        assert_eq!(ids(&doc), vec![bottom, top]);
        assert!(doc.find_element(element).is_none());

        doc.undo().unwrap();
        assert_eq!(doc.layers(), &before);
    }

    #[test]
    fn test_reorder_clamps_index() {
        let mut doc = MapDocument::default();
        let a = doc.top_layer_id();
        let b = doc.add_layer("b").unwrap();
        let c = doc.add_layer("c").unwrap();

        assert_eq!(doc.reorder(a, 99), Ok(2));
        assert_eq!(ids(&doc), vec![b, c, a]);

        assert_eq!(doc.reorder(a, 0), Ok(0));
        assert_eq!(ids(&doc), vec![a, b, c]);
    }

    #[test]
    fn test_reorder_same_index_records_nothing() {
        let mut doc = MapDocument::default();
        let a = doc.top_layer_id();
        doc.add_layer("b").unwrap();
        let undo_count = doc.history().undo_count();
        assert_eq!(doc.reorder(a, 0), Ok(0));
        assert_eq!(doc.history().undo_count(), undo_count);
    }

    #[test]
    fn test_move_forward_and_backward() {
        let mut doc = MapDocument::default();
        let a = doc.top_layer_id();
        let b = doc.add_layer("b").unwrap();

        assert_eq!(doc.move_layer_forward(a), Ok(1));
        assert_eq!(ids(&doc), vec![b, a]);
        assert_eq!(doc.move_layer_forward(a), Ok(1));

        assert_eq!(doc.move_layer_backward(a), Ok(0));
        assert_eq!(ids(&doc), vec![a, b]);
        assert_eq!(doc.move_layer_backward(a), Ok(0));
    }

    #[test]
    fn test_duplicate_layer() {
        let mut doc = MapDocument::default();
        let a = doc.top_layer_id();
        let top = doc.add_layer("top").unwrap();
        let original = paint(&mut doc, a, 1, 1);

        let copy = doc.duplicate_layer(a).unwrap();
        assert_eq!(ids(&doc), vec![a, copy, top]);

        let copied = doc.layer(copy).unwrap();
        assert_eq!(copied.name, "Layer 1 copy");
        assert_eq!(copied.element_count(), 1);
        assert!(!copied.store().contains(original));
        assert_eq!(
            doc.find_element(original).map(|(layer, _)| layer),
            Some(a)
        );

        doc.undo().unwrap();
        assert_eq!(ids(&doc), vec![a, top]);
    }

    #[test]
    fn test_rename_is_undoable() {
        let mut doc = MapDocument::default();
        let id = doc.top_layer_id();
        doc.rename_layer(id, "Ground").unwrap();
        assert_eq!(doc.layer(id).unwrap().name, "Ground");
        doc.undo().unwrap();
        assert_eq!(doc.layer(id).unwrap().name, DEFAULT_LAYER_NAME);
    }

    #[test]
    fn test_set_exclusive_checks_shared_cells() {
        let mut doc = MapDocument::default();
        let id = doc.add_layer_with("shapes", false).unwrap();
        paint(&mut doc, id, 3, 3);
        paint(&mut doc, id, 3, 3);

        assert_eq!(
            doc.set_exclusive(id, true),
            Err(EditError::CellOccupied {
                cell: IVec2::new(3, 3)
            })
        );
        doc.undo().unwrap();
        doc.set_exclusive(id, true).unwrap();
        assert!(doc.layer(id).unwrap().is_exclusive());
    }

    #[test]
    fn test_visibility_and_lock_are_not_recorded() {
        let mut doc = MapDocument::default();
        let id = doc.top_layer_id();
        doc.set_visible(id, false).unwrap();
        doc.set_locked(id, true).unwrap();

        let layer = doc.layer(id).unwrap();
        assert!(!layer.visible);
        assert!(layer.locked);
        assert!(!doc.history().can_undo());
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_undo_add_layer_after_hiding_it() {
        let mut doc = MapDocument::default();
        let id = doc.add_layer("temp").unwrap();
        doc.set_visible(id, false).unwrap();
        doc.undo().unwrap();
        assert_eq!(doc.layer_count(), 1);
        assert!(!doc.history().is_halted());
    }

    #[test]
    fn test_mark_saved() {
        let mut doc = MapDocument::default();
        doc.add_layer("x").unwrap();
        assert!(doc.is_dirty());
        doc.mark_saved();
        assert!(!doc.is_dirty());
        doc.undo().unwrap();
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_content_bounds() {
        let mut doc = MapDocument::default();
        assert_eq!(doc.content_bounds(), None);

        let ground = doc.top_layer_id();
        let top = doc.add_layer("top").unwrap();
        paint(&mut doc, ground, 2, 7);
        paint(&mut doc, top, 9, 3);
        assert_eq!(
            doc.content_bounds(),
            Some(CellRect::from_corners(IVec2::new(2, 3), IVec2::new(9, 7)))
        );
    }

    #[test]
    fn test_element_ids_are_not_reused() {
        let mut doc = MapDocument::default();
        let layer = doc.top_layer_id();
        let first = paint(&mut doc, layer, 0, 0);
        doc.undo().unwrap();
        let second = paint(&mut doc, layer, 0, 0);
        assert_ne!(first, second);
    }
}
