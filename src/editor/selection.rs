//! Selecting elements and editing the selection.

use std::collections::{BTreeSet, HashSet};

use bevy::math::{IVec2, Rect, Vec2};
use tracing::debug;

use crate::editor::history::{Change, Command, CommandKind, ElementDelta};
use crate::error::{EditError, EditResult};
use crate::geometry::{screen_rect_to_cells, screen_to_map, screen_to_map_checked};
use crate::map::{Element, ElementId, LayerId, MapDocument};

use super::session::EditSession;
use super::tools::Direction;

/// Selected element ids, all on one layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    layer: Option<LayerId>,
    ids: BTreeSet<ElementId>,
}

impl Selection {
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub fn ids(&self) -> &BTreeSet<ElementId> {
        &self.ids
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.layer = None;
        self.ids.clear();
    }

    pub(super) fn replace(&mut self, layer: LayerId, ids: impl IntoIterator<Item = ElementId>) {
        self.ids = ids.into_iter().collect();
        self.layer = (!self.ids.is_empty()).then_some(layer);
    }

    /// Drop ids that no longer exist on the selection's layer
    pub(super) fn prune(&mut self, doc: &MapDocument) {
        let Some(layer) = self.layer else {
            return;
        };
        match doc.layer(layer) {
            Ok(layer) => self.ids.retain(|id| layer.store().contains(*id)),
            Err(_) => self.ids.clear(),
        }
        if self.ids.is_empty() {
            self.layer = None;
        }
    }
}

impl EditSession {
    /// Select every element of the active layer touching the screen rectangle.
    ///
    /// A hidden layer yields an empty selection. Returns the number selected.
    pub fn select_region(&mut self, doc: &MapDocument, screen_rect: Rect) -> EditResult<usize> {
        let layer = self.editable_layer(doc)?;
        let cells = screen_rect_to_cells(screen_rect, &self.viewport, doc.cell_size());
        let clipped = doc
            .bounds()
            .clamp_rect(&cells)
            .ok_or(EditError::OutOfBounds { cell: cells.min })?;

        if !layer.visible {
            self.selection.clear();
            return Ok(0);
        }
        self.selection
            .replace(layer.id(), layer.store().query_region(&clipped));
        debug!("Selected {} elements in {:?}", self.selection.len(), clipped);
        Ok(self.selection.len())
    }

    /// Select the topmost element under the cursor on the active layer, or
    /// clear the selection if the cell is empty
    pub fn select_at(&mut self, doc: &MapDocument, screen_point: Vec2) -> EditResult<Option<ElementId>> {
        let layer = self.editable_layer(doc)?;
        let cell = screen_to_map_checked(screen_point, &self.viewport, doc.cell_size(), doc.bounds())?;

        // Later ids were placed later and sit on top
        let hit = layer
            .visible
            .then(|| layer.store().query(cell).last().copied())
            .flatten();
        self.selection.replace(layer.id(), hit);
        Ok(hit)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Move the selected elements by `delta` cells as one command
    pub fn move_selection(&mut self, doc: &mut MapDocument, delta: IVec2) -> EditResult<()> {
        let (layer_id, before) = self.selected_elements(doc)?;
        if delta == IVec2::ZERO {
            return Ok(());
        }
        let layer = doc.layer(layer_id)?;
        let after: Vec<Element> = before.iter().map(|e| e.translated(delta)).collect();

        for element in &after {
            doc.bounds().check_rect(&element.footprint())?;
            if let Some(cell) = layer.store().first_conflict(element, self.selection.ids()) {
                return Err(EditError::CellOccupied { cell });
            }
        }

        doc.execute(Command::elements(
            CommandKind::Move,
            ElementDelta::new(layer_id, before, after),
        ))
    }

    /// Move the selection one cell
    pub fn nudge_selection(&mut self, doc: &mut MapDocument, direction: Direction) -> EditResult<()> {
        self.move_selection(doc, direction.offset())
    }

    /// Drag the selection between two screen points.
    ///
    /// Both points snap to cells through the viewport; the selection moves by
    /// the cell difference, so sub-cell drags move nothing.
    pub fn drag_selection(&mut self, doc: &mut MapDocument, from: Vec2, to: Vec2) -> EditResult<()> {
        let start = screen_to_map(from, &self.viewport, doc.cell_size());
        let end = screen_to_map(to, &self.viewport, doc.cell_size());
        self.move_selection(doc, end.saturating_sub(start))
    }

    /// Delete the selected elements as one command
    pub fn erase_selection(&mut self, doc: &mut MapDocument) -> EditResult<usize> {
        let (layer_id, before) = self.selected_elements(doc)?;
        let count = before.len();
        doc.execute(Command::elements(
            CommandKind::Erase,
            ElementDelta::new(layer_id, before, Vec::new()),
        ))?;
        self.selection.clear();
        Ok(count)
    }

    /// Move the selected elements to `target`, atomically and as one command.
    ///
    /// The target becomes the active layer and keeps the selection.
    pub fn transfer_selection(&mut self, doc: &mut MapDocument, target: LayerId) -> EditResult<()> {
        let (source, elements) = self.selected_elements(doc)?;
        if source == target {
            return Err(EditError::InvalidArgument(
                "elements are already on that layer".to_string(),
            ));
        }
        let target_layer = doc.layer(target)?;
        if target_layer.locked {
            return Err(EditError::LayerLocked { layer: target });
        }

        if target_layer.is_exclusive() {
            let mut claimed = HashSet::new();
            for element in &elements {
                if let Some(cell) = target_layer.store().first_conflict(element, &BTreeSet::new()) {
                    return Err(EditError::CellOccupied { cell });
                }
                if let Some(cell) = element.cells().find(|cell| !claimed.insert(*cell)) {
                    return Err(EditError::CellOccupied { cell });
                }
            }
        }

        let ids: Vec<ElementId> = elements.iter().map(|e| e.id).collect();
        doc.execute(Command::new(
            CommandKind::Transfer,
            source,
            Change::Elements(vec![
                ElementDelta::new(source, elements.clone(), Vec::new()),
                ElementDelta::new(target, Vec::new(), elements),
            ]),
        ))?;

        self.active_layer = target;
        self.selection.replace(target, ids);
        Ok(())
    }

    /// Snapshot of the selection, checked to be editable
    fn selected_elements(&mut self, doc: &MapDocument) -> EditResult<(LayerId, Vec<Element>)> {
        self.selection.prune(doc);
        let Some(layer_id) = self.selection.layer() else {
            return Err(EditError::EmptySelection);
        };
        let layer = doc.layer(layer_id)?;
        if layer.locked {
            return Err(EditError::LayerLocked { layer: layer_id });
        }
        let elements = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| layer.store().get(*id).cloned())
            .collect();
        Ok((layer_id, elements))
    }
}
