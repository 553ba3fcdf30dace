//! Paint and erase strokes.
//!
//! A stroke collects its edits without touching the document. Ending it
//! records everything as a single command, so one drag undoes in one step.

use std::collections::{BTreeSet, HashSet};

use bevy::math::Vec2;
use tracing::debug;

use crate::editor::history::{Command, CommandKind, ElementDelta};
use crate::error::{EditError, EditResult};
use crate::geometry::{
    Cell, CellRect, cells_on_line, clip_line, screen_to_map, screen_to_map_checked,
};
use crate::map::{Element, ElementId, LayerId, MapDocument};

use super::session::EditSession;
use super::tools::EditorTool;

/// Edits accumulated by an in-progress stroke
#[derive(Debug, Clone)]
pub struct Stroke {
    tool: EditorTool,
    layer: LayerId,
    last_cell: Cell,
    /// Cells already handled; each is visited at most once per stroke
    visited: HashSet<Cell>,
    /// Snapshots of elements the stroke removes
    removed: Vec<Element>,
    removed_ids: BTreeSet<ElementId>,
    placed: Vec<Element>,
    /// Cells covered by `placed`
    claimed: HashSet<Cell>,
}

impl Stroke {
    fn new(tool: EditorTool, layer: LayerId, start: Cell) -> Self {
        Self {
            tool,
            layer,
            last_cell: start,
            visited: HashSet::new(),
            removed: Vec::new(),
            removed_ids: BTreeSet::new(),
            placed: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Elements the stroke will add, for previewing before it ends
    pub fn placed(&self) -> &[Element] {
        &self.placed
    }

    /// Elements the stroke will remove
    pub fn removed(&self) -> &[Element] {
        &self.removed
    }

    fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.placed.is_empty()
    }

    fn remove(&mut self, element: &Element) {
        if self.removed_ids.insert(element.id) {
            self.removed.push(element.clone());
        }
    }
}

impl EditSession {
    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// Start a paint or erase stroke at a screen point
    pub fn begin_stroke(&mut self, doc: &mut MapDocument, screen_point: Vec2) -> EditResult<()> {
        if !self.tool.is_stroke_tool() {
            return Err(EditError::InvalidArgument(format!(
                "{} does not draw strokes",
                self.tool.display_name()
            )));
        }
        let layer = self.editable_layer(doc)?.id();
        let cell = screen_to_map_checked(screen_point, &self.viewport, doc.cell_size(), doc.bounds())?;

        if self.stroke.take().is_some() {
            debug!("Discarding unfinished stroke");
        }
        let mut stroke = Stroke::new(self.tool, layer, cell);
        self.visit(doc, &mut stroke, cell);
        self.stroke = Some(stroke);
        Ok(())
    }

    /// Extend the stroke to a new pointer sample.
    ///
    /// Cells between the previous sample and this one are filled in. A sample
    /// off the map reports `OutOfBounds`; the stroke keeps the cells on the
    /// map and stays active.
    pub fn continue_stroke(&mut self, doc: &mut MapDocument, screen_point: Vec2) -> EditResult<()> {
        let mut stroke = self.stroke.take().ok_or(EditError::NoActiveStroke)?;
        let target = screen_to_map(screen_point, &self.viewport, doc.cell_size());

        if let Some((start, end)) = clip_line(stroke.last_cell, target, doc.bounds()) {
            for cell in cells_on_line(start, end) {
                if doc.bounds().contains(cell) {
                    self.visit(doc, &mut stroke, cell);
                }
            }
        }
        stroke.last_cell = target;
        self.stroke = Some(stroke);

        doc.bounds().check(target).map(|_| ())
    }

    /// Finish the stroke and record it as one command.
    ///
    /// Returns false when the stroke changed nothing.
    pub fn end_stroke(&mut self, doc: &mut MapDocument) -> EditResult<bool> {
        let stroke = self.stroke.take().ok_or(EditError::NoActiveStroke)?;
        if stroke.is_empty() {
            return Ok(false);
        }
        check_still_applies(doc, &stroke)?;

        let kind = match stroke.tool {
            EditorTool::Erase => CommandKind::Erase,
            _ => CommandKind::Paint,
        };
        let changed = stroke.removed.len() + stroke.placed.len();
        doc.execute(Command::elements(
            kind,
            ElementDelta::new(stroke.layer, stroke.removed, stroke.placed),
        ))?;
        debug!("{} stroke changed {} elements", kind.display_name(), changed);
        Ok(true)
    }

    /// Drop the stroke in progress; the document is untouched
    pub fn cancel_stroke(&mut self) {
        if self.stroke.take().is_some() {
            debug!("Stroke cancelled");
        }
    }

    /// Single click: select the topmost element with the select tool, or a
    /// one-cell stroke with paint and erase
    pub fn click(&mut self, doc: &mut MapDocument, screen_point: Vec2) -> EditResult<()> {
        if self.tool == EditorTool::Select {
            self.select_at(doc, screen_point)?;
            return Ok(());
        }
        self.begin_stroke(doc, screen_point)?;
        self.end_stroke(doc).map(|_| ())
    }

    fn visit(&self, doc: &mut MapDocument, stroke: &mut Stroke, cell: Cell) {
        if !stroke.visited.insert(cell) {
            return;
        }
        match stroke.tool {
            EditorTool::Erase => self.erase_cell(doc, stroke, cell),
            _ => self.paint_cell(doc, stroke, cell),
        }
    }

    fn erase_cell(&self, doc: &MapDocument, stroke: &mut Stroke, cell: Cell) {
        let Ok(layer) = doc.layer(stroke.layer) else {
            return;
        };
        for id in layer.store().query(cell) {
            if let Some(element) = layer.store().get(id) {
                stroke.remove(element);
            }
        }
    }

    fn paint_cell(&self, doc: &mut MapDocument, stroke: &mut Stroke, cell: Cell) {
        let footprint = CellRect::from_origin_size(cell, self.brush.size);
        if !doc.bounds().contains_rect(&footprint) {
            debug!("Brush at {} would leave the map, skipped", cell);
            return;
        }
        let Ok(layer) = doc.layer(stroke.layer) else {
            return;
        };

        if layer.is_exclusive() {
            if footprint.iter().any(|c| stroke.claimed.contains(&c)) {
                return;
            }
            let occupants = layer.store().occupants(&footprint, &stroke.removed_ids);
            if !occupants.is_empty() {
                if !self.replace_existing {
                    debug!("Cell {} is occupied, skipped", cell);
                    return;
                }
                let evicted: Vec<Element> = occupants
                    .iter()
                    .filter_map(|id| layer.store().get(*id).cloned())
                    .collect();
                for element in &evicted {
                    stroke.remove(element);
                }
            }
            stroke.claimed.extend(footprint.iter());
        }

        let element = Element::new(doc.allocate_element_id(), cell, self.brush.source.clone())
            .with_size(self.brush.size)
            .with_orientation(self.brush.orientation);
        stroke.placed.push(element);
    }
}

/// Reject a stroke whose snapshots no longer match the document, so a stale
/// stroke is reported as a user error instead of corrupting history
fn check_still_applies(doc: &MapDocument, stroke: &Stroke) -> EditResult<()> {
    let layer = doc.layer(stroke.layer)?;
    if layer.locked {
        return Err(EditError::LayerLocked { layer: stroke.layer });
    }
    for element in &stroke.removed {
        if layer.store().get(element.id) != Some(element) {
            return Err(EditError::ElementNotFound { element: element.id });
        }
    }
    for element in &stroke.placed {
        if let Some(cell) = layer.store().first_conflict(element, &stroke.removed_ids) {
            return Err(EditError::CellOccupied { cell });
        }
    }
    Ok(())
}
