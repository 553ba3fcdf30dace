//! Per-user editing state.

use bevy::prelude::*;
use tracing::debug;

use crate::editor::history::CommandKind;
use crate::error::{EditError, EditResult};
use crate::geometry::Viewport;
use crate::map::{Layer, LayerId, MapDocument};

use super::selection::Selection;
use super::stroke::Stroke;
use super::tools::{Brush, EditorTool};

/// Tool, brush, viewport and in-progress gesture state for one editing session.
///
/// The session never owns the document; every operation takes the document it
/// acts on, and every document change goes through its command stack.
#[derive(Resource, Debug, Clone)]
pub struct EditSession {
    pub(super) active_layer: LayerId,
    pub(super) tool: EditorTool,
    pub brush: Brush,
    /// Painting over an occupied cell of an exclusive layer replaces its occupant
    pub replace_existing: bool,
    pub viewport: Viewport,
    pub(super) stroke: Option<Stroke>,
    pub(super) selection: Selection,
}

impl EditSession {
    /// Session editing the topmost layer of `doc`
    pub fn new(doc: &MapDocument) -> Self {
        Self {
            active_layer: doc.top_layer_id(),
            tool: EditorTool::default(),
            brush: Brush::default(),
            replace_existing: true,
            viewport: Viewport::default(),
            stroke: None,
            selection: Selection::default(),
        }
    }

    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    /// Switch the layer edits apply to. Clears the selection.
    pub fn set_active_layer(&mut self, doc: &MapDocument, layer: LayerId) -> EditResult<()> {
        doc.layer(layer)?;
        if layer != self.active_layer {
            self.cancel_stroke();
            self.selection.clear();
            self.active_layer = layer;
        }
        Ok(())
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    /// Switch tools. Any stroke in progress is discarded and the selection cleared.
    pub fn set_tool(&mut self, tool: EditorTool) {
        if tool != self.tool {
            self.cancel_stroke();
            self.selection.clear();
            self.tool = tool;
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Undo the last document command, keeping session state consistent with it
    pub fn undo(&mut self, doc: &mut MapDocument) -> EditResult<CommandKind> {
        self.cancel_stroke();
        let kind = doc.undo()?;
        self.sync_with(doc);
        Ok(kind)
    }

    pub fn redo(&mut self, doc: &mut MapDocument) -> EditResult<CommandKind> {
        self.cancel_stroke();
        let kind = doc.redo()?;
        self.sync_with(doc);
        Ok(kind)
    }

    /// Fall back to the top layer if the active one vanished and drop selected
    /// ids that are no longer on the selection's layer
    pub fn sync_with(&mut self, doc: &MapDocument) {
        if doc.layer(self.active_layer).is_err() {
            debug!("Active layer {} is gone, switching to top", self.active_layer);
            self.active_layer = doc.top_layer_id();
            self.selection.clear();
        }
        self.selection.prune(doc);
    }

    /// The active layer, if it accepts edits
    pub(super) fn editable_layer<'a>(&self, doc: &'a MapDocument) -> EditResult<&'a Layer> {
        let layer = doc.layer(self.active_layer)?;
        if layer.locked {
            return Err(EditError::LayerLocked {
                layer: self.active_layer,
            });
        }
        Ok(layer)
    }
}
