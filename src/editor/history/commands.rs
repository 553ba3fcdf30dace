//! Reversible command records.

use crate::map::{Layer, LayerId};

use super::data_types::ElementDelta;

/// What kind of user action a command records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Elements were painted (a whole stroke is one command)
    Paint,
    /// Elements were erased
    Erase,
    /// Selected elements were moved within their layer
    Move,
    /// Selected elements were moved to another layer
    Transfer,
    AddLayer,
    RemoveLayer,
    DuplicateLayer,
    ReorderLayer,
    RenameLayer,
    /// A layer's one-element-per-cell rule was switched
    SetExclusive,
}

impl CommandKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            CommandKind::Paint => "Paint",
            CommandKind::Erase => "Erase",
            CommandKind::Move => "Move",
            CommandKind::Transfer => "Move to Layer",
            CommandKind::AddLayer => "Add Layer",
            CommandKind::RemoveLayer => "Remove Layer",
            CommandKind::DuplicateLayer => "Duplicate Layer",
            CommandKind::ReorderLayer => "Reorder Layer",
            CommandKind::RenameLayer => "Rename Layer",
            CommandKind::SetExclusive => "Layer Exclusivity",
        }
    }
}

/// The document change a command makes, with everything needed to revert it
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// Element edits; all deltas apply together or not at all
    Elements(Vec<ElementDelta>),
    InsertLayer { index: usize, layer: Layer },
    DeleteLayer { index: usize, layer: Layer },
    MoveLayer { layer: LayerId, from: usize, to: usize },
    RenameLayer {
        layer: LayerId,
        before: String,
        after: String,
    },
    SetExclusive {
        layer: LayerId,
        before: bool,
        after: bool,
    },
}

impl Change {
    /// The change that exactly undoes this one
    pub fn inverse(&self) -> Change {
        match self {
            Change::Elements(deltas) => {
                Change::Elements(deltas.iter().rev().map(ElementDelta::inverse).collect())
            }
            Change::InsertLayer { index, layer } => Change::DeleteLayer {
                index: *index,
                layer: layer.clone(),
            },
            Change::DeleteLayer { index, layer } => Change::InsertLayer {
                index: *index,
                layer: layer.clone(),
            },
            Change::MoveLayer { layer, from, to } => Change::MoveLayer {
                layer: *layer,
                from: *to,
                to: *from,
            },
            Change::RenameLayer {
                layer,
                before,
                after,
            } => Change::RenameLayer {
                layer: *layer,
                before: after.clone(),
                after: before.clone(),
            },
            Change::SetExclusive {
                layer,
                before,
                after,
            } => Change::SetExclusive {
                layer: *layer,
                before: *after,
                after: *before,
            },
        }
    }
}

/// A reversible edit. Immutable once built; holds copies, never references.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    kind: CommandKind,
    layer: LayerId,
    change: Change,
}

impl Command {
    pub fn new(kind: CommandKind, layer: LayerId, change: Change) -> Self {
        Self {
            kind,
            layer,
            change,
        }
    }

    /// Element edits on a single layer
    pub fn elements(kind: CommandKind, delta: ElementDelta) -> Self {
        Self::new(kind, delta.layer, Change::Elements(vec![delta]))
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Layer the user acted on
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn change(&self) -> &Change {
        &self.change
    }

    /// Label for undo/redo menu entries
    pub fn description(&self) -> &'static str {
        self.kind.display_name()
    }
}
