//! Error taxonomy for document edits.
//!
//! Every rejected operation is reported as an [`EditError`]. Errors fall into
//! three categories:
//!
//! - **UserInput**: the request was invalid; nothing was mutated.
//! - **History**: undo/redo had nothing to work with.
//! - **Integrity**: a command failed its internal consistency checks. This is a
//!   programming defect; the command stack refuses further work until the
//!   document is reloaded.

use thiserror::Error;

use crate::geometry::Cell;
use crate::map::{ElementId, LayerId};

/// Result type for edit operations
pub type EditResult<T> = Result<T, EditError>;

/// Broad class of an [`EditError`], used by callers to decide how to surface it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    UserInput,
    History,
    Integrity,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cell {cell} is outside the map")]
    OutOfBounds { cell: Cell },

    #[error("cell {cell} is already occupied")]
    CellOccupied { cell: Cell },

    #[error("layer {layer} is locked")]
    LayerLocked { layer: LayerId },

    #[error("cannot remove the last layer")]
    LastLayer,

    #[error("layer {layer} does not exist")]
    LayerNotFound { layer: LayerId },

    #[error("element {element} does not exist")]
    ElementNotFound { element: ElementId },

    #[error("no stroke in progress")]
    NoActiveStroke,

    #[error("nothing is selected")]
    EmptySelection,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("corrupt command: {0}")]
    CorruptCommand(String),

    #[error("element {element} is not indexed in exactly the cells it occupies")]
    OrphanedElement { element: ElementId },

    #[error("edit engine halted after an integrity failure: {0}")]
    EngineHalted(String),
}

impl EditError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EditError::OutOfBounds { .. }
            | EditError::CellOccupied { .. }
            | EditError::LayerLocked { .. }
            | EditError::LastLayer
            | EditError::LayerNotFound { .. }
            | EditError::ElementNotFound { .. }
            | EditError::NoActiveStroke
            | EditError::EmptySelection
            | EditError::InvalidArgument(_) => ErrorCategory::UserInput,
            EditError::NothingToUndo | EditError::NothingToRedo => ErrorCategory::History,
            EditError::CorruptCommand(_)
            | EditError::OrphanedElement { .. }
            | EditError::EngineHalted(_) => ErrorCategory::Integrity,
        }
    }

    /// Returns true if this error means the document can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Integrity
    }
}
