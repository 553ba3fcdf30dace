//! Undo/Redo system for document edits.
//!
//! Every reversible edit (painting, erasing, moving elements, structural layer
//! changes) is recorded as a [`Command`] holding before/after snapshots of just
//! the elements or layer it touched. The [`CommandStack`] applies commands and
//! reverts them.
//!
//! ## Module Structure
//!
//! - [`commands`] - Command, CommandKind and Change definitions
//! - [`data_types`] - Element snapshot deltas carried by commands
//! - [`command_history`] - CommandStack with the applied/undone state machine
//! - [`execute`] - Validate-then-commit application of changes

mod command_history;
mod commands;
mod data_types;
mod execute;

#[cfg(test)]
mod proptests;

// Re-exports
pub use command_history::{CommandStack, CommandState};
pub use commands::{Change, Command, CommandKind};
pub use data_types::ElementDelta;

/// Default maximum number of commands to keep in history
pub const MAX_HISTORY_SIZE: usize = 100;
