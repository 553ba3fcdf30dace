//! Command stack tracking undo/redo state.

use std::collections::VecDeque;

use tracing::{debug, error};

use crate::error::{EditError, EditResult};
use crate::map::LayerStack;

use super::MAX_HISTORY_SIZE;
use super::commands::{Command, CommandKind};
use super::execute::apply_change;

/// Lifecycle state of a recorded command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandState {
    Applied,
    Undone,
}

/// Applied history plus redo buffer.
///
/// Once an integrity failure occurs the stack is halted: every further
/// execute/undo/redo fails with `EngineHalted` until the document is reloaded.
#[derive(Clone, Debug)]
pub struct CommandStack {
    /// Commands that can be undone (most recent last)
    undo_stack: VecDeque<Command>,
    /// Commands that can be redone (most recent last)
    redo_stack: Vec<Command>,
    max_depth: usize,
    halted: Option<String>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

impl CommandStack {
    /// Stack keeping at most `max_depth` undoable commands (at least one)
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            halted: None,
        }
    }

    /// Apply a new command and record it. Clears the redo buffer.
    pub fn execute(&mut self, command: Command, layers: &mut LayerStack) -> EditResult<()> {
        self.ensure_running()?;
        if let Err(err) = apply_change(command.change(), layers) {
            return Err(self.halt(command.kind(), "execute", err));
        }

        debug!("Executed {}", command.description());
        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        self.trim();
        Ok(())
    }

    /// Revert the most recent applied command
    pub fn undo(&mut self, layers: &mut LayerStack) -> EditResult<CommandKind> {
        self.ensure_running()?;
        let command = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;

        if let Err(err) = apply_change(&command.change().inverse(), layers) {
            let kind = command.kind();
            self.undo_stack.push_back(command);
            return Err(self.halt(kind, "undo", err));
        }

        debug!("Undid {}", command.description());
        let kind = command.kind();
        self.redo_stack.push(command);
        Ok(kind)
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self, layers: &mut LayerStack) -> EditResult<CommandKind> {
        self.ensure_running()?;
        let command = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;

        if let Err(err) = apply_change(command.change(), layers) {
            let kind = command.kind();
            self.redo_stack.push(command);
            return Err(self.halt(kind, "redo", err));
        }

        debug!("Redid {}", command.description());
        let kind = command.kind();
        self.undo_stack.push_back(command);
        self.trim();
        Ok(kind)
    }

    /// Check if there are commands to undo
    pub fn can_undo(&self) -> bool {
        self.halted.is_none() && !self.undo_stack.is_empty()
    }

    /// Check if there are commands to redo
    pub fn can_redo(&self) -> bool {
        self.halted.is_none() && !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Command the next undo would revert
    pub fn last_applied(&self) -> Option<&Command> {
        self.undo_stack.back()
    }

    /// Command the next redo would re-apply
    pub fn next_redo(&self) -> Option<&Command> {
        self.redo_stack.last()
    }

    /// All recorded commands, oldest applied first, then undone ones from the
    /// most recently undone backwards
    pub fn entries(&self) -> impl Iterator<Item = (&Command, CommandState)> {
        self.undo_stack
            .iter()
            .map(|command| (command, CommandState::Applied))
            .chain(
                self.redo_stack
                    .iter()
                    .rev()
                    .map(|command| (command, CommandState::Undone)),
            )
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth cap; drops the oldest entries right away if needed
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.trim();
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    fn ensure_running(&self) -> EditResult<()> {
        match &self.halted {
            Some(reason) => Err(EditError::EngineHalted(reason.clone())),
            None => Ok(()),
        }
    }

    fn halt(&mut self, kind: CommandKind, action: &str, err: EditError) -> EditError {
        error!(
            "Integrity failure during {} of {}: {}",
            action,
            kind.display_name(),
            err
        );
        self.halted = Some(err.to_string());
        match err {
            EditError::CorruptCommand(_) | EditError::OrphanedElement { .. } => err,
            other => EditError::CorruptCommand(other.to_string()),
        }
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(
                    "History full, dropped oldest entry: {}",
                    dropped.description()
                );
            }
        }
    }
}
