//! Edit engine: turns pointer gestures into document commands.
//!
//! ## Module Structure
//!
//! - [`history`] - Commands and the undo/redo stack
//! - [`tools`] - Tools, brushes and nudge directions
//! - [`session`] - Per-user editing state
//! - [`stroke`] - Paint and erase strokes
//! - [`selection`] - Selecting, moving, erasing and transferring elements
//!
//! Gestures are converted from screen space to cells through the session's
//! viewport, validated against layer lock state and map bounds, and each
//! logical action becomes exactly one command. A rejected gesture returns an
//! [`EditError`](crate::error::EditError) and leaves the document unchanged.

pub mod history;
mod selection;
mod session;
mod stroke;
pub mod tools;

pub use selection::Selection;
pub use session::EditSession;
pub use stroke::Stroke;
pub use tools::{Brush, Direction, EditorTool};

use bevy::prelude::*;

use crate::map::MapDocument;

/// Inserts an [`EditSession`] for the app's [`MapDocument`]. Add after the map plugin.
pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<EditSession>() {
            return;
        }
        let session = match app.world().get_resource::<MapDocument>() {
            Some(doc) => EditSession::new(doc),
            None => EditSession::new(&MapDocument::default()),
        };
        app.insert_resource(session);
    }
}
