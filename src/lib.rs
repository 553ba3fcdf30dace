//! Layered 2D map document model and edit engine.
//!
//! ## Module Structure
//!
//! - [`geometry`] - Cells, bounds, viewport and screen↔map transforms
//! - [`map`] - Elements, layers, the map document and persistence
//! - [`editor`] - Edit sessions, strokes, selection and undo/redo history
//! - [`render`] - Render dispatch to an external renderer
//! - [`config`] - Editor configuration on disk
//! - [`error`] - Edit error taxonomy

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod map;
pub mod paths;
pub mod render;

pub use error::{EditError, EditResult, ErrorCategory};
