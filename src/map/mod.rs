//! Map document model.
//!
//! ## Module Structure
//!
//! - [`element`] - Elements placed on the grid and their sources
//! - [`store`] - Per-layer element storage with a cell index
//! - [`layer`] - A single named layer
//! - [`layer_stack`] - Ordered layers of a document
//! - [`document`] - The document: layers, grid, history and layer management
//! - [`map_data`] - Save-file data types
//! - [`persistence`] - Saving and loading documents

mod document;
mod element;
mod layer;
mod layer_stack;
mod map_data;
pub mod persistence;
mod store;

pub use document::MapDocument;
pub use element::{
    Element, ElementId, ElementSource, Orientation, Rotation, ShapeDescriptor, ShapeKind,
};
pub use layer::{Layer, LayerId};
pub use layer_stack::LayerStack;
pub use map_data::{MapData, SavedLayer, SavedMap};
pub use persistence::{PersistenceError, load_map, save_map};
pub use store::ElementStore;

use bevy::prelude::*;
use tracing::warn;

use crate::config::EditorConfig;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<MapDocument>() {
            return;
        }
        let document = match app.world().get_resource::<EditorConfig>() {
            Some(config) => MapDocument::from_config(&config.data).unwrap_or_else(|e| {
                warn!("Config has unusable map defaults ({}), using built-in ones", e);
                MapDocument::default()
            }),
            None => MapDocument::default(),
        };
        app.insert_resource(document);
    }
}
