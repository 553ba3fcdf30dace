//! Reading map documents.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::constants::SAVE_FORMAT_VERSION;
use crate::geometry::MapBounds;
use crate::map::{ElementStore, Layer, LayerStack, MapDocument, SavedMap};

use super::PersistenceError;

/// Parse and validate a JSON save file
pub fn deserialize_map(bytes: &[u8], history_depth: usize) -> Result<MapDocument, PersistenceError> {
    let saved: SavedMap = serde_json::from_slice(bytes)?;
    build_document(saved, history_depth)
}

/// Read a map from disk
pub fn load_map(path: &Path, history_depth: usize) -> Result<MapDocument, PersistenceError> {
    let bytes = std::fs::read(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = deserialize_map(&bytes, history_depth)?;
    info!(
        "Loaded map {:?} from {:?} ({} layers, {} elements)",
        doc.name,
        path,
        doc.layer_count(),
        doc.element_count()
    );
    Ok(doc)
}

fn build_document(saved: SavedMap, history_depth: usize) -> Result<MapDocument, PersistenceError> {
    if saved.version > SAVE_FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: saved.version,
            supported: SAVE_FORMAT_VERSION,
        });
    }

    let map = saved.map_data;
    if !(map.cell_size.is_finite() && map.cell_size > 0.0) {
        return Err(invalid(format!("cell size {} is not positive", map.cell_size)));
    }
    let bounds = MapBounds::new(map.width, map.height);
    if bounds.is_empty() {
        return Err(invalid(format!("map size {}x{} is empty", map.width, map.height)));
    }
    if saved.layers.is_empty() {
        return Err(invalid("map has no layers".to_string()));
    }

    let mut layer_ids = HashSet::new();
    let mut element_ids = HashSet::new();
    let mut layers = Vec::with_capacity(saved.layers.len());

    for saved_layer in saved.layers {
        if !layer_ids.insert(saved_layer.id) {
            return Err(invalid(format!("layer id {} is used twice", saved_layer.id)));
        }
        let mut store = ElementStore::new(saved_layer.exclusive);
        for element in saved_layer.elements {
            if !element_ids.insert(element.id) {
                return Err(invalid(format!("element id {} is used twice", element.id)));
            }
            bounds
                .check(element.origin)
                .and_then(|_| bounds.check_rect(&element.footprint()))
                .map_err(|e| invalid(format!("element {}: {e}", element.id)))?;
            store
                .place(element, false)
                .map_err(|e| invalid(format!("layer {}: {e}", saved_layer.id)))?;
        }
        layers.push(Layer::from_parts(
            saved_layer.id,
            saved_layer.name,
            saved_layer.visible,
            saved_layer.locked,
            store,
        ));
    }

    let stack = LayerStack::from_layers(bounds, layers);
    stack
        .check_integrity()
        .map_err(|e| invalid(e.to_string()))?;

    if stack.iter().all(|layer| !layer.visible) {
        warn!("Loaded map {:?} has no visible layers", map.name);
    }

    Ok(MapDocument::from_layers(
        map.name,
        map.cell_size,
        stack,
        history_depth,
    ))
}

fn invalid(reason: String) -> PersistenceError {
    PersistenceError::Invalid(reason)
}
