use serde::{Deserialize, Serialize};

use crate::constants::SAVE_FORMAT_VERSION;

use super::document::MapDocument;
use super::element::Element;
use super::layer::{Layer, LayerId};

/// Map-wide settings stored in a save file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub exclusive: bool,
    pub elements: Vec<Element>,
}

impl SavedLayer {
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            id: layer.id(),
            name: layer.name.clone(),
            visible: layer.visible,
            locked: layer.locked,
            exclusive: layer.is_exclusive(),
            elements: layer.elements().cloned().collect(),
        }
    }
}

/// On-disk form of a map document. Layers are listed bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMap {
    #[serde(default = "default_version")]
    pub version: u32,
    pub map_data: MapData,
    pub layers: Vec<SavedLayer>,
}

impl SavedMap {
    pub fn from_document(doc: &MapDocument) -> Self {
        let bounds = doc.bounds();
        Self {
            version: SAVE_FORMAT_VERSION,
            map_data: MapData {
                name: doc.name.clone(),
                width: bounds.width,
                height: bounds.height,
                cell_size: doc.cell_size(),
            },
            layers: doc.layers().iter().map(SavedLayer::from_layer).collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    SAVE_FORMAT_VERSION
}
