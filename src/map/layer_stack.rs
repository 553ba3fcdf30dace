//! Ordered layers of a document, bottom (index 0) to top.
//!
//! Read access is public. Mutation is crate-internal: it happens only while a
//! command is applied, after the command has been validated against this stack.

use crate::error::{EditError, EditResult};
use crate::geometry::MapBounds;

use super::element::{Element, ElementId};
use super::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    bounds: MapBounds,
    layers: Vec<Layer>,
}

impl LayerStack {
    pub(crate) fn new(bounds: MapBounds, first: Layer) -> Self {
        Self {
            bounds,
            layers: vec![first],
        }
    }

    pub(crate) fn from_layers(bounds: MapBounds, layers: Vec<Layer>) -> Self {
        Self { bounds, layers }
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers bottom to top
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, id: LayerId) -> EditResult<&Layer> {
        self.layers
            .iter()
            .find(|layer| layer.id() == id)
            .ok_or(EditError::LayerNotFound { layer: id })
    }

    pub(crate) fn get_mut(&mut self, id: LayerId) -> EditResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id() == id)
            .ok_or(EditError::LayerNotFound { layer: id })
    }

    /// Z-order index of a layer (0 = bottom)
    pub fn index_of(&self, id: LayerId) -> EditResult<usize> {
        self.layers
            .iter()
            .position(|layer| layer.id() == id)
            .ok_or(EditError::LayerNotFound { layer: id })
    }

    pub fn at(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// Layer holding the element, together with the element itself
    pub fn find_element(&self, id: ElementId) -> Option<(LayerId, &Element)> {
        self.layers
            .iter()
            .find_map(|layer| layer.store().get(id).map(|element| (layer.id(), element)))
    }

    pub fn element_count(&self) -> usize {
        self.layers.iter().map(Layer::element_count).sum()
    }

    pub(crate) fn insert(&mut self, index: usize, layer: Layer) {
        self.layers.insert(index, layer);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Layer {
        self.layers.remove(index)
    }

    pub(crate) fn move_layer(&mut self, from: usize, to: usize) {
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
    }

    /// Check every layer's cell index
    pub fn check_integrity(&self) -> EditResult<()> {
        for layer in &self.layers {
            layer.store().check_integrity()?;
            for element in layer.elements() {
                self.bounds.check_rect(&element.footprint())?;
            }
        }
        Ok(())
    }
}
