use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EditResult;

use super::element::{Element, ElementId};
use super::store::ElementStore;

/// Stable layer identifier; unaffected by reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One plane of the map. Its z-order is its index in the layer stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    pub name: String,
    pub visible: bool,
    /// Locked layers reject every edit gesture
    pub locked: bool,
    store: ElementStore,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, exclusive: bool) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            store: ElementStore::new(exclusive),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn is_exclusive(&self) -> bool {
        self.store.is_exclusive()
    }

    /// Returns true if the layer takes part in rendering and selection
    pub fn is_selectable(&self) -> bool {
        self.visible && !self.locked
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ElementStore {
        &mut self.store
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.store.iter()
    }

    pub fn element_count(&self) -> usize {
        self.store.len()
    }

    /// Copy of this layer under a new id and name, with fresh element ids
    pub(crate) fn duplicate(
        &self,
        id: LayerId,
        name: String,
        mut next_element_id: impl FnMut() -> ElementId,
    ) -> EditResult<Self> {
        let mut store = ElementStore::new(self.is_exclusive());
        for element in self.store.iter() {
            let copy = Element {
                id: next_element_id(),
                ..element.clone()
            };
            store.place(copy, false)?;
        }
        Ok(Self {
            id,
            name,
            visible: self.visible,
            locked: false,
            store,
        })
    }

    /// Build a layer from already validated parts
    pub(crate) fn from_parts(
        id: LayerId,
        name: String,
        visible: bool,
        locked: bool,
        store: ElementStore,
    ) -> Self {
        Self {
            id,
            name,
            visible,
            locked,
            store,
        }
    }
}
