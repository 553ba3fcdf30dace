//! Snapshot data carried by commands.

use std::collections::BTreeSet;

use crate::map::{Element, ElementId, LayerId};

/// Before/after copies of the elements one command touches on one layer.
///
/// Applying the delta removes every `before` element and inserts every `after`
/// element; reverting swaps the two lists. Only touched elements are stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDelta {
    pub layer: LayerId,
    pub before: Vec<Element>,
    pub after: Vec<Element>,
}

impl ElementDelta {
    pub fn new(layer: LayerId, before: Vec<Element>, after: Vec<Element>) -> Self {
        Self {
            layer,
            before,
            after,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            layer: self.layer,
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn removed_ids(&self) -> BTreeSet<ElementId> {
        self.before.iter().map(|element| element.id).collect()
    }
}
