//! Applying changes to the layer stack.
//!
//! A change is validated in full before anything is touched, so a change that
//! does not fit the current document leaves it unchanged and reports
//! `CorruptCommand`.

use std::collections::{BTreeSet, HashSet};

use crate::error::{EditError, EditResult};
use crate::map::{ElementId, Layer, LayerStack};

use super::commands::Change;
use super::data_types::ElementDelta;

/// Validate then apply `change`
pub fn apply_change(change: &Change, layers: &mut LayerStack) -> EditResult<()> {
    validate(change, layers).map_err(EditError::CorruptCommand)?;
    commit(change, layers)
}

fn validate(change: &Change, layers: &LayerStack) -> Result<(), String> {
    match change {
        Change::Elements(deltas) => validate_elements(deltas, layers),
        Change::InsertLayer { index, layer } => validate_insert_layer(*index, layer, layers),
        Change::DeleteLayer { index, layer } => {
            if layers.len() <= 1 {
                return Err("cannot delete the only layer".to_string());
            }
            // Visibility and lock are view state and may differ from the snapshot.
            match layers.at(*index) {
                Some(current)
                    if current.id() == layer.id()
                        && current.name == layer.name
                        && current.elements().eq(layer.elements()) =>
                {
                    Ok(())
                }
                Some(current) => Err(format!(
                    "layer at index {index} is {}, snapshot is {}",
                    current.id(),
                    layer.id()
                )),
                None => Err(format!("no layer at index {index}")),
            }
        }
        Change::MoveLayer { layer, from, to } => {
            match layers.at(*from) {
                Some(current) if current.id() == *layer => {}
                _ => return Err(format!("layer {layer} is not at index {from}")),
            }
            if *to >= layers.len() {
                return Err(format!("target index {to} out of range"));
            }
            Ok(())
        }
        Change::RenameLayer { layer, before, .. } => {
            let current = layers.get(*layer).map_err(|e| e.to_string())?;
            if current.name != *before {
                return Err(format!(
                    "layer {layer} is named {:?}, expected {before:?}",
                    current.name
                ));
            }
            Ok(())
        }
        Change::SetExclusive { layer, before, after } => {
            let current = layers.get(*layer).map_err(|e| e.to_string())?;
            if current.is_exclusive() != *before {
                return Err(format!("layer {layer} exclusivity differs from snapshot"));
            }
            if *after {
                let mut store = current.store().clone();
                store.set_exclusive(true).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
    }
}

fn validate_elements(deltas: &[ElementDelta], layers: &LayerStack) -> Result<(), String> {
    let mut seen_layers = HashSet::new();
    let mut removed: BTreeSet<ElementId> = BTreeSet::new();

    for delta in deltas {
        if !seen_layers.insert(delta.layer) {
            return Err(format!("layer {} appears twice in one change", delta.layer));
        }
        let layer = layers.get(delta.layer).map_err(|e| e.to_string())?;
        for element in &delta.before {
            match layer.store().get(element.id) {
                Some(current) if current == element => {}
                Some(_) => return Err(format!("element {} differs from its snapshot", element.id)),
                None => {
                    return Err(format!(
                        "element {} is not on layer {}",
                        element.id, delta.layer
                    ));
                }
            }
            if !removed.insert(element.id) {
                return Err(format!("element {} removed twice", element.id));
            }
        }
    }

    let mut inserted = BTreeSet::new();
    for delta in deltas {
        let Ok(layer) = layers.get(delta.layer) else {
            continue;
        };
        let removed_here = delta.removed_ids();
        let mut claimed = HashSet::new();

        for element in &delta.after {
            if !inserted.insert(element.id) {
                return Err(format!("element {} inserted twice", element.id));
            }
            if layers.find_element(element.id).is_some() && !removed.contains(&element.id) {
                return Err(format!("element {} already exists", element.id));
            }
            layers
                .bounds()
                .check_rect(&element.footprint())
                .map_err(|e| format!("element {}: {e}", element.id))?;

            if layer.is_exclusive() {
                if let Some(cell) = layer.store().first_conflict(element, &removed_here) {
                    return Err(format!("element {} collides at cell {cell}", element.id));
                }
                for cell in element.cells() {
                    if !claimed.insert(cell) {
                        return Err(format!("element {} overlaps at cell {cell}", element.id));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_insert_layer(index: usize, layer: &Layer, layers: &LayerStack) -> Result<(), String> {
    if index > layers.len() {
        return Err(format!("insert index {index} out of range"));
    }
    if layers.get(layer.id()).is_ok() {
        return Err(format!("layer {} already exists", layer.id()));
    }
    for element in layer.elements() {
        if layers.find_element(element.id).is_some() {
            return Err(format!("element {} already exists", element.id));
        }
        layers
            .bounds()
            .check_rect(&element.footprint())
            .map_err(|e| format!("element {}: {e}", element.id))?;
    }
    layer.store().check_integrity().map_err(|e| e.to_string())
}

/// Mutate the stack. Only called after `validate` accepted the change; a failure
/// here means the document and the command disagree in a way validation missed.
fn commit(change: &Change, layers: &mut LayerStack) -> EditResult<()> {
    match change {
        Change::Elements(deltas) => {
            for delta in deltas {
                let store = layers.get_mut(delta.layer)?.store_mut();
                for element in &delta.before {
                    store.remove(element.id).ok_or_else(|| {
                        EditError::CorruptCommand(format!("element {} vanished", element.id))
                    })?;
                }
            }
            for delta in deltas {
                let store = layers.get_mut(delta.layer)?.store_mut();
                for element in &delta.after {
                    store
                        .place(element.clone(), false)
                        .map_err(|e| EditError::CorruptCommand(e.to_string()))?;
                }
            }
        }
        Change::InsertLayer { index, layer } => layers.insert(*index, layer.clone()),
        Change::DeleteLayer { index, .. } => {
            layers.remove(*index);
        }
        Change::MoveLayer { from, to, .. } => layers.move_layer(*from, *to),
        Change::RenameLayer { layer, after, .. } => {
            layers.get_mut(*layer)?.name = after.clone();
        }
        Change::SetExclusive { layer, after, .. } => {
            layers
                .get_mut(*layer)?
                .store_mut()
                .set_exclusive(*after)
                .map_err(|e| EditError::CorruptCommand(e.to_string()))?;
        }
    }
    Ok(())
}
