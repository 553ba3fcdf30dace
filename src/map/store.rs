//! Cell-indexed element container for one layer.
//!
//! Every element is listed under each cell of its footprint and nowhere else.
//! Empty cell entries are dropped, so a store that had an element placed and
//! removed again compares equal to its earlier self.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{EditError, EditResult};
use crate::geometry::{Cell, CellRect};

use super::element::{Element, ElementId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    /// When set, a cell may hold at most one element
    exclusive: bool,
    elements: BTreeMap<ElementId, Element>,
    cells: HashMap<Cell, BTreeSet<ElementId>>,
}

impl ElementStore {
    pub fn new(exclusive: bool) -> Self {
        Self {
            exclusive,
            ..Self::default()
        }
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Switch exclusivity. Turning it on fails with `CellOccupied` if any cell is shared.
    pub fn set_exclusive(&mut self, exclusive: bool) -> EditResult<()> {
        if exclusive && !self.exclusive {
            let shared = self
                .cells
                .iter()
                .filter(|(_, ids)| ids.len() > 1)
                .map(|(cell, _)| *cell)
                .min_by_key(|cell| (cell.y, cell.x));
            if let Some(cell) = shared {
                return Err(EditError::CellOccupied { cell });
            }
        }
        self.exclusive = exclusive;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Elements in id order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Number of cells holding at least one element
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn query(&self, cell: Cell) -> BTreeSet<ElementId> {
        self.cells.get(&cell).cloned().unwrap_or_default()
    }

    /// Ids of all elements with at least one cell inside `rect`.
    ///
    /// Walks whichever is smaller: the rectangle's cells or the occupied-cell index.
    pub fn query_region(&self, rect: &CellRect) -> BTreeSet<ElementId> {
        let mut found = BTreeSet::new();
        if rect.area() <= self.cells.len() as u64 {
            for cell in rect.iter() {
                if let Some(ids) = self.cells.get(&cell) {
                    found.extend(ids.iter().copied());
                }
            }
        } else {
            for (cell, ids) in &self.cells {
                if rect.contains(*cell) {
                    found.extend(ids.iter().copied());
                }
            }
        }
        found
    }

    /// Ids of elements occupying any cell of `rect`, except those in `ignoring`
    pub fn occupants(&self, rect: &CellRect, ignoring: &BTreeSet<ElementId>) -> BTreeSet<ElementId> {
        let mut found = self.query_region(rect);
        found.retain(|id| !ignoring.contains(id));
        found
    }

    /// First cell (row-major) where `element` would collide in an exclusive store,
    /// not counting elements in `ignoring`
    pub fn first_conflict(&self, element: &Element, ignoring: &BTreeSet<ElementId>) -> Option<Cell> {
        if !self.exclusive {
            return None;
        }
        element.cells().find(|cell| {
            self.cells
                .get(cell)
                .is_some_and(|ids| ids.iter().any(|id| !ignoring.contains(id)))
        })
    }

    /// Insert an element.
    ///
    /// In an exclusive store, placing over occupied cells fails with `CellOccupied`
    /// unless `replace` is set, in which case the previous occupants are evicted and
    /// returned so the caller can record them.
    pub fn place(&mut self, element: Element, replace: bool) -> EditResult<Vec<Element>> {
        if self.contains(element.id) {
            return Err(EditError::InvalidArgument(format!(
                "element {} is already placed",
                element.id
            )));
        }

        let mut evicted = Vec::new();
        if self.exclusive {
            let occupants = self.occupants(&element.footprint(), &BTreeSet::new());
            if !occupants.is_empty() {
                if !replace {
                    let cell = self
                        .first_conflict(&element, &BTreeSet::new())
                        .unwrap_or(element.origin);
                    return Err(EditError::CellOccupied { cell });
                }
                evicted.extend(occupants.into_iter().filter_map(|id| self.remove(id)));
            }
        }

        for cell in element.cells() {
            self.cells.entry(cell).or_default().insert(element.id);
        }
        self.elements.insert(element.id, element);
        Ok(evicted)
    }

    /// Remove an element and every cell reference to it
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let element = self.elements.remove(&id)?;
        for cell in element.cells() {
            if let Some(ids) = self.cells.get_mut(&cell) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        Some(element)
    }

    /// Verify that every element is indexed in exactly its footprint cells
    pub fn check_integrity(&self) -> EditResult<()> {
        let mut expected_refs = 0usize;
        for element in self.elements.values() {
            for cell in element.cells() {
                let indexed = self
                    .cells
                    .get(&cell)
                    .is_some_and(|ids| ids.contains(&element.id));
                if !indexed {
                    return Err(EditError::OrphanedElement {
                        element: element.id,
                    });
                }
                expected_refs += 1;
            }
        }

        let mut actual_refs = 0usize;
        for (cell, ids) in &self.cells {
            if ids.is_empty() {
                return Err(EditError::CorruptCommand(format!(
                    "empty index entry at cell {cell}"
                )));
            }
            if self.exclusive && ids.len() > 1 {
                return Err(EditError::CorruptCommand(format!(
                    "exclusive cell {cell} holds {} elements",
                    ids.len()
                )));
            }
            for id in ids {
                let Some(element) = self.elements.get(id) else {
                    return Err(EditError::OrphanedElement { element: *id });
                };
                if !element.footprint().contains(*cell) {
                    return Err(EditError::OrphanedElement { element: *id });
                }
                actual_refs += 1;
            }
        }

        if expected_refs != actual_refs {
            return Err(EditError::CorruptCommand(format!(
                "cell index holds {actual_refs} references, expected {expected_refs}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::element::{ElementSource, ShapeDescriptor};
    use bevy::math::{IVec2, UVec2};

    fn tile(id: u64, x: i32, y: i32) -> Element {
        Element::tile(ElementId(id), IVec2::new(x, y), 0, id as u32)
    }

    fn shape(id: u64, x: i32, y: i32) -> Element {
        Element::new(
            ElementId(id),
            IVec2::new(x, y),
            ElementSource::Shape(ShapeDescriptor::default()),
        )
    }

    #[test]
    fn test_place_and_query() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 2, 2), false).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.query(IVec2::new(2, 2)),
            BTreeSet::from([ElementId(1)])
        );
        assert!(store.query(IVec2::new(3, 2)).is_empty());
    }

    #[test]
    fn test_place_then_remove_leaves_no_residue() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 0, 0), false).unwrap();
        let before = store.clone();

        let big = tile(2, 3, 3).with_size(UVec2::new(2, 2));
        store.place(big, false).unwrap();
        assert_eq!(store.occupied_cell_count(), 5);

        let removed = store.remove(ElementId(2)).unwrap();
        assert_eq!(removed.id, ElementId(2));
        assert_eq!(store, before);
        assert_eq!(store.occupied_cell_count(), 1);
    }

    #[test]
    fn test_exclusive_place_rejects_occupied() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 1, 1), false).unwrap();

        let result = store.place(tile(2, 1, 1), false);
        assert_eq!(
            result,
            Err(EditError::CellOccupied {
                cell: IVec2::new(1, 1)
            })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_exclusive_place_with_replace_evicts() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 1, 1), false).unwrap();
        store.place(tile(2, 2, 1), false).unwrap();

        let wide = tile(3, 1, 1).with_size(UVec2::new(2, 1));
        let evicted = store.place(wide, true).unwrap();

        let evicted_ids: Vec<_> = evicted.iter().map(|e| e.id).collect();
        assert_eq!(evicted_ids, vec![ElementId(1), ElementId(2)]);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.query(IVec2::new(2, 1)),
            BTreeSet::from([ElementId(3)])
        );
        store.check_integrity().unwrap();
    }

    #[test]
    fn test_shared_store_allows_stacking() {
        let mut store = ElementStore::new(false);
        store.place(shape(1, 0, 0), false).unwrap();
        let evicted = store.place(shape(2, 0, 0), true).unwrap();

        assert!(evicted.is_empty());
        assert_eq!(
            store.query(IVec2::ZERO),
            BTreeSet::from([ElementId(1), ElementId(2)])
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = ElementStore::new(false);
        store.place(shape(1, 0, 0), false).unwrap();
        assert!(matches!(
            store.place(shape(1, 4, 4), false),
            Err(EditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_query_region_is_duplicate_free() {
        let mut store = ElementStore::new(true);
        store
            .place(tile(1, 0, 0).with_size(UVec2::new(3, 3)), false)
            .unwrap();
        store.place(tile(2, 5, 5), false).unwrap();

        let rect = CellRect::from_corners(IVec2::new(0, 0), IVec2::new(2, 2));
        assert_eq!(store.query_region(&rect), BTreeSet::from([ElementId(1)]));

        let everything = CellRect::from_corners(IVec2::new(-10, -10), IVec2::new(10, 10));
        assert_eq!(
            store.query_region(&everything),
            BTreeSet::from([ElementId(1), ElementId(2)])
        );
    }

    #[test]
    fn test_query_region_both_strategies_agree() {
        let mut store = ElementStore::new(true);
        for i in 0..20 {
            store.place(tile(i, i as i32, (i % 4) as i32), false).unwrap();
        }
        // Small rect walks the rectangle, huge rect walks the index.
        let small = CellRect::from_corners(IVec2::new(2, 0), IVec2::new(5, 3));
        let large = CellRect::from_corners(IVec2::new(2, 0), IVec2::new(5, 1000));
        assert_eq!(store.query_region(&small), store.query_region(&large));
        assert_eq!(store.query_region(&small).len(), 4);
    }

    #[test]
    fn test_set_exclusive_rejects_shared_cells() {
        let mut store = ElementStore::new(false);
        store.place(shape(1, 3, 3), false).unwrap();
        store.place(shape(2, 3, 3), false).unwrap();

        assert_eq!(
            store.set_exclusive(true),
            Err(EditError::CellOccupied {
                cell: IVec2::new(3, 3)
            })
        );
        assert!(!store.is_exclusive());

        store.remove(ElementId(2));
        store.set_exclusive(true).unwrap();
        assert!(store.is_exclusive());
    }

    #[test]
    fn test_first_conflict_ignores_listed_ids() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 0, 0), false).unwrap();
        let moved = tile(1, 0, 0).translated(IVec2::new(0, 0));

        assert_eq!(
            store.first_conflict(&moved, &BTreeSet::new()),
            Some(IVec2::ZERO)
        );
        assert_eq!(
            store.first_conflict(&moved, &BTreeSet::from([ElementId(1)])),
            None
        );
    }

    #[test]
    fn test_integrity_of_valid_store() {
        let mut store = ElementStore::new(true);
        store
            .place(tile(1, 0, 0).with_size(UVec2::new(2, 2)), false)
            .unwrap();
        store.place(tile(2, 4, 4), false).unwrap();
        store.remove(ElementId(1));
        store.check_integrity().unwrap();
    }

    #[test]
    fn test_integrity_detects_orphaned_reference() {
        let mut store = ElementStore::new(true);
        store.place(tile(1, 0, 0), false).unwrap();
        store
            .cells
            .entry(IVec2::new(7, 7))
            .or_default()
            .insert(ElementId(1));

        assert_eq!(
            store.check_integrity(),
            Err(EditError::OrphanedElement {
                element: ElementId(1)
            })
        );
    }
}
