//! Generated edit sequences driven through a document and an edit session.
//!
//! For any mix of strokes, selection edits and layer operations:
//!
//! 1. Undoing every recorded command restores the starting layers.
//! 2. Undoing and then redoing every command restores the edited layers.
//! 3. No user-level edit halts the history, and the document stays consistent
//!    after every step.

use bevy::math::{IVec2, Rect, UVec2, Vec2};
use proptest::prelude::*;

use crate::editor::{Brush, EditSession, EditorTool};
use crate::error::EditResult;
use crate::geometry::MapBounds;
use crate::map::{LayerId, MapDocument};

const CELL: f32 = 10.0;
const MAP_SIZE: u32 = 8;

#[derive(Debug, Clone)]
enum Op {
    Stroke {
        erase: bool,
        size: u32,
        replace: bool,
        points: Vec<(i32, i32)>,
    },
    MoveRegion {
        from: (i32, i32),
        to: (i32, i32),
        delta: (i32, i32),
    },
    TransferRegion {
        from: (i32, i32),
        to: (i32, i32),
        target: usize,
    },
    EraseRegion {
        from: (i32, i32),
        to: (i32, i32),
    },
    AddLayer {
        exclusive: bool,
    },
    RemoveLayer(usize),
    DuplicateLayer(usize),
    Reorder {
        layer: usize,
        to: usize,
    },
    Rename(usize),
    SetExclusive {
        layer: usize,
        exclusive: bool,
    },
    Activate(usize),
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Cells on the map plus a margin around it
fn cell_strategy() -> impl Strategy<Value = (i32, i32)> {
    (-2i32..MAP_SIZE as i32 + 2, -2i32..MAP_SIZE as i32 + 2)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (
            any::<bool>(),
            1u32..=2,
            any::<bool>(),
            proptest::collection::vec(cell_strategy(), 1..5),
        )
            .prop_map(|(erase, size, replace, points)| Op::Stroke {
                erase,
                size,
                replace,
                points,
            }),
        2 => (cell_strategy(), cell_strategy(), (-3i32..=3, -3i32..=3))
            .prop_map(|(from, to, delta)| Op::MoveRegion { from, to, delta }),
        1 => (cell_strategy(), cell_strategy(), 0usize..4)
            .prop_map(|(from, to, target)| Op::TransferRegion { from, to, target }),
        1 => (cell_strategy(), cell_strategy())
            .prop_map(|(from, to)| Op::EraseRegion { from, to }),
        1 => any::<bool>().prop_map(|exclusive| Op::AddLayer { exclusive }),
        1 => (0usize..4).prop_map(Op::RemoveLayer),
        1 => (0usize..4).prop_map(Op::DuplicateLayer),
        1 => (0usize..4, 0usize..5).prop_map(|(layer, to)| Op::Reorder { layer, to }),
        1 => (0usize..4).prop_map(Op::Rename),
        1 => (0usize..4, any::<bool>())
            .prop_map(|(layer, exclusive)| Op::SetExclusive { layer, exclusive }),
        1 => (0usize..4).prop_map(Op::Activate),
    ]
}

fn at((x, y): (i32, i32)) -> Vec2 {
    Vec2::new(x as f32 * CELL + CELL / 2.0, y as f32 * CELL + CELL / 2.0)
}

fn region(from: (i32, i32), to: (i32, i32)) -> Rect {
    Rect::from_corners(at(from), at(to))
}

fn layer_at(doc: &MapDocument, index: usize) -> LayerId {
    let layers = doc.layers();
    layers
        .at(index % layers.len())
        .map(|layer| layer.id())
        .unwrap_or_else(|| doc.top_layer_id())
}

fn select(session: &mut EditSession, doc: &MapDocument, from: (i32, i32), to: (i32, i32)) -> EditResult<()> {
    session.set_tool(EditorTool::Select);
    session.select_region(doc, region(from, to)).map(|_| ())
}

fn apply(op: &Op, doc: &mut MapDocument, session: &mut EditSession) -> EditResult<()> {
    match op {
        Op::Stroke {
            erase,
            size,
            replace,
            points,
        } => {
            session.set_tool(if *erase {
                EditorTool::Erase
            } else {
                EditorTool::Paint
            });
            session.brush = Brush::tile(0, points.len() as u32).with_size(UVec2::splat(*size));
            session.replace_existing = *replace;

            session.begin_stroke(doc, at(points[0]))?;
            for point in &points[1..] {
                // Samples off the map are reported but keep the stroke going
                let _ = session.continue_stroke(doc, at(*point));
            }
            session.end_stroke(doc).map(|_| ())
        }
        Op::MoveRegion { from, to, delta } => {
            select(session, doc, *from, *to)?;
            session.move_selection(doc, IVec2::new(delta.0, delta.1))
        }
        Op::TransferRegion { from, to, target } => {
            select(session, doc, *from, *to)?;
            let target = layer_at(doc, *target);
            session.transfer_selection(doc, target)
        }
        Op::EraseRegion { from, to } => {
            select(session, doc, *from, *to)?;
            session.erase_selection(doc).map(|_| ())
        }
        Op::AddLayer { exclusive } => doc.add_layer_with("generated", *exclusive).map(|_| ()),
        Op::RemoveLayer(index) => doc.remove_layer(layer_at(doc, *index)),
        Op::DuplicateLayer(index) => doc.duplicate_layer(layer_at(doc, *index)).map(|_| ()),
        Op::Reorder { layer, to } => doc.reorder(layer_at(doc, *layer), *to).map(|_| ()),
        Op::Rename(index) => {
            let name = format!("renamed {index}");
            doc.rename_layer(layer_at(doc, *index), name)
        }
        Op::SetExclusive { layer, exclusive } => doc.set_exclusive(layer_at(doc, *layer), *exclusive),
        Op::Activate(index) => {
            let layer = layer_at(doc, *index);
            session.set_active_layer(doc, layer)
        }
    }
}

fn new_document() -> (MapDocument, EditSession) {
    let mut doc = MapDocument::new("generated", MapBounds::new(MAP_SIZE, MAP_SIZE), CELL).unwrap();
    doc.set_history_depth(1000);
    let session = EditSession::new(&doc);
    (doc, session)
}

/// Run `ops`, checking after every step that nothing halted and the document
/// is consistent
fn run(ops: &[Op], doc: &mut MapDocument, session: &mut EditSession) -> Result<(), TestCaseError> {
    for op in ops {
        if let Err(err) = apply(op, doc, session) {
            prop_assert!(!err.is_fatal(), "{:?} failed fatally: {}", op, err);
        }
        session.sync_with(doc);
        prop_assert!(!doc.history().is_halted(), "history halted after {:?}", op);
        prop_assert!(
            doc.check_integrity().is_ok(),
            "integrity broken after {:?}: {:?}",
            op,
            doc.check_integrity()
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_undo_all_restores_start(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let (mut doc, mut session) = new_document();
        let start = doc.layers().clone();

        run(&ops, &mut doc, &mut session)?;

        let recorded = doc.history().undo_count();
        for _ in 0..recorded {
            prop_assert!(doc.undo().is_ok());
            prop_assert!(doc.check_integrity().is_ok());
        }
        prop_assert!(!doc.history().can_undo());
        prop_assert_eq!(doc.layers(), &start);
    }

    #[test]
    fn test_undo_then_redo_restores_edits(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let (mut doc, mut session) = new_document();

        run(&ops, &mut doc, &mut session)?;
        let edited = doc.layers().clone();

        let recorded = doc.history().undo_count();
        for _ in 0..recorded {
            prop_assert!(doc.undo().is_ok());
        }
        prop_assert_eq!(doc.history().redo_count(), recorded);
        for _ in 0..recorded {
            prop_assert!(doc.redo().is_ok());
            prop_assert!(doc.check_integrity().is_ok());
        }
        prop_assert!(!doc.history().can_redo());
        prop_assert_eq!(doc.layers(), &edited);
    }

    #[test]
    fn test_partial_undo_then_redo_is_identity(
        ops in proptest::collection::vec(op_strategy(), 1..20),
        steps in 0usize..20,
    ) {
        let (mut doc, mut session) = new_document();

        run(&ops, &mut doc, &mut session)?;
        let edited = doc.layers().clone();

        let steps = steps.min(doc.history().undo_count());
        for _ in 0..steps {
            prop_assert!(session.undo(&mut doc).is_ok());
        }
        for _ in 0..steps {
            prop_assert!(session.redo(&mut doc).is_ok());
        }
        prop_assert_eq!(doc.layers(), &edited);
    }
}
