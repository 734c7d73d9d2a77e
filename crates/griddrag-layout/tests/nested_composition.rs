//! Nested composition across a board built from declarative JSON.
//!
//! Covers cascade propagation through several levels, derived nested areas,
//! the debug-disables-expansion coupling and at-rest invariants after random
//! programmatic placements.

use griddrag_core::{Point, Rect};
use griddrag_layout::{
    Block, Board, CapabilityDefaults, CellSpan, Expansion, Grid, Overflow, Placement, can_place,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn dashboard() -> Grid<Value> {
    let spec = json!({
        "columns": 4,
        "rows": 4,
        "gap": 10.0,
        "debug": true,
        "column_expandable": true,
        "overflow": "auto",
        "drag_handler": ".title",
        "area": { "x": 0.0, "y": 0.0, "width": 430.0, "height": 430.0 },
        "blocks": [
            {
                "column_start": 1, "column_end": 3, "row_start": 1, "row_end": 3,
                "data": { "name": "panel" },
                "readonly": true,
                "child": {
                    "columns": 2, "rows": 2,
                    "blocks": [
                        { "column_start": 1, "column_end": 2, "row_start": 1, "row_end": 2,
                          "draggable": true, "data": { "name": "locked" } }
                    ]
                }
            },
            {
                "column_start": 3, "column_end": 5, "row_start": 1, "row_end": 5,
                "data": { "name": "side" },
                "child": {
                    "columns": 1, "rows": 3,
                    "column_expandable": true, "row_expandable": true,
                    "droppable_in": true,
                    "blocks": [
                        { "column_start": 1, "column_end": 2, "row_start": 1, "row_end": 2,
                          "drag_handler": ".grip", "data": { "name": "note" } }
                    ]
                }
            }
        ]
    });
    serde_json::from_value(spec).expect("dashboard json is valid")
}

fn board() -> Board<Value> {
    let mut board = Board::new();
    board.add_root(dashboard()).expect("dashboard satisfies invariants");
    board
}

fn block_named<'a>(board: &'a Board<Value>, name: &str) -> &'a Block<Value> {
    board
        .grids()
        .into_iter()
        .flat_map(|grid| grid.blocks.iter())
        .find(|block| block.data["name"] == name)
        .expect("named block exists")
}

#[test]
fn readonly_panel_locks_nested_blocks() {
    let board = board();
    let defaults = CapabilityDefaults::default();
    let locked = block_named(&board, "locked").id;
    let effective = board.effective_block(&defaults, locked).expect("known block");
    assert!(effective.readonly);
    assert!(!effective.draggable);
    assert!(!effective.resizable);
    assert_eq!(effective.overflow, Overflow::Auto);
}

#[test]
fn handles_and_droppable_resolve_per_level() {
    let board = board();
    let defaults = CapabilityDefaults::default();
    let note = block_named(&board, "note").id;
    let side = board.owner_of(note).expect("note has an owner");
    let note_cfg = board.effective_block(&defaults, note).expect("known block");
    assert_eq!(note_cfg.drag_handler.as_deref(), Some(".grip"));
    assert!(note_cfg.droppable_in);
    assert!(board.effective_grid(&defaults, side).expect("grid").droppable_in);

    let panel = block_named(&board, "panel").id;
    let panel_cfg = board.effective_block(&defaults, panel).expect("known block");
    assert_eq!(panel_cfg.drag_handler.as_deref(), Some(".title"));
}

#[test]
fn nested_area_and_hit_testing() {
    let board = board();
    let note = block_named(&board, "note").id;
    let side = board.owner_of(note).expect("note has an owner");
    // Columns 3..5 of a 100px/10px-gap grid span x 220..430.
    assert_eq!(
        board.grid_area(side),
        Some(Rect::new(220.0, 0.0, 210.0, 430.0))
    );
    let hits = board.grids_at(Point::new(300.0, 50.0));
    assert_eq!(hits.first(), Some(&side));
    assert_eq!(hits.len(), 2);
}

#[test]
fn debug_root_keeps_own_expansion_but_disables_nested() {
    let board = board();
    let root = board.roots()[0].id;
    let note = block_named(&board, "note").id;
    let side = board.owner_of(note).expect("note has an owner");

    let root_lineage = board.lineage(root).expect("root lineage");
    assert_eq!(root_lineage.expansion(true), Expansion::new(true, false));

    let side_lineage = board.lineage(side).expect("side lineage");
    assert_eq!(side_lineage.expansion(true), Expansion::NONE);
    assert_eq!(side_lineage.expansion(false), Expansion::new(true, true));

    let side_grid = board.grid(side).expect("side grid");
    assert_eq!(
        can_place(side_grid, CellSpan::cell(1, 4), None, side_lineage.expansion(true)),
        Placement::Rejected(griddrag_layout::RejectReason::OutOfBounds {
            axis: griddrag_layout::Axis::Row,
            required: 4,
            available: 3,
        })
    );
}

proptest! {
    #[test]
    fn programmatic_placements_keep_board_valid(
        cells in proptest::collection::vec((1u32..6, 1u32..6, 1u32..3, 1u32..3), 1..24),
    ) {
        let mut board: Board<u32> = Board::new();
        let root = board
            .add_root(Grid::new(5, 5).with_area(Rect::new(0.0, 0.0, 500.0, 500.0)))
            .expect("empty root");
        for (i, (column, row, width, height)) in cells.into_iter().enumerate() {
            let _ = board.add_block(root, Block::new(CellSpan::at(column, row, width, height), i as u32));
        }
        prop_assert!(board.validate().is_ok());
    }
}
