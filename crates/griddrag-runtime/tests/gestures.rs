//! End-to-end drag, resize and cancel flows through `GridEngine::dispatch`.

use griddrag_core::{
    BlockId, CancelReason, GridId, InputEvent, KeyCode, KeyEvent, Point, PointerEvent,
    PointerTarget, Rect, ResizeDirection,
};
use griddrag_layout::{Block, Board, CascadeOptions, CellSpan, Grid};
use griddrag_runtime::{EngineConfig, EngineError, EngineEvent, GestureKind, GridEngine};

struct Setup {
    engine: GridEngine<u32>,
    grid: GridId,
    block: BlockId,
}

fn setup(grid: Grid<u32>, span: CellSpan) -> Setup {
    setup_with(grid, Block::new(span, 1), EngineConfig::default())
}

fn setup_with(grid: Grid<u32>, block: Block<u32>, config: EngineConfig) -> Setup {
    let mut board = Board::new();
    let grid = board
        .add_root(grid.with_area(Rect::new(0.0, 0.0, 400.0, 400.0)))
        .expect("root");
    let block = board.add_block(grid, block).expect("block");
    Setup {
        engine: GridEngine::new(board, config).expect("valid config"),
        grid,
        block,
    }
}

fn press(block: BlockId, x: f64, y: f64) -> InputEvent {
    InputEvent::Pointer(PointerEvent::down(
        1,
        Point::new(x, y),
        PointerTarget::Block {
            block,
            handle: None,
        },
    ))
}

fn move_to(x: f64, y: f64) -> InputEvent {
    InputEvent::Pointer(PointerEvent::moved(1, Point::new(x, y)))
}

fn release(x: f64, y: f64) -> InputEvent {
    InputEvent::Pointer(PointerEvent::up(1, Point::new(x, y)))
}

fn span_of(engine: &GridEngine<u32>, block: BlockId) -> Option<CellSpan> {
    engine.board().block(block).map(|record| record.span)
}

fn committed(events: &[EngineEvent]) -> Option<CellSpan> {
    events.iter().find_map(|event| match event {
        EngineEvent::Committed { span, .. } => Some(*span),
        _ => None,
    })
}

#[test]
fn drag_two_columns_on_a_fixed_grid() {
    let Setup {
        mut engine,
        grid,
        block,
    } = setup(Grid::new(4, 4), CellSpan::new(1, 2, 1, 2));

    let events = engine.dispatch(press(block, 50.0, 50.0));
    assert!(events.contains(&EngineEvent::Selected {
        grid,
        block: Some(block),
    }));
    assert!(matches!(events.last(), Some(EngineEvent::DragProgress(_))));

    let events = engine.dispatch(move_to(250.0, 50.0));
    let Some(EngineEvent::DragProgress(progress)) = events.first() else {
        panic!("expected drag progress, got {events:?}");
    };
    assert_eq!(progress.span, CellSpan::new(3, 4, 1, 2));
    assert_eq!(progress.rect, Rect::new(200.0, 0.0, 100.0, 100.0));

    let events = engine.dispatch(release(250.0, 50.0));
    assert_eq!(committed(&events), Some(CellSpan::new(3, 4, 1, 2)));
    assert_eq!(span_of(&engine, block), Some(CellSpan::new(3, 4, 1, 2)));
    assert!(engine.active_gestures().is_empty());
}

#[test]
fn drag_five_columns_on_an_expandable_grid() {
    let Setup {
        mut engine,
        grid,
        block,
    } = setup(
        Grid::new(4, 4).expandable(true, false),
        CellSpan::new(1, 2, 1, 2),
    );

    engine.dispatch(press(block, 50.0, 50.0));
    let events = engine.dispatch(move_to(550.0, 50.0));
    assert!(events.contains(&EngineEvent::GridExpanded {
        grid,
        columns: 6,
        rows: 4,
    }));
    let events = engine.dispatch(release(550.0, 50.0));
    assert_eq!(committed(&events), Some(CellSpan::new(6, 7, 1, 2)));
    assert!(engine.board().grid(grid).is_some_and(|g| g.columns >= 6));
}

#[test]
fn fixed_grids_clamp_drags_at_the_edge() {
    let Setup {
        mut engine, block, ..
    } = setup(Grid::new(4, 4), CellSpan::new(1, 2, 1, 2));
    engine.dispatch(press(block, 50.0, 50.0));
    engine.dispatch(move_to(950.0, 50.0));
    let events = engine.dispatch(release(950.0, 50.0));
    assert_eq!(committed(&events), Some(CellSpan::new(4, 5, 1, 2)));
}

#[test]
fn overlapping_candidates_keep_the_previous_preview() {
    let mut board = Board::new();
    let grid = board
        .add_root(Grid::new(4, 1).with_area(Rect::new(0.0, 0.0, 400.0, 100.0)))
        .expect("root");
    let dragged = board
        .add_block(grid, Block::new(CellSpan::cell(1, 1), 0))
        .expect("dragged");
    board
        .add_block(grid, Block::new(CellSpan::cell(3, 1), 0))
        .expect("obstacle");
    let mut engine = GridEngine::from_board(board);

    engine.dispatch(press(dragged, 50.0, 50.0));
    let events = engine.dispatch(move_to(150.0, 50.0));
    assert_eq!(events.len(), 1);
    let events = engine.dispatch(move_to(250.0, 50.0));
    assert!(events.is_empty(), "rejected move emitted {events:?}");
    let events = engine.dispatch(release(250.0, 50.0));
    assert_eq!(committed(&events), Some(CellSpan::cell(2, 1)));
}

#[test]
fn resize_from_the_south_east_handle() {
    let Setup {
        mut engine, block, ..
    } = setup(Grid::new(4, 4), CellSpan::new(1, 2, 1, 2));

    let down = PointerEvent::down(
        1,
        Point::new(95.0, 95.0),
        PointerTarget::ResizeHandle {
            block,
            direction: ResizeDirection::SE,
        },
    );
    engine.dispatch(InputEvent::Pointer(down));
    let events = engine.dispatch(move_to(195.0, 295.0));
    let Some(EngineEvent::ResizeProgress(progress)) = events.first() else {
        panic!("expected resize progress, got {events:?}");
    };
    assert_eq!(progress.cursor, "se-resize");
    assert_eq!(progress.direction, ResizeDirection::SE);
    assert_eq!(progress.span, CellSpan::new(1, 3, 1, 4));
    assert_eq!(progress.rect, Rect::new(0.0, 0.0, 200.0, 300.0));

    let events = engine.dispatch(release(195.0, 295.0));
    assert!(events.contains(&EngineEvent::Committed {
        block,
        grid: progress.grid,
        span: CellSpan::new(1, 3, 1, 4),
        kind: GestureKind::Resize {
            direction: ResizeDirection::SE,
        },
    }));
}

#[test]
fn resize_respects_configured_minimum() {
    let config = EngineConfig {
        min_column_span: 2,
        ..EngineConfig::default()
    };
    let Setup {
        mut engine, block, ..
    } = setup_with(
        Grid::new(4, 4),
        Block::new(CellSpan::new(1, 4, 1, 2), 1),
        config,
    );
    let down = PointerEvent::down(
        1,
        Point::new(295.0, 50.0),
        PointerTarget::ResizeHandle {
            block,
            direction: ResizeDirection::E,
        },
    );
    engine.dispatch(InputEvent::Pointer(down));
    engine.dispatch(move_to(0.0, 50.0));
    let events = engine.dispatch(release(0.0, 50.0));
    assert_eq!(committed(&events), Some(CellSpan::new(1, 3, 1, 2)));
}

#[test]
fn escape_restores_the_grid_exactly() {
    let Setup {
        mut engine,
        grid,
        block,
    } = setup(
        Grid::new(4, 4).expandable(true, true),
        CellSpan::new(1, 2, 1, 2),
    );
    engine.select(grid, None).expect("known grid");
    let before = engine.board().grid(grid).cloned();

    engine.dispatch(press(block, 50.0, 50.0));
    engine.dispatch(move_to(750.0, 650.0));
    assert_ne!(engine.board().grid(grid).cloned(), before);

    let events = engine.dispatch(InputEvent::Key(KeyEvent::new(KeyCode::Escape)));
    assert!(events.contains(&EngineEvent::Cancelled {
        block,
        grid,
        span: CellSpan::new(1, 2, 1, 2),
        reason: CancelReason::EscapeKey,
    }));
    assert_eq!(engine.board().grid(grid).cloned(), before);
    assert!(engine.active_gestures().is_empty());
}

#[test]
fn platform_cancel_and_blur_cancel_too() {
    let Setup {
        mut engine, block, ..
    } = setup(Grid::new(4, 4), CellSpan::new(1, 2, 1, 2));
    engine.dispatch(press(block, 50.0, 50.0));
    engine.dispatch(move_to(250.0, 50.0));
    let events = engine.dispatch(InputEvent::Pointer(PointerEvent::cancel(
        1,
        Point::new(250.0, 50.0),
        CancelReason::CaptureLost,
    )));
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::Cancelled {
            reason: CancelReason::CaptureLost,
            ..
        }]
    ));
    assert_eq!(span_of(&engine, block), Some(CellSpan::new(1, 2, 1, 2)));

    engine.dispatch(press(block, 50.0, 50.0));
    let events = engine.dispatch(InputEvent::Blur);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::Cancelled {
            reason: CancelReason::FocusLost,
            ..
        }]
    ));
}

#[test]
fn escape_can_be_disabled() {
    let config = EngineConfig {
        cancel_on_escape: false,
        ..EngineConfig::default()
    };
    let Setup {
        mut engine, block, ..
    } = setup_with(
        Grid::new(4, 4),
        Block::new(CellSpan::cell(1, 1), 1),
        config,
    );
    engine.dispatch(press(block, 50.0, 50.0));
    assert!(engine
        .dispatch(InputEvent::Key(KeyEvent::new(KeyCode::Escape)))
        .is_empty());
    assert_eq!(engine.active_gestures().len(), 1);
}

#[test]
fn second_pointer_on_a_busy_block_is_ignored() {
    let Setup {
        mut engine, block, ..
    } = setup(Grid::new(4, 4), CellSpan::new(1, 2, 1, 2));
    engine.dispatch(press(block, 50.0, 50.0));
    let events = engine.dispatch(InputEvent::Pointer(PointerEvent::down(
        2,
        Point::new(60.0, 60.0),
        PointerTarget::Block {
            block,
            handle: None,
        },
    )));
    assert_eq!(
        events,
        vec![EngineEvent::Ignored {
            pointer_id: 2,
            error: EngineError::Busy(block),
        }]
    );
    assert_eq!(engine.active_gestures().len(), 1);
}

#[test]
fn readonly_blocks_select_but_never_drag() {
    let Setup {
        mut engine,
        grid,
        block,
    } = setup(
        Grid::new(4, 4).with_options(CascadeOptions::new().readonly(true).draggable(true)),
        CellSpan::cell(1, 1),
    );
    let events = engine.dispatch(press(block, 50.0, 50.0));
    assert_eq!(
        events,
        vec![
            EngineEvent::Selected {
                grid,
                block: Some(block),
            },
            EngineEvent::Ignored {
                pointer_id: 1,
                error: EngineError::NotDraggable(block),
            },
        ]
    );
    assert!(engine.effective(block).is_ok_and(|e| !e.resizable));
}

#[test]
fn drag_handles_must_match() {
    let Setup {
        mut engine, block, ..
    } = setup(
        Grid::new(4, 4).with_options(CascadeOptions::new().drag_handler(".title")),
        CellSpan::cell(1, 1),
    );
    let body = InputEvent::Pointer(PointerEvent::down(
        1,
        Point::new(50.0, 50.0),
        PointerTarget::Block {
            block,
            handle: None,
        },
    ));
    assert!(engine.dispatch(body).iter().any(|event| matches!(
        event,
        EngineEvent::Ignored {
            error: EngineError::HandleMismatch { .. },
            ..
        }
    )));
    let title = InputEvent::Pointer(PointerEvent::down(
        1,
        Point::new(50.0, 5.0),
        PointerTarget::Block {
            block,
            handle: Some(".title".into()),
        },
    ));
    assert!(matches!(
        engine.dispatch(title).last(),
        Some(EngineEvent::DragProgress(_))
    ));
}

#[test]
fn removal_honours_removable() {
    let Setup {
        mut engine, block, ..
    } = setup(Grid::new(4, 4), CellSpan::cell(1, 1));
    assert_eq!(
        engine.remove_block(block),
        Err(EngineError::NotRemovable(block))
    );

    let Setup {
        mut engine,
        grid: other,
        block: removable,
    } = setup_with(
        Grid::new(4, 4),
        Block::new(CellSpan::cell(2, 2), 5).with_options(CascadeOptions::new().removable(true)),
        EngineConfig::default(),
    );
    let removed = engine.remove_block(removable).expect("removable");
    assert_eq!(removed.data, 5);
    assert_eq!(
        engine.drain_events(),
        vec![EngineEvent::Removed {
            block: removable,
            grid: other,
        }]
    );
    assert!(engine.board().grid(other).is_some_and(|g| g.blocks.is_empty()));
    assert_eq!(
        engine.remove_block(removable),
        Err(EngineError::UnknownBlock(removable))
    );
}

#[test]
fn hysteresis_delays_reevaluation() {
    let config = EngineConfig {
        update_hysteresis_px: 40.0,
        ..EngineConfig::default()
    };
    let Setup {
        mut engine, block, ..
    } = setup_with(
        Grid::new(4, 4),
        Block::new(CellSpan::cell(1, 1), 1),
        config,
    );
    engine.dispatch(press(block, 50.0, 50.0));
    assert!(engine.dispatch(move_to(80.0, 50.0)).is_empty());
    assert!(!engine.dispatch(move_to(160.0, 50.0)).is_empty());
}

#[test]
fn nested_drags_use_the_nested_geometry() {
    for (debug, expected) in [(true, CellSpan::cell(2, 1)), (false, CellSpan::cell(4, 1))] {
        let inner = Grid::new(2, 2)
            .expandable(true, false)
            .with_block(Block::new(CellSpan::cell(1, 1), 0));
        let outer = Grid::new(2, 1)
            .with_debug(debug)
            .with_area(Rect::new(0.0, 0.0, 400.0, 200.0))
            .with_block(Block::new(CellSpan::cell(1, 1), 0).with_child(inner));
        let mut board = Board::new();
        board.add_root(outer).expect("root");
        let owner = board.roots()[0].blocks[0].id;
        let nested = board
            .block(owner)
            .and_then(|b| b.child.as_deref())
            .map(|g| g.blocks[0].id)
            .expect("nested block");
        let mut engine = GridEngine::from_board(board);

        engine.dispatch(press(nested, 50.0, 50.0));
        engine.dispatch(move_to(350.0, 50.0));
        let events = engine.dispatch(release(350.0, 50.0));
        assert_eq!(committed(&events), Some(expected), "debug = {debug}");
        assert_eq!(span_of(&engine, owner), Some(CellSpan::cell(1, 1)));
    }
}
