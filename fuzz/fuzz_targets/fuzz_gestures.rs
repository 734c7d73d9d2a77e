#![no_main]

use arbitrary::Arbitrary;
use griddrag_core::{
    BlockId, CancelReason, InputEvent, KeyCode, KeyEvent, Point, PointerEvent, PointerTarget, Rect,
    ResizeDirection,
};
use griddrag_layout::{Block, Board, CascadeOptions, CellSpan, Grid};
use griddrag_runtime::{EngineConfig, GridEngine, HookError, HookFuture};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    expand_columns: bool,
    expand_rows: bool,
    hysteresis: u8,
    failing_hook: bool,
    ops: Vec<Op>,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Drag { pointer: u8, block: u8, x: i16, y: i16 },
    Resize { pointer: u8, block: u8, direction: u8, x: i16, y: i16 },
    Move { pointer: u8, x: i16, y: i16 },
    Up { pointer: u8, x: i16, y: i16 },
    Cancel { pointer: u8 },
    Escape,
    Blur,
    Poll,
    Abandon { block: u8 },
    Remove { block: u8 },
}

fn board(scenario: &Scenario) -> Board<u8> {
    let mut board = Board::new();
    let options = CascadeOptions::new()
        .droppable_in(true)
        .droppable_out(true)
        .removable(true);
    let left = Grid::new(4, 4)
        .with_area(Rect::new(0.0, 0.0, 400.0, 400.0))
        .expandable(scenario.expand_columns, scenario.expand_rows)
        .with_options(options.clone())
        .with_block(Block::new(CellSpan::cell(1, 1), 1))
        .with_block(Block::new(CellSpan::new(2, 4, 1, 2), 2))
        .with_block(
            Block::new(CellSpan::new(1, 3, 2, 4), 3)
                .with_child(Grid::new(2, 2).with_block(Block::new(CellSpan::cell(2, 2), 4))),
        );
    let right = Grid::new(3, 3)
        .with_area(Rect::new(500.0, 0.0, 300.0, 300.0))
        .with_options(options)
        .with_block(Block::new(CellSpan::cell(3, 3), 5));
    board.add_root(left).expect("left root");
    board.add_root(right).expect("right root");
    board
}

fn blocks(engine: &GridEngine<u8>) -> Vec<BlockId> {
    engine
        .board()
        .grids()
        .into_iter()
        .flat_map(|grid| grid.blocks.iter().map(|block| block.id))
        .collect()
}

fn pick(ids: &[BlockId], index: u8) -> Option<BlockId> {
    (!ids.is_empty()).then(|| ids[usize::from(index) % ids.len()])
}

fn point(x: i16, y: i16) -> Point {
    Point::new(f64::from(x) / 16.0, f64::from(y) / 16.0)
}

fuzz_target!(|scenario: Scenario| {
    let config = EngineConfig {
        update_hysteresis_px: f64::from(scenario.hysteresis % 32),
        ..EngineConfig::default()
    };
    let Ok(mut engine) = GridEngine::new(board(&scenario), config) else {
        return;
    };
    let grids: Vec<_> = engine.board().grids().iter().map(|grid| grid.id).collect();
    if scenario.failing_hook {
        if let Some(&grid) = grids.last() {
            let _ = engine.set_before_drop(grid, |_item: Block<u8>| -> HookFuture<u8> {
                Box::pin(async { Err::<Block<u8>, _>(HookError::new("refused")) })
            });
        }
    }

    for op in scenario.ops.iter().take(256) {
        let ids = blocks(&engine);
        match *op {
            Op::Drag { pointer, block, x, y } => {
                if let Some(block) = pick(&ids, block) {
                    engine.dispatch(InputEvent::Pointer(PointerEvent::down(
                        u32::from(pointer % 4),
                        point(x, y),
                        PointerTarget::Block { block, handle: None },
                    )));
                }
            }
            Op::Resize { pointer, block, direction, x, y } => {
                if let Some(block) = pick(&ids, block) {
                    let direction =
                        ResizeDirection::ALL[usize::from(direction) % ResizeDirection::ALL.len()];
                    engine.dispatch(InputEvent::Pointer(PointerEvent::down(
                        u32::from(pointer % 4),
                        point(x, y),
                        PointerTarget::ResizeHandle { block, direction },
                    )));
                }
            }
            Op::Move { pointer, x, y } => {
                engine.dispatch(InputEvent::Pointer(PointerEvent::moved(
                    u32::from(pointer % 4),
                    point(x, y),
                )));
            }
            Op::Up { pointer, x, y } => {
                engine.dispatch(InputEvent::Pointer(PointerEvent::up(
                    u32::from(pointer % 4),
                    point(x, y),
                )));
            }
            Op::Cancel { pointer } => {
                engine.dispatch(InputEvent::Pointer(PointerEvent::cancel(
                    u32::from(pointer % 4),
                    Point::new(0.0, 0.0),
                    CancelReason::PointerCancel,
                )));
            }
            Op::Escape => {
                engine.dispatch(InputEvent::Key(KeyEvent::new(KeyCode::Escape)));
            }
            Op::Blur => {
                engine.dispatch(InputEvent::Blur);
            }
            Op::Poll => {
                engine.poll_transfers_now();
            }
            Op::Abandon { block } => {
                if let Some(block) = pick(&ids, block) {
                    let _ = engine.abandon_transfer(block);
                }
            }
            Op::Remove { block } => {
                if let Some(block) = pick(&ids, block) {
                    let _ = engine.remove_block(block);
                }
            }
        }
        assert!(engine.board().validate().is_ok(), "board invariant broken after {op:?}");
    }

    engine.cancel_gestures();
    engine.poll_transfers_now();
    assert!(engine.board().validate().is_ok());
});
