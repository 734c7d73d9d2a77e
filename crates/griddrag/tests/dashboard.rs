//! End-to-end use of the facade: two dashboards configured from TOML, a
//! widget moved between them through a `before_drop` hook.

use futures::FutureExt;
use griddrag::prelude::*;
use griddrag::runtime::HookFuture;
use serde_json::{Value, json};

const CONFIG: &str = r#"
min_column_span = 1
min_row_span = 1

[defaults]
droppable_in = true
droppable_out = true
removable = true
"#;

fn dashboards() -> Result<(GridEngine<Value>, GridId, GridId, BlockId)> {
    let mut board = Board::new();
    let left = board.add_root(Grid::new(4, 4).with_area(Rect::new(0.0, 0.0, 400.0, 400.0)))?;
    let right =
        board.add_root(Grid::new(4, 4).with_area(Rect::new(500.0, 0.0, 400.0, 400.0)))?;
    let widget = board.add_block(
        left,
        Block::new(CellSpan::cell(1, 1), json!({ "title": "cpu", "weight": 3 })),
    )?;
    let config = EngineConfig::from_toml_str(CONFIG)?;
    Ok((GridEngine::new(board, config)?, left, right, widget))
}

fn pointer(block: BlockId) -> [InputEvent; 3] {
    [
        InputEvent::Pointer(PointerEvent::down(
            1,
            Point::new(50.0, 50.0),
            PointerTarget::Block {
                block,
                handle: None,
            },
        )),
        InputEvent::Pointer(PointerEvent::moved(1, Point::new(750.0, 250.0))),
        InputEvent::Pointer(PointerEvent::up(1, Point::new(750.0, 250.0))),
    ]
}

#[test]
fn widget_moves_between_dashboards() -> Result<()> {
    let (mut engine, left, right, widget) = dashboards()?;
    engine.set_before_drop(right, |mut item: Block<Value>| -> HookFuture<Value> {
        if let Some(weight) = item.data["weight"].as_i64() {
            item.data["weight"] = json!(weight * 2);
        }
        futures::future::ready(Ok(item)).boxed_local()
    })?;

    let events: Vec<EngineEvent> = pointer(widget)
        .into_iter()
        .flat_map(|event| engine.dispatch(event))
        .collect();
    assert!(events.iter().any(|event| matches!(
        event,
        EngineEvent::TransferAccepted { block, to, .. } if *block == widget && *to == right
    )));

    let board = engine.board();
    assert_eq!(board.owner_of(widget), Some(right));
    assert_eq!(
        board.block(widget).map(|b| b.span),
        Some(CellSpan::cell(3, 3))
    );
    assert_eq!(
        board.block(widget).map(|b| b.data["weight"].clone()),
        Some(json!(6))
    );
    assert!(board.grid(left).is_some_and(|g| g.blocks.is_empty()));
    assert!(board.validate().is_ok());
    Ok(())
}

#[test]
fn moved_widget_can_be_removed() -> Result<()> {
    let (mut engine, _, right, widget) = dashboards()?;
    for event in pointer(widget) {
        engine.dispatch(event);
    }
    let removed = engine.remove_block(widget)?;
    assert_eq!(removed.data["title"], json!("cpu"));
    assert_eq!(
        engine.drain_events(),
        vec![EngineEvent::Removed {
            block: widget,
            grid: right,
        }]
    );
    Ok(())
}

#[test]
fn bad_config_is_reported() {
    let err = EngineConfig::from_toml_str("min_row_span = \"wide\"").expect_err("bad type");
    let err: Error = err.into();
    assert!(matches!(err, Error::Config(_)));
}
