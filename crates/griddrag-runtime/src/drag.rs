//! Drag controller: whole-block moves inside the block's own grid.
//!
//! The pointer delta since pointer-down is converted into whole cells in the
//! grid geometry captured at pointer-down and applied to the pre-gesture span,
//! so a drag never accumulates rounding error. On an axis that may not grow
//! the candidate is pulled back inside the grid instead of being refused.

use griddrag_core::{BlockId, Point, Rect};
use griddrag_layout::{Axis, Board, CapabilityDefaults, CellSpan, Expansion};

use crate::error::EngineError;
use crate::gesture::{ActiveGesture, GestureKind};

/// Capture a drag of `block`, checking that it is draggable from `handle`.
pub fn begin<T>(
    board: &Board<T>,
    defaults: &CapabilityDefaults,
    pointer_id: u32,
    block: BlockId,
    handle: Option<&str>,
    position: Point,
) -> Result<ActiveGesture, EngineError> {
    let (gesture, effective) = ActiveGesture::capture(
        board,
        defaults,
        GestureKind::Drag,
        pointer_id,
        block,
        position,
    )?;
    if !effective.draggable {
        return Err(EngineError::NotDraggable(block));
    }
    if !effective.accepts_handle(handle) {
        return Err(EngineError::HandleMismatch {
            block,
            expected: effective.drag_handler.unwrap_or_default(),
        });
    }
    Ok(gesture)
}

/// Span the block would occupy at the gesture's current pointer position.
#[must_use]
pub fn candidate(
    gesture: &ActiveGesture,
    expansion: Expansion,
    columns: u32,
    rows: u32,
) -> CellSpan {
    let (dx, dy) = gesture.pointer_delta();
    let (dc, dr) = gesture.layout.delta_to_cells(dx, dy);
    let mut span = gesture.snapshot.translate(dc, dr);
    if !expansion.columns {
        span = span.clamp_axis(Axis::Column, columns);
    }
    if !expansion.rows {
        span = span.clamp_axis(Axis::Row, rows);
    }
    span
}

/// The pre-gesture rect translated by the pointer delta.
#[must_use]
pub fn ghost_rect(gesture: &ActiveGesture) -> Rect {
    let (dx, dy) = gesture.pointer_delta();
    gesture.ghost.translate(dx, dy)
}
