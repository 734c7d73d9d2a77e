//! Resize controller: edge moves driven by one of eight compass handles.
//!
//! Only the edges named by the handle follow the pointer. End edges (east,
//! south) may push past the last track when the axis is expandable; start
//! edges (west, north) stop at line 1. A block never shrinks below the
//! configured minimum span, or below its own size if it started smaller.

use griddrag_core::{BlockId, Point, Rect, ResizeDirection};
use griddrag_layout::{Axis, Board, CapabilityDefaults, CellSpan, Expansion};

use crate::error::EngineError;
use crate::gesture::{ActiveGesture, GestureKind, GestureLimits};

/// Capture a resize of `block` from the `direction` handle.
pub fn begin<T>(
    board: &Board<T>,
    defaults: &CapabilityDefaults,
    pointer_id: u32,
    block: BlockId,
    direction: ResizeDirection,
    position: Point,
) -> Result<ActiveGesture, EngineError> {
    let (gesture, effective) = ActiveGesture::capture(
        board,
        defaults,
        GestureKind::Resize { direction },
        pointer_id,
        block,
        position,
    )?;
    if !effective.resizable {
        return Err(EngineError::NotResizable(block));
    }
    Ok(gesture)
}

/// Span the block would occupy at the gesture's current pointer position.
#[must_use]
pub fn candidate(
    gesture: &ActiveGesture,
    direction: ResizeDirection,
    expansion: Expansion,
    columns: u32,
    rows: u32,
    limits: &GestureLimits,
) -> CellSpan {
    let (dx, dy) = gesture.pointer_delta();
    let (dc, dr) = gesture.layout.delta_to_cells(dx, dy);
    let mut span = gesture.snapshot;
    if let Some(end_edge) = direction.horizontal_edge() {
        span = move_edge(
            span,
            Axis::Column,
            end_edge,
            dc,
            limits.min_column_span,
            if expansion.columns { u32::MAX } else { columns },
        );
    }
    if let Some(end_edge) = direction.vertical_edge() {
        span = move_edge(
            span,
            Axis::Row,
            end_edge,
            dr,
            limits.min_row_span,
            if expansion.rows { u32::MAX } else { rows },
        );
    }
    span
}

/// Move one edge of `span` by `cells`, honoring the minimum size and the
/// track limit of the axis.
fn move_edge(
    span: CellSpan,
    axis: Axis,
    end_edge: bool,
    cells: i32,
    min_span: u32,
    tracks: u32,
) -> CellSpan {
    let start = span.start(axis);
    let end = span.end(axis);
    let min = min_span.min(span.len(axis)).max(1);
    if end_edge {
        let last_line = tracks.saturating_add(1).max(start + 1);
        let moved = shift_line(end, cells).max(start + min).min(last_line);
        span.with_axis(axis, start, moved)
    } else {
        let moved = shift_line(start, cells).min(end.saturating_sub(min)).max(1);
        span.with_axis(axis, moved, end)
    }
}

fn shift_line(line: u32, cells: i32) -> u32 {
    let shifted = i64::from(line) + i64::from(cells);
    shifted.clamp(1, i64::from(u32::MAX)) as u32
}

/// The pre-gesture rect with the handle's edges moved by the pointer delta.
#[must_use]
pub fn ghost_rect(gesture: &ActiveGesture, direction: ResizeDirection) -> Rect {
    let (dx, dy) = gesture.pointer_delta();
    let ghost = gesture.ghost;
    let (mut left, mut right) = (ghost.left(), ghost.right());
    let (mut top, mut bottom) = (ghost.top(), ghost.bottom());
    match direction.horizontal_edge() {
        Some(true) => right = (right + dx).max(left),
        Some(false) => left = (left + dx).min(right),
        None => {}
    }
    match direction.vertical_edge() {
        Some(true) => bottom = (bottom + dy).max(top),
        Some(false) => top = (top + dy).min(bottom),
        None => {}
    }
    Rect::new(left, top, right - left, bottom - top)
}
