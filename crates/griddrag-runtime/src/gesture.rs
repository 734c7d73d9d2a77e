#![forbid(unsafe_code)]

//! Gesture lifecycle shared by drags and resizes.
//!
//! ```text
//! Idle -> Dragging | Resizing -> Idle   (commit, cancel or hand-off)
//! ```
//!
//! One [`ActiveGesture`] exists per pointer. Every step returns a
//! [`GestureTransition`] carrying a monotonic id, the phase before and after,
//! and the effect; steps that change nothing report an explicit
//! [`NoopReason`] instead of failing.
//!
//! Accepted previews are written to the board immediately (the block's span
//! and any grid growth), so the board always shows the live layout. The
//! pre-gesture span, track counts and selection are kept in the gesture so a
//! cancel can restore them exactly.

use griddrag_core::{BlockId, CancelReason, GridId, Point, Rect, ResizeDirection};
use griddrag_layout::{
    Axis, Board, CapabilityDefaults, CellSpan, EffectiveConfig, Expansion, Grid, Placement,
    RejectReason, TrackLayout, can_place,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::{drag, resize};

/// What a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureKind {
    Drag,
    Resize { direction: ResizeDirection },
}

impl GestureKind {
    #[must_use]
    pub const fn phase(self) -> GesturePhase {
        match self {
            Self::Drag => GesturePhase::Dragging,
            Self::Resize { .. } => GesturePhase::Resizing,
        }
    }
}

/// Coarse lifecycle state of one pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Idle,
    Dragging,
    Resizing,
}

/// Minimums and coupling applied while computing candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureLimits {
    pub min_column_span: u32,
    pub min_row_span: u32,
    pub debug_couples: bool,
}

impl From<&EngineConfig> for GestureLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            min_column_span: config.min_column_span.max(1),
            min_row_span: config.min_row_span.max(1),
            debug_couples: config.debug_disables_nested_expansion,
        }
    }
}

/// State of one in-flight drag or resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveGesture {
    pub kind: GestureKind,
    pub pointer_id: u32,
    pub block: BlockId,
    /// Grid the block lived in when the gesture began.
    pub grid: GridId,
    pub origin: Point,
    pub current: Point,
    last_evaluated: Point,
    /// Track geometry at pointer-down; pointer deltas are measured in it.
    pub layout: TrackLayout,
    /// Pixel rect of the block at pointer-down.
    pub ghost: Rect,
    /// Pre-gesture placement.
    pub snapshot: CellSpan,
    snapshot_tracks: (u32, u32),
    snapshot_selection: Option<BlockId>,
    /// Last accepted placement.
    pub preview: CellSpan,
    /// The block may leave its grid.
    pub droppable_out: bool,
    started: Instant,
}

impl ActiveGesture {
    /// Capture the block's current placement and geometry.
    ///
    /// Returns the block's effective configuration so the caller can decide
    /// whether the gesture is permitted.
    pub fn capture<T>(
        board: &Board<T>,
        defaults: &CapabilityDefaults,
        kind: GestureKind,
        pointer_id: u32,
        block: BlockId,
        position: Point,
    ) -> Result<(Self, EffectiveConfig), EngineError> {
        let grid = board.owner_of(block).ok_or(EngineError::UnknownBlock(block))?;
        let lineage = board.lineage(grid).ok_or(EngineError::UnknownGrid(grid))?;
        let owner = lineage.grid();
        let record = owner.block(block).ok_or(EngineError::UnknownBlock(block))?;
        let effective = lineage.effective_block(defaults, record);
        if owner.is_degenerate() {
            return Err(EngineError::DegenerateGrid(grid));
        }
        let layout = lineage
            .track_layout()
            .ok_or(EngineError::MissingArea(grid))?;
        let gesture = Self {
            kind,
            pointer_id,
            block,
            grid,
            origin: position,
            current: position,
            last_evaluated: position,
            layout,
            ghost: layout.cell_to_pixel(record.span),
            snapshot: record.span,
            snapshot_tracks: (owner.columns, owner.rows),
            snapshot_selection: owner.selected_child,
            preview: record.span,
            droppable_out: effective.droppable_out,
            started: Instant::now(),
        };
        Ok((gesture, effective))
    }

    /// Selection to restore on cancel (the grid's selection before the
    /// pointer-down that started this gesture).
    pub fn restore_selection_to(&mut self, selection: Option<BlockId>) {
        self.snapshot_selection = selection;
    }

    /// Pointer travel since pointer-down.
    #[must_use]
    pub fn pointer_delta(&self) -> (f64, f64) {
        self.current.delta_from(self.origin)
    }

    /// Track counts of the grid before the gesture.
    #[must_use]
    pub const fn snapshot_tracks(&self) -> (u32, u32) {
        self.snapshot_tracks
    }

    /// Continuous preview rect following the pointer.
    #[must_use]
    pub fn ghost_rect(&self) -> Rect {
        match self.kind {
            GestureKind::Drag => drag::ghost_rect(self),
            GestureKind::Resize { direction } => resize::ghost_rect(self, direction),
        }
    }

    fn candidate(
        &self,
        columns: u32,
        rows: u32,
        expansion: Expansion,
        limits: &GestureLimits,
    ) -> CellSpan {
        match self.kind {
            GestureKind::Drag => drag::candidate(self, expansion, columns, rows),
            GestureKind::Resize { direction } => {
                resize::candidate(self, direction, expansion, columns, rows, limits)
            }
        }
    }
}

/// Explicit no-op diagnostics for steps that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoopReason {
    /// No gesture is bound to the pointer.
    UnknownPointer,
    BelowHysteresis,
    /// The candidate equals the current preview.
    Unchanged,
    /// The candidate was refused; the previous preview stays.
    Rejected { reject: RejectReason },
    /// The drag is hovering another grid; the source preview is held.
    Transferring,
    /// The gesture's grid or block no longer exists.
    Detached,
}

/// Effect of one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum GestureEffect {
    Started {
        block: BlockId,
        grid: GridId,
        kind: GestureKind,
        ghost: Rect,
    },
    Updated {
        block: BlockId,
        grid: GridId,
        previous: CellSpan,
        preview: CellSpan,
        /// New `(columns, rows)` if the grid grew.
        expanded: Option<(u32, u32)>,
    },
    Committed {
        block: BlockId,
        grid: GridId,
        span: CellSpan,
        duration_us: u64,
    },
    Cancelled {
        block: BlockId,
        grid: GridId,
        restored: CellSpan,
        reason: CancelReason,
    },
    /// The drag ended over another grid; the transfer coordinator owns the
    /// block from here.
    HandedOff { block: BlockId, grid: GridId },
    Noop { reason: NoopReason },
}

/// One lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureTransition {
    pub transition_id: u64,
    pub pointer_id: u32,
    pub from: GesturePhase,
    pub to: GesturePhase,
    pub effect: GestureEffect,
}

/// Lifecycle machine for every pointer's gesture.
#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    active: FxHashMap<u32, ActiveGesture>,
    update_hysteresis: f64,
    transition_counter: u64,
}

impl GestureMachine {
    #[must_use]
    pub fn new(update_hysteresis: f64) -> Self {
        Self {
            active: FxHashMap::default(),
            update_hysteresis: update_hysteresis.max(0.0),
            transition_counter: 0,
        }
    }

    /// Gesture bound to `pointer_id`.
    #[must_use]
    pub fn get(&self, pointer_id: u32) -> Option<&ActiveGesture> {
        self.active.get(&pointer_id)
    }

    /// Active gestures ordered by pointer id.
    #[must_use]
    pub fn active(&self) -> Vec<&ActiveGesture> {
        let mut gestures: Vec<_> = self.active.values().collect();
        gestures.sort_by_key(|gesture| gesture.pointer_id);
        gestures
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether any pointer is manipulating `block`.
    #[must_use]
    pub fn is_block_busy(&self, block: BlockId) -> bool {
        self.active.values().any(|gesture| gesture.block == block)
    }

    /// Number of transitions recorded so far.
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_counter
    }

    /// Bind a captured gesture to its pointer.
    pub fn begin(&mut self, gesture: ActiveGesture) -> Result<GestureTransition, EngineError> {
        if self.active.contains_key(&gesture.pointer_id) {
            return Err(EngineError::PointerInUse(gesture.pointer_id));
        }
        if self.is_block_busy(gesture.block) {
            return Err(EngineError::Busy(gesture.block));
        }
        self.active.insert(gesture.pointer_id, gesture);
        Ok(self.record(
            gesture.pointer_id,
            GesturePhase::Idle,
            gesture.kind.phase(),
            GestureEffect::Started {
                block: gesture.block,
                grid: gesture.grid,
                kind: gesture.kind,
                ghost: gesture.ghost,
            },
        ))
    }

    /// Re-evaluate the gesture at `position`, writing an accepted preview to
    /// the board.
    pub fn update<T>(
        &mut self,
        board: &mut Board<T>,
        pointer_id: u32,
        position: Point,
        limits: &GestureLimits,
    ) -> GestureTransition {
        let hysteresis = self.update_hysteresis;
        let Some(gesture) = self.active.get_mut(&pointer_id) else {
            return self.noop(pointer_id, GesturePhase::Idle, NoopReason::UnknownPointer);
        };
        let phase = gesture.kind.phase();
        let effect = step(gesture, board, position, limits, hysteresis);
        self.record(pointer_id, phase, phase, effect)
    }

    /// Track the pointer without re-evaluating the source placement.
    pub fn hold(&mut self, pointer_id: u32, position: Point) -> GestureTransition {
        let Some(gesture) = self.active.get_mut(&pointer_id) else {
            return self.noop(pointer_id, GesturePhase::Idle, NoopReason::UnknownPointer);
        };
        gesture.current = position;
        gesture.last_evaluated = position;
        let phase = gesture.kind.phase();
        self.noop(pointer_id, phase, NoopReason::Transferring)
    }

    /// Keep the last accepted preview and end the gesture.
    pub fn commit(&mut self, pointer_id: u32) -> GestureTransition {
        let Some(gesture) = self.active.remove(&pointer_id) else {
            return self.noop(pointer_id, GesturePhase::Idle, NoopReason::UnknownPointer);
        };
        let duration_us = gesture.started.elapsed().as_micros() as u64;
        self.record(
            pointer_id,
            gesture.kind.phase(),
            GesturePhase::Idle,
            GestureEffect::Committed {
                block: gesture.block,
                grid: gesture.grid,
                span: gesture.preview,
                duration_us,
            },
        )
    }

    /// Restore the pre-gesture span, track counts and selection, then end
    /// the gesture.
    pub fn cancel<T>(
        &mut self,
        board: &mut Board<T>,
        pointer_id: u32,
        reason: CancelReason,
    ) -> GestureTransition {
        let Some(gesture) = self.active.remove(&pointer_id) else {
            return self.noop(pointer_id, GesturePhase::Idle, NoopReason::UnknownPointer);
        };
        let restored = restore_placement(board, &gesture).unwrap_or(gesture.snapshot);
        self.record(
            pointer_id,
            gesture.kind.phase(),
            GesturePhase::Idle,
            GestureEffect::Cancelled {
                block: gesture.block,
                grid: gesture.grid,
                restored,
                reason,
            },
        )
    }

    /// End the gesture without touching the board; the caller takes over.
    pub fn hand_off(&mut self, pointer_id: u32) -> Option<(ActiveGesture, GestureTransition)> {
        let gesture = self.active.remove(&pointer_id)?;
        let transition = self.record(
            pointer_id,
            gesture.kind.phase(),
            GesturePhase::Idle,
            GestureEffect::HandedOff {
                block: gesture.block,
                grid: gesture.grid,
            },
        );
        Some((gesture, transition))
    }

    fn noop(&mut self, pointer_id: u32, phase: GesturePhase, reason: NoopReason) -> GestureTransition {
        self.record(pointer_id, phase, phase, GestureEffect::Noop { reason })
    }

    fn record(
        &mut self,
        pointer_id: u32,
        from: GesturePhase,
        to: GesturePhase,
        effect: GestureEffect,
    ) -> GestureTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        GestureTransition {
            transition_id: self.transition_counter,
            pointer_id,
            from,
            to,
            effect,
        }
    }
}

fn step<T>(
    gesture: &mut ActiveGesture,
    board: &mut Board<T>,
    position: Point,
    limits: &GestureLimits,
    hysteresis: f64,
) -> GestureEffect {
    gesture.current = position;
    if hysteresis > 0.0 && position.manhattan_distance(gesture.last_evaluated) < hysteresis {
        return GestureEffect::Noop {
            reason: NoopReason::BelowHysteresis,
        };
    }
    gesture.last_evaluated = position;

    let Some(lineage) = board.lineage(gesture.grid) else {
        return GestureEffect::Noop {
            reason: NoopReason::Detached,
        };
    };
    let expansion = lineage.expansion(limits.debug_couples);
    let (columns, rows) = (lineage.grid().columns, lineage.grid().rows);
    let candidate = gesture.candidate(columns, rows, expansion, limits);
    if candidate == gesture.preview {
        return GestureEffect::Noop {
            reason: NoopReason::Unchanged,
        };
    }

    let Some(grid) = board.grid_mut(gesture.grid) else {
        return GestureEffect::Noop {
            reason: NoopReason::Detached,
        };
    };
    let placement = can_place(grid, candidate, Some(gesture.block), expansion);
    if let Placement::Rejected(reject) = placement {
        return GestureEffect::Noop {
            reason: NoopReason::Rejected { reject },
        };
    }
    let Some(block) = grid.block_mut(gesture.block) else {
        return GestureEffect::Noop {
            reason: NoopReason::Detached,
        };
    };
    block.span = candidate;
    let before = (grid.columns, grid.rows);
    grid.apply_placement(&placement);
    let after = (grid.columns, grid.rows);

    let previous = gesture.preview;
    gesture.preview = candidate;
    GestureEffect::Updated {
        block: gesture.block,
        grid: gesture.grid,
        previous,
        preview: candidate,
        expanded: (after != before).then_some(after),
    }
}

/// Put the block back at its snapshot unless another gesture took those
/// cells meanwhile. Returns the block's resulting span.
fn restore_placement<T>(board: &mut Board<T>, gesture: &ActiveGesture) -> Option<CellSpan> {
    let grid = board.grid_mut(gesture.grid)?;
    let free = can_place(grid, gesture.snapshot, Some(gesture.block), Expansion::NONE).is_accepted();
    let block = grid.block_mut(gesture.block)?;
    if free {
        block.span = gesture.snapshot;
    }
    let span = block.span;
    restore_tracks(grid, gesture.snapshot_tracks);
    grid.selected_child = gesture.snapshot_selection;
    Some(span)
}

/// Shrink a grid back to `tracks`, but never below what its blocks need.
pub(crate) fn restore_tracks<T>(grid: &mut Grid<T>, (columns, rows): (u32, u32)) {
    let needed = |axis: Axis| {
        grid.blocks
            .iter()
            .map(|block| block.span.required_tracks(axis))
            .max()
            .unwrap_or(0)
    };
    let needed_columns = needed(Axis::Column);
    let needed_rows = needed(Axis::Row);
    grid.columns = columns.max(needed_columns);
    grid.rows = rows.max(needed_rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use griddrag_layout::Block;

    fn board() -> (Board<()>, BlockId) {
        let mut board = Board::new();
        let grid = board
            .add_root(Grid::new(4, 4).with_area(Rect::new(0.0, 0.0, 400.0, 400.0)))
            .expect("root");
        let block = board
            .add_block(grid, Block::new(CellSpan::cell(1, 1), ()))
            .expect("block");
        (board, block)
    }

    fn limits() -> GestureLimits {
        GestureLimits::from(&EngineConfig::default())
    }

    fn start(board: &Board<()>, block: BlockId, pointer_id: u32) -> ActiveGesture {
        ActiveGesture::capture(
            board,
            &CapabilityDefaults::default(),
            GestureKind::Drag,
            pointer_id,
            block,
            Point::new(50.0, 50.0),
        )
        .expect("capturable")
        .0
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let (mut board, block) = board();
        let mut machine = GestureMachine::new(0.0);
        let started = machine.begin(start(&board, block, 1)).expect("begin");
        let moved = machine.update(&mut board, 1, Point::new(150.0, 50.0), &limits());
        let committed = machine.commit(1);
        assert_eq!(started.transition_id, 1);
        assert_eq!(moved.transition_id, 2);
        assert_eq!(committed.transition_id, 3);
        assert_eq!(committed.from, GesturePhase::Dragging);
        assert_eq!(committed.to, GesturePhase::Idle);
        assert!(machine.is_empty());
    }

    #[test]
    fn second_gesture_on_block_is_busy() {
        let (board, block) = board();
        let mut machine = GestureMachine::new(0.0);
        machine.begin(start(&board, block, 1)).expect("begin");
        assert_eq!(
            machine.begin(start(&board, block, 2)),
            Err(EngineError::Busy(block))
        );
        assert_eq!(
            machine.begin(start(&board, block, 1)),
            Err(EngineError::PointerInUse(1))
        );
    }

    #[test]
    fn hysteresis_suppresses_small_moves() {
        let (mut board, block) = board();
        let mut machine = GestureMachine::new(10.0);
        machine.begin(start(&board, block, 1)).expect("begin");
        let t = machine.update(&mut board, 1, Point::new(54.0, 53.0), &limits());
        assert_eq!(
            t.effect,
            GestureEffect::Noop {
                reason: NoopReason::BelowHysteresis
            }
        );
        let t = machine.update(&mut board, 1, Point::new(160.0, 50.0), &limits());
        assert!(matches!(t.effect, GestureEffect::Updated { .. }));
    }

    #[test]
    fn cancel_restores_tracks_and_span() {
        let mut board = Board::new();
        let grid = board
            .add_root(
                Grid::<()>::new(2, 2)
                    .expandable(true, false)
                    .with_area(Rect::new(0.0, 0.0, 200.0, 200.0)),
            )
            .expect("root");
        let block = board
            .add_block(grid, Block::new(CellSpan::cell(1, 1), ()))
            .expect("block");
        let before = board.grid(grid).cloned();
        let mut machine = GestureMachine::new(0.0);
        machine.begin(start(&board, block, 7)).expect("begin");
        let t = machine.update(&mut board, 7, Point::new(350.0, 50.0), &limits());
        assert!(matches!(
            t.effect,
            GestureEffect::Updated {
                expanded: Some((4, 2)),
                ..
            }
        ));
        machine.cancel(&mut board, 7, CancelReason::EscapeKey);
        assert_eq!(board.grid(grid).cloned(), before);
    }

    #[test]
    fn unknown_pointer_is_a_noop() {
        let (mut board, _) = board();
        let mut machine = GestureMachine::new(0.0);
        let t = machine.update(&mut board, 9, Point::new(0.0, 0.0), &limits());
        assert_eq!(
            t.effect,
            GestureEffect::Noop {
                reason: NoopReason::UnknownPointer
            }
        );
        assert_eq!(t.from, GesturePhase::Idle);
    }

    #[test]
    fn restore_tracks_keeps_needed_tracks() {
        let mut grid: Grid<()> = Grid::new(6, 3).with_block(Block::new(CellSpan::cell(5, 1), ()));
        restore_tracks(&mut grid, (4, 2));
        assert_eq!((grid.columns, grid.rows), (5, 2));
    }
}
