//! Cross-grid transfer coordinator.
//!
//! While a `droppable_out` block is dragged over another grid (an outer one,
//! or one nested inside a sibling block), the coordinator hit-tests the
//! deepest `droppable_in` grid under the pointer and opens a [`TransferRequest`] against it: the destination's
//! `dropping_child` is set and its `before_drop` hook (if any) starts
//! working on a snapshot of the block. The request follows the pointer
//! until the drag ends over it (release) or leaves it (abandon).
//!
//! A released request is finalized as soon as its hook has resolved: the
//! block is re-parented into the destination under its own id, carrying its
//! nested grid along, or it is put back in the source grid. Hooks that are
//! still pending at release are driven by [`TransferCoordinator::poll`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use griddrag_core::{BlockId, GridId, Rect};
use griddrag_layout::{Axis, Block, Board, CellSpan, Expansion, Placement, can_place};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::drag;
use crate::error::HookError;
use crate::gesture::{ActiveGesture, restore_tracks};
use crate::notify::{EngineEvent, TransferRejectReason};

/// Future returned by a `before_drop` hook.
pub type HookFuture<T> = LocalBoxFuture<'static, Result<Block<T>, HookError>>;

/// Hook run on a snapshot of a block about to be dropped into a grid. It may
/// rewrite the block's data and options, or fail to veto the drop.
pub type BeforeDrop<T> = Box<dyn Fn(Block<T>) -> HookFuture<T>>;

/// One block on its way from one grid to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferRequest {
    pub block: BlockId,
    pub pointer_id: u32,
    pub from: GridId,
    pub to: GridId,
    /// Candidate placement in the destination.
    pub span: CellSpan,
    /// The drag ended over the destination.
    pub released: bool,
    restore_span: CellSpan,
    restore_tracks: (u32, u32),
}

enum HookState<T> {
    Ready(Result<Block<T>, HookError>),
    Pending(HookFuture<T>),
}

struct PendingTransfer<T> {
    request: TransferRequest,
    hook: HookState<T>,
}

/// Open transfers and the per-grid `before_drop` hooks.
pub struct TransferCoordinator<T> {
    hooks: FxHashMap<GridId, BeforeDrop<T>>,
    pending: FxHashMap<BlockId, PendingTransfer<T>>,
}

impl<T> Default for TransferCoordinator<T> {
    fn default() -> Self {
        Self {
            hooks: FxHashMap::default(),
            pending: FxHashMap::default(),
        }
    }
}

impl<T> fmt::Debug for TransferCoordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooks: Vec<_> = self.hooks.keys().copied().collect();
        hooks.sort();
        f.debug_struct("TransferCoordinator")
            .field("hooks", &hooks)
            .field("pending", &self.requests())
            .finish()
    }
}

impl<T> TransferCoordinator<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `before_drop` hook of `grid`, replacing any previous one.
    pub fn set_hook(&mut self, grid: GridId, hook: BeforeDrop<T>) {
        self.hooks.insert(grid, hook);
    }

    /// Remove the hook of `grid`. Returns whether one was registered.
    pub fn clear_hook(&mut self, grid: GridId) -> bool {
        self.hooks.remove(&grid).is_some()
    }

    #[must_use]
    pub fn has_hook(&self, grid: GridId) -> bool {
        self.hooks.contains_key(&grid)
    }

    #[must_use]
    pub fn request(&self, block: BlockId) -> Option<&TransferRequest> {
        self.pending.get(&block).map(|pending| &pending.request)
    }

    /// Open requests ordered by block id.
    #[must_use]
    pub fn requests(&self) -> Vec<&TransferRequest> {
        let mut requests: Vec<_> = self.pending.values().map(|p| &p.request).collect();
        requests.sort_by_key(|request| request.block);
        requests
    }

    #[must_use]
    pub fn is_pending(&self, block: BlockId) -> bool {
        self.pending.contains_key(&block)
    }

    /// Whether the block's drag still hovers an open request.
    #[must_use]
    pub fn is_hovering(&self, block: BlockId) -> bool {
        self.request(block).is_some_and(|request| !request.released)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Clone + 'static> TransferCoordinator<T> {
    /// Follow a drag at its current pointer position, opening, updating or
    /// abandoning its request. Returns whether the drag now hovers a
    /// destination, in which case the source preview should be held.
    pub fn track(
        &mut self,
        board: &mut Board<T>,
        config: &EngineConfig,
        gesture: &ActiveGesture,
        out: &mut Vec<EngineEvent>,
    ) -> bool {
        let target = if gesture.droppable_out {
            find_destination(board, config, gesture)
        } else {
            None
        };
        let current = self
            .pending
            .get(&gesture.block)
            .filter(|pending| !pending.request.released)
            .map(|pending| pending.request.to);

        match (current, target) {
            (Some(to), Some((destination, span))) if to == destination => {
                self.retarget(board, gesture.block, span, out);
                true
            }
            (Some(_), target) => {
                self.abandon(board, config, gesture.block, out);
                target.is_some_and(|(destination, span)| {
                    self.open(board, gesture, destination, span, out)
                })
            }
            (None, Some((destination, span))) => self.open(board, gesture, destination, span, out),
            (None, None) => false,
        }
    }

    /// Mark the block's request as released and finalize it if its hook has
    /// resolved. Returns whether a request existed.
    pub fn release(
        &mut self,
        board: &mut Board<T>,
        config: &EngineConfig,
        block: BlockId,
        out: &mut Vec<EngineEvent>,
    ) -> bool {
        let Some(pending) = self.pending.get_mut(&block) else {
            return false;
        };
        pending.request.released = true;
        debug!(
            target: "griddrag.transfer",
            block = %block,
            to = %pending.request.to,
            ready = matches!(pending.hook, HookState::Ready(_)),
            "transfer released"
        );
        if matches!(pending.hook, HookState::Ready(_)) {
            if let Some(pending) = self.pending.remove(&block) {
                finalize(board, config, pending, out);
            }
        }
        true
    }

    /// Drive pending hooks and finalize every released request whose hook
    /// has resolved, in block-id order.
    pub fn poll(
        &mut self,
        board: &mut Board<T>,
        config: &EngineConfig,
        cx: &mut Context<'_>,
        out: &mut Vec<EngineEvent>,
    ) {
        let mut blocks: Vec<BlockId> = self.pending.keys().copied().collect();
        blocks.sort();
        for block in blocks {
            let Some(pending) = self.pending.get_mut(&block) else {
                continue;
            };
            if let HookState::Pending(future) = &mut pending.hook {
                if let Poll::Ready(result) = future.poll_unpin(cx) {
                    pending.hook = HookState::Ready(result);
                }
            }
            let finished = pending.request.released && matches!(pending.hook, HookState::Ready(_));
            if finished {
                if let Some(pending) = self.pending.remove(&block) {
                    finalize(board, config, pending, out);
                }
            }
        }
    }

    /// Drop the block's request and its hook future.
    ///
    /// A request still hovered by its drag only clears `dropping_child`; the
    /// drag continues in the source grid. A released request is rejected and
    /// the block put back. Returns whether a request existed.
    pub fn abandon(
        &mut self,
        board: &mut Board<T>,
        config: &EngineConfig,
        block: BlockId,
        out: &mut Vec<EngineEvent>,
    ) -> bool {
        let Some(PendingTransfer { request, .. }) = self.pending.remove(&block) else {
            return false;
        };
        clear_dropping(board, request.to, request.block);
        if request.released {
            reject(board, config, &request, TransferRejectReason::Abandoned, out);
        } else {
            debug!(
                target: "griddrag.transfer",
                block = %block,
                to = %request.to,
                "transfer abandoned"
            );
            out.push(EngineEvent::TransferRejected {
                block,
                from: request.from,
                to: request.to,
                reason: TransferRejectReason::Abandoned,
            });
        }
        true
    }

    fn open(
        &mut self,
        board: &mut Board<T>,
        gesture: &ActiveGesture,
        destination: GridId,
        span: CellSpan,
        out: &mut Vec<EngineEvent>,
    ) -> bool {
        let Some(record) = board.block(gesture.block) else {
            return false;
        };
        let snapshot = Block {
            id: record.id,
            span,
            options: record.options.clone(),
            data: record.data.clone(),
            child: None,
        };
        let Some(grid) = board.grid_mut(destination) else {
            return false;
        };
        grid.dropping_child = Some(Box::new(snapshot.clone()));

        let hook = match self.hooks.get(&destination) {
            Some(hook) => invoke(hook, snapshot),
            None => HookState::Ready(Ok(snapshot)),
        };
        let request = TransferRequest {
            block: gesture.block,
            pointer_id: gesture.pointer_id,
            from: gesture.grid,
            to: destination,
            span,
            released: false,
            restore_span: gesture.snapshot,
            restore_tracks: gesture.snapshot_tracks(),
        };
        debug!(
            target: "griddrag.transfer",
            block = %request.block,
            from = %request.from,
            to = %request.to,
            hooked = self.hooks.contains_key(&destination),
            "transfer opened"
        );
        self.pending.insert(gesture.block, PendingTransfer { request, hook });
        out.push(EngineEvent::TransferPending {
            block: request.block,
            from: request.from,
            to: request.to,
            span,
        });
        true
    }

    fn retarget(
        &mut self,
        board: &mut Board<T>,
        block: BlockId,
        span: CellSpan,
        out: &mut Vec<EngineEvent>,
    ) {
        let Some(pending) = self.pending.get_mut(&block) else {
            return;
        };
        if pending.request.span == span {
            return;
        }
        pending.request.span = span;
        let request = pending.request;
        if let Some(dropping) = board
            .grid_mut(request.to)
            .and_then(|grid| grid.dropping_child.as_deref_mut())
            .filter(|dropping| dropping.id == block)
        {
            dropping.span = span;
        }
        out.push(EngineEvent::TransferPending {
            block,
            from: request.from,
            to: request.to,
            span,
        });
    }
}

/// Deepest droppable grid under the drag's pointer and the candidate span
/// there. Hits are walked from the deepest grid outwards, skipping the
/// dragged block's own subtree; reaching the source grid ends the search, so
/// grids nested inside the source stay reachable while its ancestors are only
/// considered once the pointer has left it.
fn find_destination<T>(
    board: &Board<T>,
    config: &EngineConfig,
    gesture: &ActiveGesture,
) -> Option<(GridId, CellSpan)> {
    let ghost = drag::ghost_rect(gesture);
    for grid in board.grids_at(gesture.current) {
        if grid == gesture.grid {
            return None;
        }
        if board.block_contains_grid(gesture.block, grid) {
            continue;
        }
        if let Some(candidate) = candidate_in(board, config, grid, ghost) {
            return Some((grid, candidate));
        }
    }
    None
}

/// Candidate span of the ghost in `grid`, if the grid accepts drops.
fn candidate_in<T>(
    board: &Board<T>,
    config: &EngineConfig,
    grid: GridId,
    ghost: Rect,
) -> Option<CellSpan> {
    let lineage = board.lineage(grid)?;
    if !lineage.effective_grid(&config.defaults).droppable_in {
        return None;
    }
    let layout = lineage.track_layout()?;
    if layout.is_degenerate() {
        return None;
    }
    let target = lineage.grid();
    let expansion = lineage.expansion(config.debug_disables_nested_expansion);
    let mut span = layout.pixel_to_cell(ghost, None);
    if !expansion.columns {
        span = span.clamp_axis(Axis::Column, target.columns);
    }
    if !expansion.rows {
        span = span.clamp_axis(Axis::Row, target.rows);
    }
    Some(span)
}

/// Call a hook, turning panics into hook failures, and poll it once.
fn invoke<T: 'static>(hook: &BeforeDrop<T>, block: Block<T>) -> HookState<T> {
    let future = match panic::catch_unwind(AssertUnwindSafe(|| hook(block))) {
        Ok(future) => AssertUnwindSafe(future)
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or_else(|_| Err(HookError::new("hook panicked"))))
            .boxed_local(),
        Err(_) => return HookState::Ready(Err(HookError::new("hook panicked"))),
    };
    poll_now(future)
}

fn poll_now<T>(mut future: HookFuture<T>) -> HookState<T> {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    match future.poll_unpin(&mut cx) {
        Poll::Ready(result) => HookState::Ready(result),
        Poll::Pending => HookState::Pending(future),
    }
}

fn finalize<T>(
    board: &mut Board<T>,
    config: &EngineConfig,
    pending: PendingTransfer<T>,
    out: &mut Vec<EngineEvent>,
) {
    let PendingTransfer { request, hook } = pending;
    clear_dropping(board, request.to, request.block);
    let HookState::Ready(result) = hook else {
        return;
    };
    match result {
        Ok(item) => accept(board, config, &request, item, out),
        Err(error) => {
            warn!(
                target: "griddrag.transfer",
                block = %request.block,
                to = %request.to,
                error = %error,
                "before_drop hook failed"
            );
            out.push(EngineEvent::HookFailed {
                block: request.block,
                grid: request.to,
                error: error.clone(),
            });
            reject(board, config, &request, TransferRejectReason::Hook(error), out);
        }
    }
}

fn accept<T>(
    board: &mut Board<T>,
    config: &EngineConfig,
    request: &TransferRequest,
    item: Block<T>,
    out: &mut Vec<EngineEvent>,
) {
    let Some(lineage) = board.lineage(request.to) else {
        return reject(board, config, request, TransferRejectReason::DestinationGone, out);
    };
    let expansion = lineage.expansion(config.debug_disables_nested_expansion);
    let placement = can_place(lineage.grid(), request.span, Some(request.block), expansion);
    if let Placement::Rejected(reason) = placement {
        return reject(board, config, request, TransferRejectReason::Placement(reason), out);
    }
    if board.block(request.block).is_none() || board.block_contains_grid(request.block, request.to)
    {
        return reject(board, config, request, TransferRejectReason::DestinationGone, out);
    }

    if let Some(grid) = board.grid_mut(request.to) {
        let before = (grid.columns, grid.rows);
        grid.apply_placement(&placement);
        if (grid.columns, grid.rows) != before {
            out.push(EngineEvent::GridExpanded {
                grid: request.to,
                columns: grid.columns,
                rows: grid.rows,
            });
        }
    }
    if let Err(err) = board.move_block(request.block, request.to, request.span) {
        warn!(target: "griddrag.transfer", block = %request.block, error = %err, "move failed");
        return reject(board, config, request, TransferRejectReason::DestinationGone, out);
    }
    if let Some(moved) = board.block_mut(request.block) {
        moved.data = item.data;
        moved.options = item.options;
    }
    if let Some(source) = board.grid_mut(request.from) {
        restore_tracks(source, request.restore_tracks);
    }
    debug!(
        target: "griddrag.transfer",
        block = %request.block,
        from = %request.from,
        to = %request.to,
        "transfer accepted"
    );
    out.push(EngineEvent::TransferAccepted {
        block: request.block,
        from: request.from,
        to: request.to,
        span: request.span,
    });
}

/// Leave the block in its source grid, back at its pre-gesture span when
/// configured and still free.
fn reject<T>(
    board: &mut Board<T>,
    config: &EngineConfig,
    request: &TransferRequest,
    reason: TransferRejectReason,
    out: &mut Vec<EngineEvent>,
) {
    if let Some(source) = board.grid_mut(request.from) {
        let free = can_place(source, request.restore_span, Some(request.block), Expansion::NONE)
            .is_accepted();
        if config.restore_on_transfer_reject && free {
            if let Some(block) = source.block_mut(request.block) {
                block.span = request.restore_span;
            }
        }
        restore_tracks(source, request.restore_tracks);
    }
    debug!(
        target: "griddrag.transfer",
        block = %request.block,
        to = %request.to,
        ?reason,
        "transfer rejected"
    );
    out.push(EngineEvent::TransferRejected {
        block: request.block,
        from: request.from,
        to: request.to,
        reason,
    });
}

/// Empty the grid's `dropping_child` slot if it still shows `block`; another
/// drag may have taken the slot over since.
fn clear_dropping<T>(board: &mut Board<T>, grid: GridId, block: BlockId) {
    if let Some(grid) = board.grid_mut(grid) {
        if grid.dropping_child.as_ref().is_some_and(|child| child.id == block) {
            grid.dropping_child = None;
        }
    }
}
