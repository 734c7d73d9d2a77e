#![forbid(unsafe_code)]

//! The engine: one board, its gestures and its transfers behind a single
//! event entry point.
//!
//! Hosts translate platform input into [`InputEvent`]s and feed them to
//! [`GridEngine::dispatch`], which returns the notifications produced by the
//! event. Everything runs synchronously on the caller's thread except
//! `before_drop` hooks, whose futures are driven by
//! [`GridEngine::poll_transfers`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut engine = GridEngine::new(board, EngineConfig::default())?;
//! for event in engine.dispatch(InputEvent::Pointer(PointerEvent::down(
//!     1,
//!     Point::new(50.0, 50.0),
//!     PointerTarget::Block { block, handle: None },
//! ))) {
//!     render(event);
//! }
//! ```

use std::task::Context;

use griddrag_core::{
    BlockId, CancelReason, GridId, InputEvent, KeyCode, PointerButton, PointerEvent, PointerPhase,
    PointerTarget, Rect,
};
use griddrag_layout::{Block, Board, EffectiveConfig};
use tracing::{debug, debug_span, trace};

use crate::config::{ConfigError, EngineConfig};
use crate::error::EngineError;
use crate::gesture::{ActiveGesture, GestureEffect, GestureKind, GestureLimits, GestureMachine};
use crate::notify::{DragProgress, EngineEvent, ResizeProgress};
use crate::transfer::{HookFuture, TransferCoordinator, TransferRequest};
use crate::{drag, resize};

/// Drag, resize and transfer engine over one [`Board`].
#[derive(Debug)]
pub struct GridEngine<T> {
    board: Board<T>,
    config: EngineConfig,
    limits: GestureLimits,
    gestures: GestureMachine,
    transfers: TransferCoordinator<T>,
    outbox: Vec<EngineEvent>,
}

impl<T: Clone + 'static> GridEngine<T> {
    /// Engine over `board` with a validated `config`.
    pub fn new(board: Board<T>, config: EngineConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        Ok(Self::with_config(board, config))
    }

    /// Engine over `board` with the default configuration.
    #[must_use]
    pub fn from_board(board: Board<T>) -> Self {
        Self::with_config(board, EngineConfig::default())
    }

    fn with_config(board: Board<T>, config: EngineConfig) -> Self {
        Self {
            board,
            limits: GestureLimits::from(&config),
            gestures: GestureMachine::new(config.update_hysteresis_px),
            transfers: TransferCoordinator::new(),
            outbox: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board<T> {
        &self.board
    }

    /// Mutable access to the board, refused while any gesture or transfer
    /// is in flight.
    pub fn board_mut(&mut self) -> Result<&mut Board<T>, EngineError> {
        if let Some(gesture) = self.gestures.active().first() {
            return Err(EngineError::Busy(gesture.block));
        }
        if let Some(request) = self.transfers.requests().first() {
            return Err(EngineError::Busy(request.block));
        }
        Ok(&mut self.board)
    }

    /// Give the board back, dropping every gesture and pending hook.
    #[must_use]
    pub fn into_board(self) -> Board<T> {
        self.board
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register the `before_drop` hook of `grid`.
    pub fn set_before_drop<F>(&mut self, grid: GridId, hook: F) -> Result<(), EngineError>
    where
        F: Fn(Block<T>) -> HookFuture<T> + 'static,
    {
        if self.board.grid(grid).is_none() {
            return Err(EngineError::UnknownGrid(grid));
        }
        self.transfers.set_hook(grid, Box::new(hook));
        Ok(())
    }

    /// Remove the `before_drop` hook of `grid`. Returns whether one existed.
    pub fn clear_before_drop(&mut self, grid: GridId) -> bool {
        self.transfers.clear_hook(grid)
    }

    /// Feed one input event and collect the notifications it produced.
    pub fn dispatch(&mut self, event: InputEvent) -> Vec<EngineEvent> {
        match event {
            InputEvent::Pointer(pointer) => self.on_pointer(pointer),
            InputEvent::Key(key) => {
                if key.code == KeyCode::Escape && self.config.cancel_on_escape {
                    self.cancel_all(CancelReason::EscapeKey);
                }
            }
            InputEvent::Blur => self.cancel_all(CancelReason::FocusLost),
        }
        self.drain_events()
    }

    /// Notifications produced by calls that do not return them directly.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Cancel the gesture driven by `pointer_id`.
    pub fn cancel(&mut self, pointer_id: u32) -> Vec<EngineEvent> {
        self.cancel_pointer(pointer_id, CancelReason::Programmatic);
        self.drain_events()
    }

    /// Cancel every active gesture.
    pub fn cancel_gestures(&mut self) -> Vec<EngineEvent> {
        self.cancel_all(CancelReason::Programmatic);
        self.drain_events()
    }

    /// Remove a block whose effective `removable` is set.
    pub fn remove_block(&mut self, block: BlockId) -> Result<Block<T>, EngineError> {
        if self.is_busy(block) {
            return Err(EngineError::Busy(block));
        }
        if !self.effective(block)?.removable {
            return Err(EngineError::NotRemovable(block));
        }
        let (grid, removed) = self
            .board
            .take_block(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        debug!(target: "griddrag.engine", block = %block, grid = %grid, "block removed");
        self.outbox.push(EngineEvent::Removed { block, grid });
        Ok(removed)
    }

    /// Set the selected block of `grid`; `None` clears the selection.
    pub fn select(&mut self, grid: GridId, block: Option<BlockId>) -> Result<(), EngineError> {
        let record = self.board.grid(grid).ok_or(EngineError::UnknownGrid(grid))?;
        if let Some(block) = block {
            if record.block(block).is_none() {
                return Err(EngineError::UnknownBlock(block));
            }
        }
        self.set_selection(grid, block)?;
        Ok(())
    }

    /// Drive pending `before_drop` hooks and finalize released transfers.
    pub fn poll_transfers(&mut self, cx: &mut Context<'_>) -> Vec<EngineEvent> {
        self.transfers
            .poll(&mut self.board, &self.config, cx, &mut self.outbox);
        self.drain_events()
    }

    /// [`Self::poll_transfers`] with a waker that does nothing, for hosts
    /// that poll on their own schedule.
    pub fn poll_transfers_now(&mut self) -> Vec<EngineEvent> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        self.poll_transfers(&mut cx)
    }

    /// Drop the block's transfer request and its hook future.
    pub fn abandon_transfer(&mut self, block: BlockId) -> Result<Vec<EngineEvent>, EngineError> {
        if !self
            .transfers
            .abandon(&mut self.board, &self.config, block, &mut self.outbox)
        {
            return Err(EngineError::NoPendingTransfer(block));
        }
        Ok(self.drain_events())
    }

    /// Whether a gesture or a transfer owns the block.
    #[must_use]
    pub fn is_busy(&self, block: BlockId) -> bool {
        self.gestures.is_block_busy(block) || self.transfers.is_pending(block)
    }

    /// Effective capabilities of a block.
    pub fn effective(&self, block: BlockId) -> Result<EffectiveConfig, EngineError> {
        self.board
            .effective_block(&self.config.defaults, block)
            .ok_or(EngineError::UnknownBlock(block))
    }

    /// Pixel rect of a block in its grid's current geometry.
    #[must_use]
    pub fn block_rect(&self, block: BlockId) -> Option<Rect> {
        let grid = self.board.owner_of(block)?;
        let layout = self.board.track_layout(grid)?;
        self.board
            .block(block)
            .map(|record| layout.cell_to_pixel(record.span))
    }

    /// In-flight gestures ordered by pointer id.
    #[must_use]
    pub fn active_gestures(&self) -> Vec<&ActiveGesture> {
        self.gestures.active()
    }

    /// Open transfer requests ordered by block id.
    #[must_use]
    pub fn pending_transfers(&self) -> Vec<&TransferRequest> {
        self.transfers.requests()
    }

    /// Gesture transitions recorded so far.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.gestures.transition_count()
    }

    fn on_pointer(&mut self, pointer: PointerEvent) {
        let block = pointer.target.block().or_else(|| {
            self.gestures
                .get(pointer.pointer_id)
                .map(|gesture| gesture.block)
        });
        let span = debug_span!(
            "griddrag.gesture",
            pointer_id = pointer.pointer_id,
            block = ?block,
            phase = ?pointer.phase
        );
        let _guard = span.enter();
        match pointer.phase {
            PointerPhase::Down => self.pointer_down(&pointer),
            PointerPhase::Move => self.pointer_move(&pointer),
            PointerPhase::Up => self.pointer_up(&pointer),
            PointerPhase::Cancel(reason) => self.cancel_pointer(pointer.pointer_id, reason),
        }
    }

    fn pointer_down(&mut self, pointer: &PointerEvent) {
        let Some(block) = pointer.target.block() else {
            return;
        };
        if let Err(error) = self.begin(pointer, block) {
            debug!(
                target: "griddrag.engine",
                pointer_id = pointer.pointer_id,
                block = %block,
                error = %error,
                "pointer-down ignored"
            );
            self.outbox.push(EngineEvent::Ignored {
                pointer_id: pointer.pointer_id,
                error,
            });
        }
    }

    fn begin(&mut self, pointer: &PointerEvent, block: BlockId) -> Result<(), EngineError> {
        if self.is_busy(block) {
            return Err(EngineError::Busy(block));
        }
        if self.gestures.get(pointer.pointer_id).is_some() {
            return Err(EngineError::PointerInUse(pointer.pointer_id));
        }
        let grid = self
            .board
            .owner_of(block)
            .ok_or(EngineError::UnknownBlock(block))?;
        let previous = self.set_selection(grid, Some(block))?;
        if pointer.button != PointerButton::Primary {
            return Ok(());
        }

        let defaults = &self.config.defaults;
        let mut gesture = match &pointer.target {
            PointerTarget::Block { handle, .. } => drag::begin(
                &self.board,
                defaults,
                pointer.pointer_id,
                block,
                handle.as_deref(),
                pointer.position,
            )?,
            PointerTarget::ResizeHandle { direction, .. } => resize::begin(
                &self.board,
                defaults,
                pointer.pointer_id,
                block,
                *direction,
                pointer.position,
            )?,
            PointerTarget::Surface => return Ok(()),
        };
        gesture.restore_selection_to(previous);
        let transition = self.gestures.begin(gesture)?;
        match gesture.kind {
            GestureKind::Drag => debug!(
                target: "griddrag.drag",
                transition_id = transition.transition_id,
                block = %block,
                grid = %grid,
                span = ?gesture.snapshot,
                "drag started"
            ),
            GestureKind::Resize { direction } => debug!(
                target: "griddrag.resize",
                transition_id = transition.transition_id,
                block = %block,
                grid = %grid,
                direction = %direction,
                "resize started"
            ),
        }
        self.outbox.push(progress(pointer, &gesture));
        Ok(())
    }

    fn pointer_move(&mut self, pointer: &PointerEvent) {
        let pointer_id = pointer.pointer_id;
        let Some(mut probe) = self.gestures.get(pointer_id).copied() else {
            return;
        };
        probe.current = pointer.position;
        if probe.kind == GestureKind::Drag
            && probe.droppable_out
            && self
                .transfers
                .track(&mut self.board, &self.config, &probe, &mut self.outbox)
        {
            let moved = self
                .gestures
                .get(pointer_id)
                .is_some_and(|gesture| gesture.current != pointer.position);
            self.gestures.hold(pointer_id, pointer.position);
            // The source preview is held, but the ghost keeps following the pointer.
            if moved {
                if let Some(gesture) = self.gestures.get(pointer_id) {
                    self.outbox.push(progress(pointer, gesture));
                }
            }
            return;
        }

        let transition = self
            .gestures
            .update(&mut self.board, pointer_id, pointer.position, &self.limits);
        trace!(
            target: "griddrag.engine",
            transition_id = transition.transition_id,
            effect = ?transition.effect,
            "gesture updated"
        );
        if let GestureEffect::Updated {
            grid,
            expanded,
            preview,
            ..
        } = transition.effect
        {
            if let Some((columns, rows)) = expanded {
                debug!(
                    target: "griddrag.engine",
                    grid = %grid,
                    columns,
                    rows,
                    "grid expanded"
                );
                self.outbox.push(EngineEvent::GridExpanded {
                    grid,
                    columns,
                    rows,
                });
            }
            if let Some(gesture) = self.gestures.get(pointer_id) {
                trace!(target: "griddrag.engine", span = ?preview, "preview accepted");
                self.outbox.push(progress(pointer, gesture));
            }
        }
    }

    fn pointer_up(&mut self, pointer: &PointerEvent) {
        let pointer_id = pointer.pointer_id;
        if self.gestures.get(pointer_id).is_none() {
            return;
        }
        self.pointer_move(pointer);
        let Some(gesture) = self.gestures.get(pointer_id).copied() else {
            return;
        };

        if self.transfers.is_hovering(gesture.block) {
            if let Some((_, transition)) = self.gestures.hand_off(pointer_id) {
                debug!(
                    target: "griddrag.drag",
                    transition_id = transition.transition_id,
                    block = %gesture.block,
                    "drag handed off to transfer"
                );
            }
            self.transfers
                .release(&mut self.board, &self.config, gesture.block, &mut self.outbox);
            return;
        }

        let transition = self.gestures.commit(pointer_id);
        let GestureEffect::Committed {
            block,
            grid,
            span,
            duration_us,
        } = transition.effect
        else {
            return;
        };
        match gesture.kind {
            GestureKind::Drag => debug!(
                target: "griddrag.drag",
                transition_id = transition.transition_id,
                block = %block,
                span = ?span,
                duration_us,
                "drag committed"
            ),
            GestureKind::Resize { .. } => debug!(
                target: "griddrag.resize",
                transition_id = transition.transition_id,
                block = %block,
                span = ?span,
                duration_us,
                "resize committed"
            ),
        }
        self.outbox.push(EngineEvent::Committed {
            block,
            grid,
            span,
            kind: gesture.kind,
        });
    }

    fn cancel_pointer(&mut self, pointer_id: u32, reason: CancelReason) {
        let Some(gesture) = self.gestures.get(pointer_id).copied() else {
            return;
        };
        if self.transfers.is_hovering(gesture.block) {
            self.transfers
                .abandon(&mut self.board, &self.config, gesture.block, &mut self.outbox);
        }
        let transition = self.gestures.cancel(&mut self.board, pointer_id, reason);
        if let GestureEffect::Cancelled {
            block,
            grid,
            restored,
            reason,
        } = transition.effect
        {
            debug!(
                target: "griddrag.engine",
                transition_id = transition.transition_id,
                block = %block,
                reason = %reason,
                "gesture cancelled"
            );
            self.outbox.push(EngineEvent::Cancelled {
                block,
                grid,
                span: restored,
                reason,
            });
        }
    }

    fn cancel_all(&mut self, reason: CancelReason) {
        let pointers: Vec<u32> = self
            .gestures
            .active()
            .iter()
            .map(|gesture| gesture.pointer_id)
            .collect();
        for pointer_id in pointers {
            self.cancel_pointer(pointer_id, reason);
        }
    }

    /// Returns the previous selection.
    fn set_selection(
        &mut self,
        grid: GridId,
        block: Option<BlockId>,
    ) -> Result<Option<BlockId>, EngineError> {
        let record = self
            .board
            .grid_mut(grid)
            .ok_or(EngineError::UnknownGrid(grid))?;
        let previous = record.selected_child;
        if previous != block {
            record.selected_child = block;
            self.outbox.push(EngineEvent::Selected { grid, block });
        }
        Ok(previous)
    }
}

fn progress(pointer: &PointerEvent, gesture: &ActiveGesture) -> EngineEvent {
    let rect = gesture.ghost_rect();
    match gesture.kind {
        GestureKind::Drag => EngineEvent::DragProgress(DragProgress {
            pointer: pointer.clone(),
            block: gesture.block,
            grid: gesture.grid,
            rect,
            span: gesture.preview,
        }),
        GestureKind::Resize { direction } => EngineEvent::ResizeProgress(ResizeProgress {
            pointer: pointer.clone(),
            block: gesture.block,
            grid: gesture.grid,
            rect,
            span: gesture.preview,
            cursor: direction.cursor(),
            direction,
        }),
    }
}
