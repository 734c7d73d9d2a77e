//! Notifications the engine hands back to the host.

use griddrag_core::{BlockId, CancelReason, GridId, PointerEvent, Rect, ResizeDirection};
use griddrag_layout::{CellSpan, RejectReason};

use crate::error::{EngineError, HookError};
use crate::gesture::GestureKind;

/// Drag preview update: the ghost rect follows the pointer, `span` is the
/// last accepted cell placement.
#[derive(Debug, Clone, PartialEq)]
pub struct DragProgress {
    pub pointer: PointerEvent,
    pub block: BlockId,
    pub grid: GridId,
    pub rect: Rect,
    pub span: CellSpan,
}

/// Resize preview update.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeProgress {
    pub pointer: PointerEvent,
    pub block: BlockId,
    pub grid: GridId,
    pub rect: Rect,
    pub span: CellSpan,
    /// CSS cursor for the active handle, e.g. `"ne-resize"`.
    pub cursor: &'static str,
    pub direction: ResizeDirection,
}

/// Why a transfer did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRejectReason {
    /// The destination refused the candidate span.
    Placement(RejectReason),
    /// The `before_drop` hook failed.
    Hook(HookError),
    /// The pointer left the destination, the gesture was cancelled, or the
    /// host abandoned the transfer.
    Abandoned,
    /// The destination grid disappeared before the transfer finished.
    DestinationGone,
}

/// One host notification.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    DragProgress(DragProgress),
    ResizeProgress(ResizeProgress),
    /// A drag or resize ended with `span` as the block's new placement.
    Committed {
        block: BlockId,
        grid: GridId,
        span: CellSpan,
        kind: GestureKind,
    },
    /// A gesture was cancelled; the block is back at `span`.
    Cancelled {
        block: BlockId,
        grid: GridId,
        span: CellSpan,
        reason: CancelReason,
    },
    /// A drag entered a droppable grid; `dropping_child` is set there.
    TransferPending {
        block: BlockId,
        from: GridId,
        to: GridId,
        span: CellSpan,
    },
    TransferAccepted {
        block: BlockId,
        from: GridId,
        to: GridId,
        span: CellSpan,
    },
    TransferRejected {
        block: BlockId,
        from: GridId,
        to: GridId,
        reason: TransferRejectReason,
    },
    HookFailed {
        block: BlockId,
        grid: GridId,
        error: HookError,
    },
    Removed { block: BlockId, grid: GridId },
    Selected { grid: GridId, block: Option<BlockId> },
    /// A grid grew to accept a placement.
    GridExpanded {
        grid: GridId,
        columns: u32,
        rows: u32,
    },
    /// A pointer-down did not start a gesture.
    Ignored { pointer_id: u32, error: EngineError },
}

impl EngineEvent {
    /// Block the notification is about, if any.
    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Self::DragProgress(progress) => Some(progress.block),
            Self::ResizeProgress(progress) => Some(progress.block),
            Self::Committed { block, .. }
            | Self::Cancelled { block, .. }
            | Self::TransferPending { block, .. }
            | Self::TransferAccepted { block, .. }
            | Self::TransferRejected { block, .. }
            | Self::HookFailed { block, .. }
            | Self::Removed { block, .. } => Some(*block),
            Self::Selected { block, .. } => *block,
            Self::GridExpanded { .. } | Self::Ignored { .. } => None,
        }
    }

    /// Short snake_case name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DragProgress(_) => "drag_progress",
            Self::ResizeProgress(_) => "resize_progress",
            Self::Committed { .. } => "committed",
            Self::Cancelled { .. } => "cancelled",
            Self::TransferPending { .. } => "transfer_pending",
            Self::TransferAccepted { .. } => "transfer_accepted",
            Self::TransferRejected { .. } => "transfer_rejected",
            Self::HookFailed { .. } => "hook_failed",
            Self::Removed { .. } => "removed",
            Self::Selected { .. } => "selected",
            Self::GridExpanded { .. } => "grid_expanded",
            Self::Ignored { .. } => "ignored",
        }
    }
}
