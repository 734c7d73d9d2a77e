use std::fmt;

use griddrag_core::{BlockId, GridId};
use griddrag_layout::LayoutError;
use serde::{Deserialize, Serialize};

/// Errors returned from explicit engine calls. Pointer-down requests that
/// fail one of these checks are reported as
/// [`crate::EngineEvent::Ignored`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    UnknownGrid(GridId),
    UnknownBlock(BlockId),
    /// The block already has a gesture or a pending transfer.
    Busy(BlockId),
    /// The pointer already drives a gesture.
    PointerInUse(u32),
    NotDraggable(BlockId),
    NotResizable(BlockId),
    NotRemovable(BlockId),
    /// The pressed element does not match the block's drag handle selector.
    HandleMismatch {
        block: BlockId,
        expected: String,
    },
    /// The block's grid has no tracks.
    DegenerateGrid(GridId),
    /// The grid's pixel area cannot be derived.
    MissingArea(GridId),
    NoPendingTransfer(BlockId),
    Layout(LayoutError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGrid(grid) => write!(f, "unknown {grid}"),
            Self::UnknownBlock(block) => write!(f, "unknown {block}"),
            Self::Busy(block) => write!(f, "{block} is busy with another gesture"),
            Self::PointerInUse(pointer) => write!(f, "pointer {pointer} already drives a gesture"),
            Self::NotDraggable(block) => write!(f, "{block} is not draggable"),
            Self::NotResizable(block) => write!(f, "{block} is not resizable"),
            Self::NotRemovable(block) => write!(f, "{block} is not removable"),
            Self::HandleMismatch { block, expected } => {
                write!(f, "{block} drags only from {expected:?}")
            }
            Self::DegenerateGrid(grid) => write!(f, "{grid} has no tracks"),
            Self::MissingArea(grid) => write!(f, "{grid} has no pixel area"),
            Self::NoPendingTransfer(block) => write!(f, "{block} has no pending transfer"),
            Self::Layout(err) => write!(f, "layout error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Layout(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<LayoutError> for EngineError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

/// Failure reported by a `before_drop` hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "before_drop hook failed: {}", self.message)
    }
}

impl std::error::Error for HookError {}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
