#![forbid(unsafe_code)]

//! griddrag public facade crate.
//!
//! Re-exports the model and solvers from `griddrag-layout`, the input model
//! from `griddrag-core` and, with the `runtime` feature (on by default), the
//! gesture engine from `griddrag-runtime`.
//!
//! ```rust,ignore
//! use griddrag::prelude::*;
//!
//! let mut board = Board::new();
//! let grid = board.add_root(Grid::new(4, 4).with_area(Rect::new(0.0, 0.0, 400.0, 400.0)))?;
//! let block = board.add_block(grid, Block::new(CellSpan::cell(1, 1), "note"))?;
//! let mut engine = GridEngine::from_board(board);
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use griddrag_core::{
    BlockId, CancelReason, GridId, IdAllocator, IdError, InputEvent, KeyCode, KeyEvent, Modifiers,
    Point, PointerButton, PointerEvent, PointerPhase, PointerTarget, Rect, ResizeDirection,
};

// --- Layout re-exports -----------------------------------------------------

pub use griddrag_layout::{
    Axis, Block, Board, CapabilityDefaults, CascadeOptions, CellSpan, EffectiveConfig, Expansion,
    Grid, LayoutError, Overflow, Placement, RejectReason, TrackLayout, can_place,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use griddrag_runtime::{
    ConfigError, DragProgress, EngineConfig, EngineError, EngineEvent, GestureKind, GridEngine,
    HookError, HookFuture, ResizeProgress, TransferRejectReason, TransferRequest,
};

// --- Errors ---------------------------------------------------------------

/// Any error a griddrag call can return.
#[derive(Debug)]
pub enum Error {
    /// Board construction or validation failed.
    Layout(LayoutError),
    #[cfg(feature = "runtime")]
    /// Engine configuration could not be loaded or is invalid.
    Config(ConfigError),
    #[cfg(feature = "runtime")]
    /// An engine call was refused.
    Engine(EngineError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "runtime")]
impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Standard result type for griddrag APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a host usually needs.
pub mod prelude {
    pub use crate::{
        Block, BlockId, Board, CascadeOptions, CellSpan, Error, Grid, GridId, InputEvent, Point,
        PointerEvent, PointerTarget, Rect, ResizeDirection, Result,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{EngineConfig, EngineEvent, GridEngine};

    pub use crate::{core, layout};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use griddrag_core as core;
pub use griddrag_layout as layout;
#[cfg(feature = "runtime")]
pub use griddrag_runtime as runtime;
