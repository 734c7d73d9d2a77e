use std::fmt;

use griddrag_core::{BlockId, GridId, IdError};

use crate::collision::RejectReason;
use crate::span::SpanError;

/// Errors raised while building or validating a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Identifier allocation failed.
    Id(IdError),
    /// A root grid was added without a pixel area.
    MissingArea { grid: GridId },
    UnknownGrid(GridId),
    UnknownBlock(BlockId),
    DuplicateGrid(GridId),
    DuplicateBlock(BlockId),
    InvalidSpan { block: BlockId, source: SpanError },
    /// Two siblings overlap.
    Overlap {
        grid: GridId,
        first: BlockId,
        second: BlockId,
    },
    /// A block lies outside its grid's tracks.
    OutOfBounds { grid: GridId, block: BlockId },
    /// A block cannot be moved into a grid nested inside itself.
    CyclicMove { block: BlockId, grid: GridId },
    /// A programmatic placement was refused.
    Rejected { grid: GridId, reason: RejectReason },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(err) => write!(f, "id allocation failed: {err}"),
            Self::MissingArea { grid } => write!(f, "root {grid} has no area"),
            Self::UnknownGrid(grid) => write!(f, "unknown {grid}"),
            Self::UnknownBlock(block) => write!(f, "unknown {block}"),
            Self::DuplicateGrid(grid) => write!(f, "{grid} appears twice"),
            Self::DuplicateBlock(block) => write!(f, "{block} appears twice"),
            Self::InvalidSpan { block, source } => write!(f, "{block}: {source}"),
            Self::Overlap {
                grid,
                first,
                second,
            } => write!(f, "{first} overlaps {second} in {grid}"),
            Self::OutOfBounds { grid, block } => write!(f, "{block} lies outside {grid}"),
            Self::CyclicMove { block, grid } => {
                write!(f, "{block} cannot move into {grid} nested inside it")
            }
            Self::Rejected { grid, reason } => write!(f, "{grid} rejected placement: {reason}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Id(err) => Some(err),
            Self::InvalidSpan { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<IdError> for LayoutError {
    fn from(err: IdError) -> Self {
        Self::Id(err)
    }
}
