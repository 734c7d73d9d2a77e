//! Collision resolver.
//!
//! Decides whether a candidate span may be placed in a grid: it must be a
//! valid span, must not overlap any other block (half-open intervals, so
//! shared boundaries are fine), and must fit the grid or be coverable by
//! growing an expandable axis. There is no soft resolution: other blocks are
//! never pushed aside, an overlapping candidate is simply rejected.

use std::fmt;

use griddrag_core::BlockId;
use serde::{Deserialize, Serialize};

use crate::model::Grid;
use crate::span::{Axis, CellSpan};

/// Which axes of a grid may grow to accept a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Expansion {
    pub columns: bool,
    pub rows: bool,
}

impl Expansion {
    /// Neither axis may grow.
    pub const NONE: Self = Self {
        columns: false,
        rows: false,
    };

    #[must_use]
    pub const fn new(columns: bool, rows: bool) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub const fn allows(self, axis: Axis) -> bool {
        match axis {
            Axis::Column => self.columns,
            Axis::Row => self.rows,
        }
    }

    /// Intersection of two policies.
    #[must_use]
    pub const fn and(self, other: Expansion) -> Expansion {
        Expansion::new(self.columns && other.columns, self.rows && other.rows)
    }
}

/// Why a candidate span was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// `end ≤ start` or `start < 1` on some axis.
    InvalidSpan,
    /// The grid has no columns or no rows.
    DegenerateGrid,
    /// The candidate overlaps a sibling.
    Overlap { with: BlockId },
    /// The candidate leaves a non-expandable axis.
    OutOfBounds {
        axis: Axis,
        required: u32,
        available: u32,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpan => write!(f, "invalid span"),
            Self::DegenerateGrid => write!(f, "grid has no tracks"),
            Self::Overlap { with } => write!(f, "overlaps {with}"),
            Self::OutOfBounds {
                axis,
                required,
                available,
            } => write!(
                f,
                "needs {required} {axis} tracks but only {available} exist and the axis is fixed"
            ),
        }
    }
}

/// Outcome of [`can_place`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Placement {
    Accepted,
    /// Accepted once the grid grows to the given track counts.
    AcceptedWithExpansion {
        columns: Option<u32>,
        rows: Option<u32>,
    },
    Rejected(RejectReason),
}

impl Placement {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    #[must_use]
    pub const fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Test `candidate` against every block of `grid` except `excluding`.
#[must_use]
pub fn can_place<T>(
    grid: &Grid<T>,
    candidate: CellSpan,
    excluding: Option<BlockId>,
    expansion: Expansion,
) -> Placement {
    if !candidate.is_valid() {
        return Placement::Rejected(RejectReason::InvalidSpan);
    }
    if grid.is_degenerate() {
        return Placement::Rejected(RejectReason::DegenerateGrid);
    }
    if let Some(other) = first_overlap(grid, candidate, excluding) {
        return Placement::Rejected(RejectReason::Overlap { with: other });
    }

    let mut grow_columns = None;
    let mut grow_rows = None;
    for (axis, available) in [(Axis::Column, grid.columns), (Axis::Row, grid.rows)] {
        let required = candidate.required_tracks(axis);
        if required <= available {
            continue;
        }
        if !expansion.allows(axis) {
            return Placement::Rejected(RejectReason::OutOfBounds {
                axis,
                required,
                available,
            });
        }
        match axis {
            Axis::Column => grow_columns = Some(required),
            Axis::Row => grow_rows = Some(required),
        }
    }

    if grow_columns.is_none() && grow_rows.is_none() {
        Placement::Accepted
    } else {
        Placement::AcceptedWithExpansion {
            columns: grow_columns,
            rows: grow_rows,
        }
    }
}

/// First sibling (in block order) whose span overlaps `candidate`.
#[must_use]
pub fn first_overlap<T>(
    grid: &Grid<T>,
    candidate: CellSpan,
    excluding: Option<BlockId>,
) -> Option<BlockId> {
    grid.blocks
        .iter()
        .filter(|block| Some(block.id) != excluding)
        .find(|block| block.span.overlaps(&candidate))
        .map(|block| block.id)
}

/// Every pair of overlapping siblings, in block order.
#[must_use]
pub fn overlapping_pairs<T>(grid: &Grid<T>) -> Vec<(BlockId, BlockId)> {
    let mut pairs = Vec::new();
    for (i, first) in grid.blocks.iter().enumerate() {
        for second in &grid.blocks[i + 1..] {
            if first.span.overlaps(&second.span) {
                pairs.push((first.id, second.id));
            }
        }
    }
    pairs
}
