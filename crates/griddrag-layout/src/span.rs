//! Cell spans: rectangles expressed in grid line indices.
//!
//! Lines are 1-based and spans are half-open, matching CSS grid placement:
//! a span `column_start = 2, column_end = 4` covers columns 2 and 3. Two
//! spans that merely share a boundary line do not overlap.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Column,
    Row,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column => f.write_str("column"),
            Self::Row => f.write_str("row"),
        }
    }
}

/// Placement of a block in grid line coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSpan {
    pub column_start: u32,
    pub column_end: u32,
    pub row_start: u32,
    pub row_end: u32,
}

impl CellSpan {
    /// Span returned by geometry queries against a grid without tracks.
    pub const DEGENERATE: Self = Self::new(1, 1, 1, 1);

    /// Create a span from raw line numbers. Not validated; see [`Self::validate`].
    #[must_use]
    pub const fn new(column_start: u32, column_end: u32, row_start: u32, row_end: u32) -> Self {
        Self {
            column_start,
            column_end,
            row_start,
            row_end,
        }
    }

    /// Span of `columns × rows` cells whose top-left cell is (`column`, `row`).
    #[must_use]
    pub const fn at(column: u32, row: u32, columns: u32, rows: u32) -> Self {
        Self::new(
            column,
            column.saturating_add(columns),
            row,
            row.saturating_add(rows),
        )
    }

    /// Single cell.
    #[must_use]
    pub const fn cell(column: u32, row: u32) -> Self {
        Self::at(column, row, 1, 1)
    }

    /// Start line on an axis.
    #[must_use]
    pub const fn start(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Column => self.column_start,
            Axis::Row => self.row_start,
        }
    }

    /// End line (exclusive) on an axis.
    #[must_use]
    pub const fn end(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Column => self.column_end,
            Axis::Row => self.row_end,
        }
    }

    /// Number of cells covered on an axis (0 for inverted spans).
    #[must_use]
    pub const fn len(&self, axis: Axis) -> u32 {
        self.end(axis).saturating_sub(self.start(axis))
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.len(Axis::Column)
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.len(Axis::Row)
    }

    /// Track count an axis must have for this span to fit.
    #[must_use]
    pub const fn required_tracks(&self, axis: Axis) -> u32 {
        self.end(axis).saturating_sub(1)
    }

    /// `start ≥ 1` and `end > start` on both axes.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.column_start >= 1
            && self.row_start >= 1
            && self.column_end > self.column_start
            && self.row_end > self.row_start
    }

    /// Validate the span, reporting the first offending axis.
    pub fn validate(&self) -> Result<(), SpanError> {
        for axis in [Axis::Column, Axis::Row] {
            if self.start(axis) < 1 {
                return Err(SpanError::StartBeforeFirstLine { span: *self, axis });
            }
            if self.end(axis) <= self.start(axis) {
                return Err(SpanError::Empty { span: *self, axis });
            }
        }
        Ok(())
    }

    /// Axis-aligned overlap on half-open intervals.
    #[must_use]
    pub const fn overlaps(&self, other: &CellSpan) -> bool {
        self.column_start < other.column_end
            && other.column_start < self.column_end
            && self.row_start < other.row_end
            && other.row_start < self.row_end
    }

    /// Whether the span lies inside a `columns × rows` grid.
    #[must_use]
    pub const fn fits_within(&self, columns: u32, rows: u32) -> bool {
        self.required_tracks(Axis::Column) <= columns && self.required_tracks(Axis::Row) <= rows
    }

    /// Move by whole cells, keeping the size and never crossing line 1.
    #[must_use]
    pub fn translate(&self, columns: i32, rows: i32) -> CellSpan {
        let (column_start, column_end) =
            shift_interval(self.column_start, self.column_end, columns);
        let (row_start, row_end) = shift_interval(self.row_start, self.row_end, rows);
        CellSpan::new(column_start, column_end, row_start, row_end)
    }

    /// Pull the span back inside `[1, tracks + 1)` on one axis, keeping its
    /// size when possible.
    #[must_use]
    pub fn clamp_axis(&self, axis: Axis, tracks: u32) -> CellSpan {
        let len = self.len(axis).clamp(1, tracks.max(1));
        let max_start = tracks.saturating_sub(len).saturating_add(1).max(1);
        let start = self.start(axis).clamp(1, max_start);
        self.with_axis(axis, start, start + len)
    }

    /// Replace the interval on one axis.
    #[must_use]
    pub const fn with_axis(&self, axis: Axis, start: u32, end: u32) -> CellSpan {
        match axis {
            Axis::Column => CellSpan::new(start, end, self.row_start, self.row_end),
            Axis::Row => CellSpan::new(self.column_start, self.column_end, start, end),
        }
    }
}

impl fmt::Display for CellSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} / {}",
            self.row_start, self.column_start, self.row_end, self.column_end
        )
    }
}

fn shift_interval(start: u32, end: u32, by: i32) -> (u32, u32) {
    let len = end.saturating_sub(start);
    let shifted = i64::from(start) + i64::from(by);
    let start = u32::try_from(shifted.max(1)).unwrap_or(u32::MAX - len);
    (start, start.saturating_add(len))
}

/// A span that cannot be placed anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanError {
    StartBeforeFirstLine { span: CellSpan, axis: Axis },
    Empty { span: CellSpan, axis: Axis },
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartBeforeFirstLine { span, axis } => {
                write!(f, "span {span} starts before {axis} line 1")
            }
            Self::Empty { span, axis } => {
                write!(f, "span {span} has {axis} end <= start")
            }
        }
    }
}

impl std::error::Error for SpanError {}
