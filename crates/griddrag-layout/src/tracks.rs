//! Geometry mapper: pixel rectangles ⇄ cell spans.
//!
//! Every track of one axis has the same size: either the declared fixed size
//! or an equal share of the available extent after gaps (`1fr`). Track `k`
//! (1-based) therefore starts at `origin + (k - 1) * pitch` where
//! `pitch = size + gap`, and grid line `k` used as an *end* edge sits at the
//! end of track `k - 1`. Lines past the last track extrapolate with the same
//! pitch so a drag can address cells that expansion would create.
//!
//! # Invariants
//!
//! 1. `cell_to_pixel(pixel_to_cell(r))` is a fixed point: applying the
//!    round trip twice yields the same rectangle as applying it once.
//! 2. Exact half-way positions round toward the hint span, so a pointer
//!    hovering on a boundary never flickers between two cells.
//! 3. A grid without tracks maps every span to an empty rectangle at the
//!    area origin and every rectangle to [`CellSpan::DEGENERATE`].

use griddrag_core::{Point, Rect};

use crate::model::GridMetrics;
use crate::span::{Axis, CellSpan};

const TIE_EPSILON: f64 = 1e-9;

/// One resolved track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Offset of the leading edge in pixels.
    pub start: f64,
    pub size: f64,
}

impl Track {
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.size
    }
}

/// Uniform tracks along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTracks {
    origin: f64,
    count: u32,
    size: f64,
    gap: f64,
}

impl AxisTracks {
    fn solve(origin: f64, extent: f64, count: u32, gap: f64, fixed: Option<f64>) -> Self {
        let gap = gap.max(0.0);
        let size = match (fixed, count) {
            (_, 0) => 0.0,
            (Some(size), _) => size.max(0.0),
            (None, n) => ((extent - gap * f64::from(n - 1)) / f64::from(n)).max(0.0),
        };
        Self {
            origin,
            count,
            size,
            gap,
        }
    }

    /// Number of tracks.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Size of every track.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Distance between the leading edges of two consecutive tracks.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.size + self.gap
    }

    /// Track `k` (1-based), extrapolated past the last one.
    #[must_use]
    pub fn track(&self, k: u32) -> Track {
        Track {
            start: self.line_as_start(k),
            size: self.size,
        }
    }

    /// Every declared track, in order.
    pub fn iter(&self) -> impl Iterator<Item = Track> + '_ {
        (1..=self.count).map(|k| self.track(k))
    }

    fn line_as_start(&self, line: u32) -> f64 {
        self.origin + f64::from(line.saturating_sub(1)) * self.pitch()
    }

    fn line_as_end(&self, line: u32) -> f64 {
        if line <= 1 {
            return self.origin;
        }
        self.line_as_start(line) - self.gap
    }

    /// Nearest start line for a leading edge at `position`.
    fn nearest_start_line(&self, position: f64, hint: Option<u32>) -> u32 {
        if self.pitch() <= 0.0 {
            return 1;
        }
        let real = (position - self.origin) / self.pitch() + 1.0;
        round_line(real, hint).max(1)
    }

    /// Nearest end line for a trailing edge at `position`.
    fn nearest_end_line(&self, position: f64, hint: Option<u32>) -> u32 {
        if self.pitch() <= 0.0 {
            return 1;
        }
        let real = (position - self.origin + self.gap) / self.pitch() + 1.0;
        round_line(real, hint).max(1)
    }

    /// Whole cells travelled by a pixel delta; exact halves round toward zero.
    #[must_use]
    pub fn cells_for_delta(&self, delta: f64) -> i32 {
        let pitch = self.pitch();
        if self.count == 0 || pitch <= 0.0 || !delta.is_finite() {
            return 0;
        }
        let cells = delta / pitch;
        let magnitude = cells.abs();
        let floor = magnitude.floor();
        let rounded = if (magnitude - floor - 0.5).abs() <= TIE_EPSILON {
            floor
        } else {
            magnitude.round()
        };
        let rounded = rounded.min(f64::from(i32::MAX));
        (rounded as i32) * if cells < 0.0 { -1 } else { 1 }
    }
}

/// Round a fractional line index, breaking exact ties toward `hint`.
fn round_line(real: f64, hint: Option<u32>) -> u32 {
    if !real.is_finite() {
        return 1;
    }
    let floor = real.floor();
    let fraction = real - floor;
    let line = if (fraction - 0.5).abs() <= TIE_EPSILON {
        match hint {
            Some(hint) if f64::from(hint) > floor => floor + 1.0,
            _ => floor,
        }
    } else {
        real.round()
    };
    if line < 1.0 {
        1
    } else {
        line.min(f64::from(u32::MAX)) as u32
    }
}

/// Resolved track geometry of one grid inside a pixel area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackLayout {
    area: Rect,
    columns: AxisTracks,
    rows: AxisTracks,
}

impl TrackLayout {
    /// Resolve tracks for `metrics` laid out inside `area`.
    #[must_use]
    pub fn solve(metrics: GridMetrics, area: Rect) -> Self {
        Self {
            area,
            columns: AxisTracks::solve(
                area.x,
                area.width,
                metrics.columns,
                metrics.gap,
                metrics.column_size,
            ),
            rows: AxisTracks::solve(
                area.y,
                area.height,
                metrics.rows,
                metrics.gap,
                metrics.row_size,
            ),
        }
    }

    /// The area the layout was solved for.
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// Tracks along one axis.
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> &AxisTracks {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    /// No columns or no rows.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.columns.count == 0 || self.rows.count == 0
    }

    /// Pixel rectangle covered by a span. Lines past the last track are
    /// extrapolated.
    #[must_use]
    pub fn cell_to_pixel(&self, span: CellSpan) -> Rect {
        if self.is_degenerate() {
            return Rect::empty_at(self.area.origin());
        }
        let x = self.columns.line_as_start(span.column_start);
        let y = self.rows.line_as_start(span.row_start);
        let right = self.columns.line_as_end(span.column_end);
        let bottom = self.rows.line_as_end(span.row_end);
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    /// Snap a pixel rectangle to the nearest whole-cell span.
    ///
    /// `hint` is the span the rectangle came from; exact ties round toward it.
    /// The result always covers at least one cell on each axis.
    #[must_use]
    pub fn pixel_to_cell(&self, rect: Rect, hint: Option<CellSpan>) -> CellSpan {
        if self.is_degenerate() {
            return CellSpan::DEGENERATE;
        }
        let column_start = self
            .columns
            .nearest_start_line(rect.left(), hint.map(|h| h.column_start));
        let row_start = self
            .rows
            .nearest_start_line(rect.top(), hint.map(|h| h.row_start));
        let column_end = self
            .columns
            .nearest_end_line(rect.right(), hint.map(|h| h.column_end))
            .max(column_start + 1);
        let row_end = self
            .rows
            .nearest_end_line(rect.bottom(), hint.map(|h| h.row_end))
            .max(row_start + 1);
        CellSpan::new(column_start, column_end, row_start, row_end)
    }

    /// Whole cells travelled by a pointer delta.
    #[must_use]
    pub fn delta_to_cells(&self, dx: f64, dy: f64) -> (i32, i32) {
        (
            self.columns.cells_for_delta(dx),
            self.rows.cells_for_delta(dy),
        )
    }

    /// Cell containing `point`, if it lies on a declared track.
    #[must_use]
    pub fn cell_at(&self, point: Point) -> Option<(u32, u32)> {
        if self.is_degenerate() || !self.area.contains(point) {
            return None;
        }
        let column = self
            .columns
            .iter()
            .position(|t| point.x >= t.start && point.x < t.end())?;
        let row = self
            .rows
            .iter()
            .position(|t| point.y >= t.start && point.y < t.end())?;
        Some((column as u32 + 1, row as u32 + 1))
    }
}
