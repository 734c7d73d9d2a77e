//! Declarative grid and block records.
//!
//! A [`Grid`] exclusively owns its [`Block`]s and a block exclusively owns its
//! optional nested child grid, so a layout is a plain ownership tree. Each
//! record stores only what was declared on it; inherited capabilities are
//! derived on demand by [`crate::cascade`].

use std::fmt;
use std::str::FromStr;

use griddrag_core::{BlockId, GridId, Rect};
use serde::{Deserialize, Serialize};

use crate::collision::Placement;
use crate::span::CellSpan;

/// CSS `overflow` applied to a block's content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    Visible,
    #[default]
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl Overflow {
    /// CSS keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Clip => "clip",
            Self::Scroll => "scroll",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

impl FromStr for Overflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            "clip" => Ok(Self::Clip),
            "scroll" => Ok(Self::Scroll),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown overflow keyword {other:?}")),
        }
    }
}

/// Options shared by grids and blocks that cascade from outer to inner
/// levels. `None` means "inherit".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeOptions {
    pub overflow: Option<Overflow>,
    /// Selector of the element that starts a drag.
    pub drag_handler: Option<String>,
    /// Vetoes every capability below this level once set.
    pub readonly: Option<bool>,
    pub draggable: Option<bool>,
    pub resizable: Option<bool>,
    pub removable: Option<bool>,
    pub droppable_in: Option<bool>,
    pub droppable_out: Option<bool>,
}

/// Options declared on a grid.
pub type GridOptions = CascadeOptions;
/// Options declared on a block.
pub type BlockOptions = CascadeOptions;

impl CascadeOptions {
    /// Empty option set (everything inherited).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = Some(overflow);
        self
    }

    pub fn drag_handler(mut self, selector: impl Into<String>) -> Self {
        self.drag_handler = Some(selector.into());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = Some(draggable);
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = Some(resizable);
        self
    }

    pub fn removable(mut self, removable: bool) -> Self {
        self.removable = Some(removable);
        self
    }

    pub fn droppable_in(mut self, droppable_in: bool) -> Self {
        self.droppable_in = Some(droppable_in);
        self
    }

    pub fn droppable_out(mut self, droppable_out: bool) -> Self {
        self.droppable_out = Some(droppable_out);
        self
    }
}

/// Track sizing inputs of one grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    pub columns: u32,
    pub rows: u32,
    pub gap: f64,
    /// Fixed column width; `None` shares the width equally (`1fr`).
    pub column_size: Option<f64>,
    /// Fixed row height; `None` shares the height equally (`1fr`).
    pub row_size: Option<f64>,
}

/// One placed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block<T> {
    #[serde(default)]
    pub id: BlockId,
    #[serde(flatten)]
    pub span: CellSpan,
    #[serde(flatten)]
    pub options: CascadeOptions,
    /// Opaque payload relocated with the block, never inspected.
    pub data: T,
    /// Nested grid rendered inside this block.
    #[serde(default)]
    pub child: Option<Box<Grid<T>>>,
}

impl<T> Block<T> {
    /// New block at `span` with inherited options.
    #[must_use]
    pub fn new(span: CellSpan, data: T) -> Self {
        Self {
            id: BlockId::MIN,
            span,
            options: CascadeOptions::default(),
            data,
            child: None,
        }
    }

    /// Replace the declared options.
    #[must_use]
    pub fn with_options(mut self, options: CascadeOptions) -> Self {
        self.options = options;
        self
    }

    /// Nest a grid inside this block.
    #[must_use]
    pub fn with_child(mut self, child: Grid<T>) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Whether the block declares itself read-only.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.options.readonly.unwrap_or(false)
    }
}

/// A grid container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    #[serde(default)]
    pub id: GridId,
    pub columns: u32,
    pub rows: u32,
    #[serde(default)]
    pub gap: f64,
    #[serde(default)]
    pub column_size: Option<f64>,
    #[serde(default)]
    pub row_size: Option<f64>,
    /// Allow growing `columns` to the right.
    #[serde(default)]
    pub column_expandable: bool,
    /// Allow growing `rows` downwards.
    #[serde(default)]
    pub row_expandable: bool,
    /// On a root grid, disables expansion in every nested grid.
    #[serde(default)]
    pub debug: bool,
    #[serde(flatten)]
    pub options: CascadeOptions,
    #[serde(default = "Vec::new")]
    pub blocks: Vec<Block<T>>,
    /// Block pending insertion from another grid.
    #[serde(skip)]
    pub dropping_child: Option<Box<Block<T>>>,
    #[serde(default)]
    pub selected_child: Option<BlockId>,
    /// Pixel viewport of a root grid. Nested grids derive theirs from the
    /// owning block.
    #[serde(default)]
    pub area: Option<Rect>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
}

impl<T> Grid<T> {
    /// Empty `columns × rows` grid with `1fr` tracks and no gap.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            id: GridId::MIN,
            columns,
            rows,
            gap: 0.0,
            column_size: None,
            row_size: None,
            column_expandable: false,
            row_expandable: false,
            debug: false,
            options: CascadeOptions::default(),
            blocks: Vec::new(),
            dropping_child: None,
            selected_child: None,
            area: None,
            class_name: None,
            tag_name: None,
        }
    }

    #[must_use]
    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    #[must_use]
    pub fn with_column_size(mut self, size: f64) -> Self {
        self.column_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_row_size(mut self, size: f64) -> Self {
        self.row_size = Some(size);
        self
    }

    #[must_use]
    pub fn expandable(mut self, columns: bool, rows: bool) -> Self {
        self.column_expandable = columns;
        self.row_expandable = rows;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: CascadeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_area(mut self, area: Rect) -> Self {
        self.area = Some(area);
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: Block<T>) -> Self {
        self.blocks.push(block);
        self
    }

    /// Track sizing inputs.
    #[must_use]
    pub fn metrics(&self) -> GridMetrics {
        GridMetrics {
            columns: self.columns,
            rows: self.rows,
            gap: self.gap,
            column_size: self.column_size,
            row_size: self.row_size,
        }
    }

    /// A grid with no columns or no rows refuses every placement.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block<T>> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block<T>> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    #[must_use]
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    /// Remove a direct child block, clearing selection that pointed at it.
    pub fn take_block(&mut self, id: BlockId) -> Option<Block<T>> {
        let index = self.block_index(id)?;
        if self.selected_child == Some(id) {
            self.selected_child = None;
        }
        Some(self.blocks.remove(index))
    }

    /// Grow the grid as an accepted placement requires. Never shrinks.
    pub fn apply_placement(&mut self, placement: &Placement) {
        if let Placement::AcceptedWithExpansion { columns, rows } = *placement {
            if let Some(columns) = columns {
                self.columns = self.columns.max(columns);
            }
            if let Some(rows) = rows {
                self.rows = self.rows.max(rows);
            }
        }
    }

    /// Direct nested grids, in block order.
    pub fn children(&self) -> impl Iterator<Item = &Grid<T>> {
        self.blocks.iter().filter_map(|block| block.child.as_deref())
    }
}
