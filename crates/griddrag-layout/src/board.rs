//! Board: the forest of root grids an engine drives.
//!
//! Grids and blocks are addressed by id. Lookups walk the ownership tree, so
//! their cost is bounded by the number of nodes, and nothing but the tree
//! itself needs to be kept consistent.
//!
//! A [`Lineage`] is the root-to-grid path used for nested composition: the
//! cascade folds over its option levels, expansion depends on its depth and
//! root, and the pixel area of a nested grid is derived by mapping each
//! owning block's span through its parent's [`TrackLayout`].

use griddrag_core::{BlockId, GridId, IdAllocator, IdError, Point, Rect};
use rustc_hash::FxHashSet;

use crate::cascade::{self, CapabilityDefaults, EffectiveConfig};
use crate::collision::{self, Expansion, Placement};
use crate::error::LayoutError;
use crate::model::{Block, CascadeOptions, Grid};
use crate::span::CellSpan;
use crate::tracks::TrackLayout;

/// Root-to-grid path. `blocks[i]` owns `grids[i + 1]`.
pub struct Lineage<'a, T> {
    grids: Vec<&'a Grid<T>>,
    blocks: Vec<&'a Block<T>>,
}

impl<'a, T> Lineage<'a, T> {
    /// The grid the path leads to.
    #[must_use]
    pub fn grid(&self) -> &'a Grid<T> {
        self.grids[self.grids.len() - 1]
    }

    #[must_use]
    pub fn root(&self) -> &'a Grid<T> {
        self.grids[0]
    }

    /// Nesting depth; 0 for a root grid.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Grids from the root down to [`Self::grid`].
    #[must_use]
    pub fn grids(&self) -> &[&'a Grid<T>] {
        &self.grids
    }

    /// Blocks owning each nested grid on the path.
    #[must_use]
    pub fn owners(&self) -> &[&'a Block<T>] {
        &self.blocks
    }

    /// Declared option levels, outermost first.
    pub fn options(&self) -> impl Iterator<Item = &'a CascadeOptions> {
        let owners = self
            .blocks
            .clone()
            .into_iter()
            .map(|block| Some(&block.options))
            .chain(std::iter::once(None));
        self.grids
            .clone()
            .into_iter()
            .zip(owners)
            .flat_map(|(grid, owner)| std::iter::once(&grid.options).chain(owner))
    }

    /// Capabilities of the grid itself (used for droppable-in tests).
    #[must_use]
    pub fn effective_grid(&self, defaults: &CapabilityDefaults) -> EffectiveConfig {
        cascade::resolve(defaults, self.options())
    }

    /// Capabilities of `block`, a direct child of [`Self::grid`].
    #[must_use]
    pub fn effective_block(
        &self,
        defaults: &CapabilityDefaults,
        block: &'a Block<T>,
    ) -> EffectiveConfig {
        cascade::resolve(defaults, self.options().chain(std::iter::once(&block.options)))
    }

    /// Axes of [`Self::grid`] that may grow.
    #[must_use]
    pub fn expansion(&self, debug_couples: bool) -> Expansion {
        cascade::resolve_expansion(self.grid(), self.depth(), self.root().debug, debug_couples)
    }

    /// Pixel area of [`Self::grid`], derived from the root area.
    #[must_use]
    pub fn area(&self) -> Option<Rect> {
        let mut area = self.root().area?;
        for (grid, owner) in self.grids.iter().zip(&self.blocks) {
            area = TrackLayout::solve(grid.metrics(), area).cell_to_pixel(owner.span);
        }
        Some(area)
    }

    /// Resolved tracks of [`Self::grid`].
    #[must_use]
    pub fn track_layout(&self) -> Option<TrackLayout> {
        self.area()
            .map(|area| TrackLayout::solve(self.grid().metrics(), area))
    }
}

/// Forest of root grids plus the id allocator shared by all of them.
#[derive(Debug, Clone)]
pub struct Board<T> {
    roots: Vec<Grid<T>>,
    ids: IdAllocator,
}

impl<T> Default for Board<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Board<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            ids: IdAllocator::default(),
        }
    }

    /// Adopt a root grid tree.
    ///
    /// Every grid and block in the tree gets a fresh id (declared ids are
    /// replaced, so trees deserialized without ids are fine) and transient
    /// selection/drop state is cleared. The tree must carry a root `area` and
    /// satisfy the at-rest invariants.
    pub fn add_root(&mut self, mut grid: Grid<T>) -> Result<GridId, LayoutError> {
        if grid.area.is_none() {
            return Err(LayoutError::MissingArea { grid: grid.id });
        }
        assign_grid_ids(&mut grid, &mut self.ids)?;
        validate_tree(&grid)?;
        let id = grid.id;
        self.roots.push(grid);
        Ok(id)
    }

    /// Add `block` (and any nested tree) to `grid` without growing it.
    pub fn add_block(&mut self, grid: GridId, mut block: Block<T>) -> Result<BlockId, LayoutError> {
        if self.grid(grid).is_none() {
            return Err(LayoutError::UnknownGrid(grid));
        }
        assign_block_ids(&mut block, &mut self.ids)?;
        if let Some(child) = block.child.as_deref() {
            validate_tree(child)?;
        }
        let target = self
            .grid_mut(grid)
            .ok_or(LayoutError::UnknownGrid(grid))?;
        match collision::can_place(target, block.span, None, Expansion::NONE) {
            Placement::Rejected(reason) => Err(LayoutError::Rejected { grid, reason }),
            _ => {
                let id = block.id;
                target.blocks.push(block);
                Ok(id)
            }
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[Grid<T>] {
        &self.roots
    }

    /// Every grid, depth-first from each root.
    #[must_use]
    pub fn grids(&self) -> Vec<&Grid<T>> {
        let mut out = Vec::new();
        for root in &self.roots {
            collect_grids(root, &mut out);
        }
        out
    }

    #[must_use]
    pub fn grid(&self, id: GridId) -> Option<&Grid<T>> {
        self.roots.iter().find_map(|root| find_grid(root, id))
    }

    pub fn grid_mut(&mut self, id: GridId) -> Option<&mut Grid<T>> {
        self.roots.iter_mut().find_map(|root| find_grid_mut(root, id))
    }

    /// Grid that directly contains `block`.
    #[must_use]
    pub fn owner_of(&self, block: BlockId) -> Option<GridId> {
        self.roots
            .iter()
            .find_map(|root| find_owner(root, block))
            .map(|grid| grid.id)
    }

    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block<T>> {
        self.roots
            .iter()
            .find_map(|root| find_owner(root, id))
            .and_then(|grid| grid.block(id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block<T>> {
        self.roots
            .iter_mut()
            .find_map(|root| find_owner_mut(root, id))
            .and_then(|grid| grid.block_mut(id))
    }

    /// Root-to-grid path of `grid`.
    #[must_use]
    pub fn lineage(&self, grid: GridId) -> Option<Lineage<'_, T>> {
        self.roots.iter().find_map(|root| {
            let mut lineage = Lineage {
                grids: Vec::new(),
                blocks: Vec::new(),
            };
            collect_path(root, grid, &mut lineage.grids, &mut lineage.blocks).then_some(lineage)
        })
    }

    /// Effective capabilities of a block.
    #[must_use]
    pub fn effective_block(
        &self,
        defaults: &CapabilityDefaults,
        block: BlockId,
    ) -> Option<EffectiveConfig> {
        let lineage = self.lineage(self.owner_of(block)?)?;
        let record = lineage.grid().block(block)?;
        Some(lineage.effective_block(defaults, record))
    }

    /// Effective capabilities of a grid.
    #[must_use]
    pub fn effective_grid(
        &self,
        defaults: &CapabilityDefaults,
        grid: GridId,
    ) -> Option<EffectiveConfig> {
        self.lineage(grid)
            .map(|lineage| lineage.effective_grid(defaults))
    }

    /// Pixel area of any grid.
    #[must_use]
    pub fn grid_area(&self, grid: GridId) -> Option<Rect> {
        self.lineage(grid)?.area()
    }

    #[must_use]
    pub fn track_layout(&self, grid: GridId) -> Option<TrackLayout> {
        self.lineage(grid)?.track_layout()
    }

    /// Grids whose area contains `point`, deepest first. Among equally deep
    /// grids, later roots come first since they are painted on top.
    #[must_use]
    pub fn grids_at(&self, point: Point) -> Vec<GridId> {
        let mut hits = Vec::new();
        for root in self.roots.iter().rev() {
            if let Some(area) = root.area {
                collect_hits(root, area, point, 0, &mut hits);
            }
        }
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether `grid` is nested (at any depth) inside `block`.
    #[must_use]
    pub fn block_contains_grid(&self, block: BlockId, grid: GridId) -> bool {
        self.block(block)
            .and_then(|record| record.child.as_deref())
            .is_some_and(|child| find_grid(child, grid).is_some())
    }

    /// Detach a block (with its nested tree) from its grid.
    pub fn take_block(&mut self, block: BlockId) -> Option<(GridId, Block<T>)> {
        let grid = self
            .roots
            .iter_mut()
            .find_map(|root| find_owner_mut(root, block))?;
        let id = grid.id;
        grid.take_block(block).map(|taken| (id, taken))
    }

    /// Re-parent `block` into `grid` at `span`, keeping its id and nested
    /// tree. Placement must already have been checked by the caller.
    pub fn move_block(
        &mut self,
        block: BlockId,
        grid: GridId,
        span: CellSpan,
    ) -> Result<(), LayoutError> {
        if self.grid(grid).is_none() {
            return Err(LayoutError::UnknownGrid(grid));
        }
        if self.block_contains_grid(block, grid) {
            return Err(LayoutError::CyclicMove { block, grid });
        }
        let (_, mut taken) = self
            .take_block(block)
            .ok_or(LayoutError::UnknownBlock(block))?;
        taken.span = span;
        let target = self
            .grid_mut(grid)
            .ok_or(LayoutError::UnknownGrid(grid))?;
        target.blocks.push(taken);
        Ok(())
    }

    /// Check every at-rest invariant across the whole board.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut grids = FxHashSet::default();
        let mut blocks = FxHashSet::default();
        for root in &self.roots {
            if root.area.is_none() {
                return Err(LayoutError::MissingArea { grid: root.id });
            }
            validate_tree(root)?;
            check_unique(root, &mut grids, &mut blocks)?;
        }
        Ok(())
    }
}

impl<T> Grid<T> {
    /// Check spans, bounds and sibling overlap in this grid and every nested
    /// grid. Id uniqueness is only checked by [`Board::validate`].
    pub fn validate(&self) -> Result<(), LayoutError> {
        validate_tree(self)
    }
}

fn assign_grid_ids<T>(grid: &mut Grid<T>, ids: &mut IdAllocator) -> Result<(), IdError> {
    grid.id = ids.grid()?;
    grid.selected_child = None;
    grid.dropping_child = None;
    for block in &mut grid.blocks {
        assign_block_ids(block, ids)?;
    }
    Ok(())
}

fn assign_block_ids<T>(block: &mut Block<T>, ids: &mut IdAllocator) -> Result<(), IdError> {
    block.id = ids.block()?;
    if let Some(child) = block.child.as_deref_mut() {
        assign_grid_ids(child, ids)?;
    }
    Ok(())
}

fn validate_tree<T>(grid: &Grid<T>) -> Result<(), LayoutError> {
    for block in &grid.blocks {
        block
            .span
            .validate()
            .map_err(|source| LayoutError::InvalidSpan {
                block: block.id,
                source,
            })?;
        if !block.span.fits_within(grid.columns, grid.rows) {
            return Err(LayoutError::OutOfBounds {
                grid: grid.id,
                block: block.id,
            });
        }
    }
    if let Some(&(first, second)) = collision::overlapping_pairs(grid).first() {
        return Err(LayoutError::Overlap {
            grid: grid.id,
            first,
            second,
        });
    }
    grid.children().try_for_each(validate_tree)
}

fn check_unique<T>(
    grid: &Grid<T>,
    grids: &mut FxHashSet<GridId>,
    blocks: &mut FxHashSet<BlockId>,
) -> Result<(), LayoutError> {
    if !grids.insert(grid.id) {
        return Err(LayoutError::DuplicateGrid(grid.id));
    }
    for block in &grid.blocks {
        if !blocks.insert(block.id) {
            return Err(LayoutError::DuplicateBlock(block.id));
        }
        if let Some(child) = block.child.as_deref() {
            check_unique(child, grids, blocks)?;
        }
    }
    Ok(())
}

fn collect_grids<'a, T>(grid: &'a Grid<T>, out: &mut Vec<&'a Grid<T>>) {
    out.push(grid);
    for child in grid.children() {
        collect_grids(child, out);
    }
}

fn find_grid<T>(grid: &Grid<T>, id: GridId) -> Option<&Grid<T>> {
    if grid.id == id {
        return Some(grid);
    }
    grid.children().find_map(|child| find_grid(child, id))
}

fn find_grid_mut<T>(grid: &mut Grid<T>, id: GridId) -> Option<&mut Grid<T>> {
    if grid.id == id {
        return Some(grid);
    }
    grid.blocks
        .iter_mut()
        .filter_map(|block| block.child.as_deref_mut())
        .find_map(|child| find_grid_mut(child, id))
}

fn find_owner<T>(grid: &Grid<T>, block: BlockId) -> Option<&Grid<T>> {
    if grid.blocks.iter().any(|b| b.id == block) {
        return Some(grid);
    }
    grid.children().find_map(|child| find_owner(child, block))
}

fn find_owner_mut<T>(grid: &mut Grid<T>, block: BlockId) -> Option<&mut Grid<T>> {
    if grid.blocks.iter().any(|b| b.id == block) {
        return Some(grid);
    }
    grid.blocks
        .iter_mut()
        .filter_map(|b| b.child.as_deref_mut())
        .find_map(|child| find_owner_mut(child, block))
}

fn collect_path<'a, T>(
    grid: &'a Grid<T>,
    target: GridId,
    grids: &mut Vec<&'a Grid<T>>,
    blocks: &mut Vec<&'a Block<T>>,
) -> bool {
    grids.push(grid);
    if grid.id == target {
        return true;
    }
    for block in &grid.blocks {
        if let Some(child) = block.child.as_deref() {
            blocks.push(block);
            if collect_path(child, target, grids, blocks) {
                return true;
            }
            blocks.pop();
        }
    }
    grids.pop();
    false
}

fn collect_hits<T>(
    grid: &Grid<T>,
    area: Rect,
    point: Point,
    depth: usize,
    hits: &mut Vec<(usize, GridId)>,
) {
    if !area.contains(point) {
        return;
    }
    hits.push((depth, grid.id));
    let layout = TrackLayout::solve(grid.metrics(), area);
    for block in &grid.blocks {
        if let Some(child) = block.child.as_deref() {
            collect_hits(child, layout.cell_to_pixel(block.span), point, depth + 1, hits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CascadeOptions;

    fn area() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 400.0)
    }

    fn nested_board() -> (Board<&'static str>, GridId) {
        let inner = Grid::new(2, 2).with_block(Block::new(CellSpan::cell(1, 1), "leaf"));
        let root = Grid::new(4, 4)
            .with_area(area())
            .with_block(Block::new(CellSpan::new(3, 5, 3, 5), "host").with_child(inner))
            .with_block(Block::new(CellSpan::cell(1, 1), "plain"));
        let mut board = Board::new();
        let id = board.add_root(root).expect("valid root");
        (board, id)
    }

    #[test]
    fn add_root_assigns_unique_ids() {
        let (board, root) = nested_board();
        assert!(board.validate().is_ok());
        let all = board.grids();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, root);
        let host = board.roots()[0].blocks[0].id;
        let leaf = all[1].blocks[0].id;
        assert_ne!(host, leaf);
        assert_eq!(board.owner_of(leaf), Some(all[1].id));
        assert_eq!(board.block(leaf).map(|b| b.data), Some("leaf"));
    }

    #[test]
    fn add_root_requires_area() {
        let mut board: Board<()> = Board::new();
        assert!(matches!(
            board.add_root(Grid::new(2, 2)),
            Err(LayoutError::MissingArea { .. })
        ));
    }

    #[test]
    fn add_root_rejects_overlap() {
        let root: Grid<()> = Grid::new(4, 4)
            .with_area(area())
            .with_block(Block::new(CellSpan::new(1, 3, 1, 3), ()))
            .with_block(Block::new(CellSpan::cell(2, 2), ()));
        let mut board = Board::new();
        assert!(matches!(
            board.add_root(root),
            Err(LayoutError::Overlap { .. })
        ));
    }

    #[test]
    fn nested_area_follows_owner_span() {
        let (board, _) = nested_board();
        let inner = board.grids()[1].id;
        assert_eq!(board.grid_area(inner), Some(Rect::new(200.0, 200.0, 200.0, 200.0)));
        let lineage = board.lineage(inner).expect("nested grid");
        assert_eq!(lineage.depth(), 1);
        assert_eq!(lineage.options().count(), 3);
    }

    #[test]
    fn grids_at_lists_deepest_first() {
        let (board, root) = nested_board();
        let inner = board.grids()[1].id;
        assert_eq!(board.grids_at(Point::new(250.0, 250.0)), vec![inner, root]);
        assert_eq!(board.grids_at(Point::new(10.0, 10.0)), vec![root]);
        assert!(board.grids_at(Point::new(900.0, 10.0)).is_empty());
    }

    #[test]
    fn readonly_root_reaches_nested_blocks() {
        let inner = Grid::new(2, 2).with_block(
            Block::new(CellSpan::cell(1, 1), ()).with_options(CascadeOptions::new().draggable(true)),
        );
        let root = Grid::new(2, 2)
            .with_area(area())
            .with_options(CascadeOptions::new().readonly(true))
            .with_block(Block::new(CellSpan::cell(1, 1), ()).with_child(inner));
        let mut board = Board::new();
        board.add_root(root).expect("valid root");
        let leaf = board.grids()[1].blocks[0].id;
        let effective = board
            .effective_block(&CapabilityDefaults::default(), leaf)
            .expect("known block");
        assert!(effective.readonly);
        assert!(!effective.draggable);
    }

    #[test]
    fn move_block_keeps_id_and_child() {
        let mut board: Board<&str> = Board::new();
        let a = board
            .add_root(Grid::new(4, 4).with_area(area()))
            .expect("grid a");
        let b = board
            .add_root(Grid::new(4, 4).with_area(Rect::new(500.0, 0.0, 400.0, 400.0)))
            .expect("grid b");
        let block = board
            .add_block(
                a,
                Block::new(CellSpan::cell(1, 1), "x").with_child(Grid::new(1, 1)),
            )
            .expect("placed");
        board
            .move_block(block, b, CellSpan::cell(2, 2))
            .expect("moved");
        assert_eq!(board.owner_of(block), Some(b));
        assert_eq!(board.block(block).map(|x| x.span), Some(CellSpan::cell(2, 2)));
        assert!(board.block(block).and_then(|x| x.child.as_ref()).is_some());
        assert!(board.grid(a).is_some_and(|grid| grid.blocks.is_empty()));
    }

    #[test]
    fn move_into_own_subtree_is_refused() {
        let (mut board, _) = nested_board();
        let host = board.roots()[0].blocks[0].id;
        let inner = board.grids()[1].id;
        assert_eq!(
            board.move_block(host, inner, CellSpan::cell(2, 2)),
            Err(LayoutError::CyclicMove {
                block: host,
                grid: inner,
            })
        );
        assert!(board.validate().is_ok());
    }

    #[test]
    fn add_block_refuses_overlap() {
        let (mut board, root) = nested_board();
        assert!(matches!(
            board.add_block(root, Block::new(CellSpan::cell(1, 1), "dup")),
            Err(LayoutError::Rejected { .. })
        ));
    }

    #[test]
    fn grid_validate_walks_nested_grids() {
        let loose = Grid::new(2, 2).with_block(Block::new(CellSpan::new(2, 4, 1, 2), ()));
        assert!(matches!(loose.validate(), Err(LayoutError::OutOfBounds { .. })));

        let crowded = Grid::new(2, 2)
            .with_block(Block::new(CellSpan::cell(1, 1), ()))
            .with_block(Block::new(CellSpan::new(1, 3, 1, 2), ()));
        let outer = Grid::new(2, 2).with_block(Block::new(CellSpan::cell(1, 1), ()).with_child(crowded));
        assert!(matches!(outer.validate(), Err(LayoutError::Overlap { .. })));
    }
}
