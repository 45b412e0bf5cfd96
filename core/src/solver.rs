//! Lookahead move advisor.
//!
//! Searches pop sequences on the known part of the board. Refilled cells are
//! unknown until they are drawn, so the search collapses after each pop but
//! leaves the vacated cells empty. The search uses:
//! - Iterative deepening up to the requested depth
//! - A node budget instead of a wall clock, so results are deterministic and
//!   the search runs unchanged under WebAssembly
//! - A transposition table keyed by board
//! - A mobility heuristic at the leaves: bubbles still sitting in poppable
//!   regions

use std::collections::HashMap;

use crate::deadlock::clearable_regions;
use crate::gravity::collapse;
use crate::grid::{Grid, Pos};
use crate::region::Region;

// =============================================================================
// Types and Constants
// =============================================================================

/// Upper bound on positions evaluated per call.
pub const NODE_BUDGET: usize = 50_000;

/// Weight of bubbles still poppable at a leaf, relative to bubbles popped.
const MOBILITY_WEIGHT: f64 = 0.5;

/// Cap on cached positions.
const TABLE_LIMIT: usize = 100_000;

// =============================================================================
// Board Operations
// =============================================================================

/// The known board after popping `region`: cleared and collapsed, not refilled.
fn apply_pop(grid: &Grid, region: &Region) -> Grid {
    let mut next = grid.clone();
    next.clear(region);
    collapse(&mut next);
    next
}

/// The cell a player would click to pop `region`.
fn representative(region: &Region) -> Option<Pos> {
    region.iter().next().copied()
}

// =============================================================================
// Evaluation
// =============================================================================

fn evaluate(grid: &Grid, min_group_size: usize) -> f64 {
    let poppable: usize = clearable_regions(grid, min_group_size)
        .iter()
        .map(Region::len)
        .sum();
    poppable as f64 * MOBILITY_WEIGHT
}

// =============================================================================
// Search
// =============================================================================

pub struct Solver {
    min_group_size: usize,
    transposition_table: HashMap<(Grid, usize), f64>,
    nodes_searched: usize,
    node_budget: usize,
}

impl Solver {
    pub fn new(min_group_size: usize) -> Self {
        Self::with_budget(min_group_size, NODE_BUDGET)
    }

    pub fn with_budget(min_group_size: usize, node_budget: usize) -> Self {
        Self {
            min_group_size,
            transposition_table: HashMap::new(),
            nodes_searched: 0,
            node_budget,
        }
    }

    pub fn nodes_searched(&self) -> usize {
        self.nodes_searched
    }

    fn out_of_budget(&self) -> bool {
        self.nodes_searched >= self.node_budget
    }

    /// Best total of bubbles popped over `depth` more pops, plus the leaf
    /// heuristic.
    fn search(&mut self, grid: &Grid, depth: usize) -> f64 {
        self.nodes_searched += 1;

        if depth == 0 || self.out_of_budget() {
            return evaluate(grid, self.min_group_size);
        }

        let key = (grid.clone(), depth);
        if let Some(&cached) = self.transposition_table.get(&key) {
            return cached;
        }

        let regions = clearable_regions(grid, self.min_group_size);
        if regions.is_empty() {
            return 0.0;
        }

        let mut best = f64::MIN;
        for region in &regions {
            let next = apply_pop(grid, region);
            let value = region.len() as f64 + self.search(&next, depth - 1);
            best = best.max(value);
        }

        if self.transposition_table.len() < TABLE_LIMIT {
            self.transposition_table.insert(key, best);
        }

        best
    }

    /// Score every poppable region from the root and return the best one.
    ///
    /// Ties go to the larger immediate pop, then to the earlier region in
    /// row-major order.
    fn best_root(&mut self, grid: &Grid, depth: usize) -> Option<(Pos, f64)> {
        let mut best: Option<(Pos, f64, usize)> = None;
        for region in clearable_regions(grid, self.min_group_size) {
            let next = apply_pop(grid, &region);
            let value = region.len() as f64 + self.search(&next, depth.saturating_sub(1));
            let pos = representative(&region)?;
            let better = match best {
                None => true,
                Some((_, best_value, best_size)) => {
                    value > best_value || (value == best_value && region.len() > best_size)
                }
            };
            if better {
                best = Some((pos, value, region.len()));
            }
        }
        best.map(|(pos, value, _)| (pos, value))
    }
}

// =============================================================================
// Main Interface
// =============================================================================

/// Recommend a cell to pop, searching up to `max_depth` pops ahead.
///
/// Returns `None` when the board has no legal move. Deeper iterations only
/// replace the answer if they finish inside the node budget.
pub fn find_best_move(grid: &Grid, min_group_size: usize, max_depth: usize) -> Option<Pos> {
    let mut best_move = None;

    for depth in 1..=max_depth.max(1) {
        let mut solver = Solver::new(min_group_size);
        let Some((pos, value)) = solver.best_root(grid, depth) else {
            return None;
        };

        if solver.out_of_budget() && best_move.is_some() {
            log::trace!("depth {depth} ran out of budget, keeping previous answer");
            break;
        }
        log::trace!(
            "depth {depth}: best {pos} value {value:.1} after {} nodes",
            solver.nodes_searched()
        );
        best_move = Some(pos);
    }

    best_move
}

/// The cell of the largest poppable region, first in row-major order on ties.
pub fn largest_region_move(grid: &Grid, min_group_size: usize) -> Option<Pos> {
    let mut best: Option<&Region> = None;
    let regions = clearable_regions(grid, min_group_size);
    for region in &regions {
        if best.map_or(true, |b| region.len() > b.len()) {
            best = Some(region);
        }
    }
    best.and_then(representative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::checkerboard;

    #[test]
    fn test_no_move_on_deadlocked_board() {
        let grid = checkerboard(4, 4);
        assert_eq!(find_best_move(&grid, 2, 3), None);
        assert_eq!(largest_region_move(&grid, 2), None);
    }

    #[test]
    fn test_single_region() {
        let grid = Grid::parse("RGB\nRBG\nRGB").unwrap();
        assert_eq!(find_best_move(&grid, 3, 2), Some(Pos::new(0, 0)));
        assert_eq!(largest_region_move(&grid, 3), Some(Pos::new(0, 0)));
    }

    #[test]
    fn test_largest_region_prefers_size() {
        let grid = Grid::parse(
            "
            RRRB
            GGGG
            BYBY
            ",
        )
        .unwrap();
        assert_eq!(largest_region_move(&grid, 3), Some(Pos::new(1, 0)));
    }

    #[test]
    fn test_lookahead_beats_greedy() {
        // Greedy takes the column of four greens, which drops the middle
        // column and leaves no moves. Popping the reds first joins the blue
        // pairs into a square and keeps the greens: 3 + 4 + 4.
        let grid = Grid::parse(
            "
            BBY
            RRR
            BBY
            YGR
            RGY
            YGR
            RGY
            ",
        )
        .unwrap();
        assert_eq!(largest_region_move(&grid, 3), Some(Pos::new(3, 1)));
        assert_eq!(find_best_move(&grid, 3, 3), Some(Pos::new(1, 0)));
    }

    #[test]
    fn test_apply_pop_leaves_holes_on_top() {
        let grid = Grid::parse("RRR\nGGG").unwrap();
        let region: Region = [Pos::new(1, 0), Pos::new(1, 1), Pos::new(1, 2)]
            .into_iter()
            .collect();
        assert_eq!(apply_pop(&grid, &region), Grid::parse("...\nRRR").unwrap());
    }

    #[test]
    fn test_budget_is_respected() {
        let grid = Grid::parse("RRRR\nRRRR\nGGGG\nGGGG").unwrap();
        let mut solver = Solver::with_budget(2, 5);
        solver.search(&grid, 6);
        assert!(solver.nodes_searched() <= 6);
    }

    #[test]
    fn test_deterministic() {
        let grid = Grid::parse(
            "
            RRGBY
            RGGBY
            YYBBR
            GRRGG
            ",
        )
        .unwrap();
        let first = find_best_move(&grid, 3, 3);
        for _ in 0..3 {
            assert_eq!(find_best_move(&grid, 3, 3), first);
        }
        assert!(first.is_some());
    }
}
