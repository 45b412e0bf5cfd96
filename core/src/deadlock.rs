//! Deadlock detection: does any poppable region remain?

use crate::grid::Grid;
use crate::region::{flood, Region};

/// Whether some region on the grid has at least `min_group_size` bubbles.
///
/// Regions are computed once each: cells covered by an earlier region in the
/// scan are skipped, so the whole scan is O(rows * cols).
pub fn has_legal_move(grid: &Grid, min_group_size: usize) -> bool {
    let mut visited = vec![false; grid.rows() * grid.cols()];
    for pos in grid.positions() {
        if visited[grid.index(pos)] || grid.cell(pos).is_none() {
            continue;
        }
        match flood(grid, pos, &mut visited) {
            Ok(region) if region.len() >= min_group_size => return true,
            _ => {}
        }
    }
    false
}

/// Every distinct region of at least `min_group_size` bubbles, ordered by
/// the row-major position of their first cell.
pub fn clearable_regions(grid: &Grid, min_group_size: usize) -> Vec<Region> {
    let mut visited = vec![false; grid.rows() * grid.cols()];
    let mut regions = Vec::new();
    for pos in grid.positions() {
        if visited[grid.index(pos)] || grid.cell(pos).is_none() {
            continue;
        }
        if let Ok(region) = flood(grid, pos, &mut visited) {
            if region.len() >= min_group_size {
                regions.push(region);
            }
        }
    }
    regions
}

// =============================================================================
// Tests
// =============================================================================
