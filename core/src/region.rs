//! Connected same-color regions.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::grid::{Grid, Pos};

/// A set of 4-connected cells sharing one color.
pub type Region = BTreeSet<Pos>;

/// Find the region containing `origin`.
///
/// Iterative depth-first flood fill with an explicit stack, so stack usage
/// does not depend on the grid size. Each cell is visited at most once.
///
/// Fails with `OutOfBounds` for a bad origin and `EmptyOrigin` when the
/// origin cell has no bubble.
pub fn find_region(grid: &Grid, origin: Pos) -> Result<Region> {
    let mut visited = vec![false; grid.rows() * grid.cols()];
    flood(grid, origin, &mut visited)
}

/// Flood fill from `origin`, marking cells in a caller-owned bitmap.
///
/// Sharing the bitmap across calls lets a full-board scan compute each
/// region once. Cells already marked are never revisited.
pub(crate) fn flood(grid: &Grid, origin: Pos, visited: &mut [bool]) -> Result<Region> {
    let color = grid.get(origin)?.ok_or(Error::EmptyOrigin {
        row: origin.row,
        col: origin.col,
    })?;

    let mut region = Region::new();
    let mut stack = vec![origin];
    visited[grid.index(origin)] = true;
    region.insert(origin);

    while let Some(pos) = stack.pop() {
        for next in grid.neighbors(pos) {
            let idx = grid.index(next);
            if !visited[idx] && grid.cell(next) == Some(color) {
                visited[idx] = true;
                region.insert(next);
                stack.push(next);
            }
        }
    }

    Ok(region)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::testing::arb_grid;
    use proptest::prelude::*;

    fn positions(list: &[(usize, usize)]) -> Region {
        list.iter().map(|&p| Pos::from(p)).collect()
    }

    #[test]
    fn test_single_cell_region() {
        let grid = Grid::parse("RG\nGR").unwrap();
        let region = find_region(&grid, Pos::new(0, 0)).unwrap();
        assert_eq!(region, positions(&[(0, 0)]));
    }

    #[test]
    fn test_top_row_region() {
        let grid = Grid::parse("RRR\nGGG\nRRR").unwrap();
        let region = find_region(&grid, Pos::new(0, 0)).unwrap();
        assert_eq!(region, positions(&[(0, 0), (0, 1), (0, 2)]));
    }

    #[test]
    fn test_diagonals_do_not_connect() {
        let grid = Grid::parse("RG\nGR").unwrap();
        let region = find_region(&grid, Pos::new(1, 1)).unwrap();
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_winding_region() {
        let grid = Grid::parse(
            "
            BBBB
            GGGB
            BBGB
            BGGB
            BBBB
            ",
        )
        .unwrap();
        let region = find_region(&grid, Pos::new(2, 0)).unwrap();
        // The blue ring wraps around the green block
        assert_eq!(region.len(), 14);
        assert!(region.contains(&Pos::new(0, 0)));
        assert!(region.contains(&Pos::new(2, 1)));
        assert!(!region.contains(&Pos::new(1, 0)));
    }

    #[test]
    fn test_cycle_terminates() {
        let grid = Grid::parse("RRR\nRGR\nRRR").unwrap();
        let region = find_region(&grid, Pos::new(0, 0)).unwrap();
        assert_eq!(region.len(), 8);
        assert!(!region.contains(&Pos::new(1, 1)));
    }

    #[test]
    fn test_empty_cells_break_regions() {
        let grid = Grid::parse("R.R\nGGG").unwrap();
        let region = find_region(&grid, Pos::new(0, 0)).unwrap();
        assert_eq!(region, positions(&[(0, 0)]));
    }

    #[test]
    fn test_empty_origin() {
        let grid = Grid::parse("R.R").unwrap();
        assert_eq!(
            find_region(&grid, Pos::new(0, 1)),
            Err(Error::EmptyOrigin { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_out_of_bounds_origin() {
        let grid = Grid::parse("RR").unwrap();
        assert!(matches!(
            find_region(&grid, Pos::new(3, 0)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_large_monochrome_grid() {
        // Deep enough that a recursive fill would be risky.
        let rows = vec![vec![Some(Color::Red); 300]; 300];
        let grid = Grid::from_rows(rows).unwrap();
        let region = find_region(&grid, Pos::new(150, 150)).unwrap();
        assert_eq!(region.len(), 300 * 300);
    }

    #[test]
    fn test_does_not_mutate_grid() {
        let grid = Grid::parse("RRG\nRGG").unwrap();
        let before = grid.clone();
        find_region(&grid, Pos::new(0, 0)).unwrap();
        assert_eq!(grid, before);
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_region_is_connected_same_color(
            grid in arb_grid(),
            r in 0usize..8,
            c in 0usize..8,
        ) {
            let origin = Pos::new(r % grid.rows(), c % grid.cols());
            match grid.get(origin).unwrap() {
                None => prop_assert!(find_region(&grid, origin).is_err()),
                Some(color) => {
                    let region = find_region(&grid, origin).unwrap();
                    prop_assert!(region.contains(&origin));
                    for &pos in &region {
                        prop_assert!(grid.in_bounds(pos));
                        prop_assert_eq!(grid.get(pos).unwrap(), Some(color));
                    }
                    // Maximal: no same-colored neighbour is left out
                    for &pos in &region {
                        for next in grid.neighbors(pos) {
                            if grid.get(next).unwrap() == Some(color) {
                                prop_assert!(region.contains(&next));
                            }
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_region_is_same_from_any_member(
            grid in arb_grid(),
            r in 0usize..8,
            c in 0usize..8,
        ) {
            let origin = Pos::new(r % grid.rows(), c % grid.cols());
            if let Ok(region) = find_region(&grid, origin) {
                for &member in &region {
                    prop_assert_eq!(&find_region(&grid, member).unwrap(), &region);
                }
            }
        }
    }
}
