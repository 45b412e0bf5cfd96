//! Gravity collapse and refill.
//!
//! After a pop the surviving bubbles fall straight down inside their column,
//! keeping their relative order, and the holes left at the top of each
//! column are filled with fresh random bubbles.

use rand::Rng;

use crate::color::Color;
use crate::grid::{Grid, Pos};

/// Compact every column toward the bottom row.
///
/// Returns the number of bubbles that moved. Collapsing a grid with no
/// holes below a bubble is a no-op, so the operation is idempotent.
pub fn collapse(grid: &mut Grid) -> usize {
    let mut moved = 0;
    for col in 0..grid.cols() {
        moved += collapse_column(grid, col);
    }
    moved
}

/// Scan bottom-up with a write cursor; every bubble lands on the lowest
/// free slot and the cursor climbs one row.
fn collapse_column(grid: &mut Grid, col: usize) -> usize {
    let mut moved = 0;
    let mut write_row = grid.rows();
    for row in (0..grid.rows()).rev() {
        let Some(color) = grid.cell(Pos { row, col }) else {
            continue;
        };
        write_row -= 1;
        if write_row != row {
            *grid.cell_mut(Pos { row: write_row, col }) = Some(color);
            *grid.cell_mut(Pos { row, col }) = None;
            moved += 1;
        }
    }
    moved
}

/// Give every empty cell an independently drawn palette color.
///
/// Cells are filled in row-major order, so a seeded generator always
/// produces the same board. Returns the number of cells filled.
pub fn refill<R: Rng + ?Sized>(grid: &mut Grid, palette: &[Color], rng: &mut R) -> usize {
    if palette.is_empty() {
        return 0;
    }
    let mut filled = 0;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let cell = grid.cell_mut(Pos { row, col });
            if cell.is_none() {
                *cell = Some(palette[rng.gen_range(0..palette.len())]);
                filled += 1;
            }
        }
    }
    filled
}

/// Collapse, then refill. Leaves the grid full.
pub fn collapse_and_refill<R: Rng + ?Sized>(
    grid: &mut Grid,
    palette: &[Color],
    rng: &mut R,
) -> usize {
    let moved = collapse(grid);
    let filled = refill(grid, palette, rng);
    log::debug!("collapse moved {moved} bubbles, refill added {filled}");
    filled
}

// =============================================================================
// Tests
// =============================================================================
