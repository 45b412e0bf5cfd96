//! Shared proptest strategies.

use proptest::prelude::*;

use crate::color::Color;
use crate::grid::Grid;

/// Grids up to 7x7 over three colors, with roughly one cell in seven empty.
pub(crate) fn arb_grid() -> impl Strategy<Value = Grid> {
    arb_grid_with(0.85)
}

/// Grids up to 7x7 over three colors with no empty cells.
pub(crate) fn arb_full_grid() -> impl Strategy<Value = Grid> {
    arb_grid_with(1.0)
}

fn arb_grid_with(fill: f64) -> impl Strategy<Value = Grid> {
    (1usize..8, 1usize..8).prop_flat_map(move |(rows, cols)| {
        prop::collection::vec(
            prop::option::weighted(fill, (0usize..3).prop_map(|i| Color::ALL[i])),
            rows * cols,
        )
        .prop_map(move |cells| {
            Grid::from_rows(cells.chunks(cols).map(<[_]>::to_vec).collect())
                .expect("generated rows are rectangular")
        })
    })
}

/// A two-color checkerboard: no two neighbours share a color.
pub(crate) fn checkerboard(rows: usize, cols: usize) -> Grid {
    let cells = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| Some(if (r + c) % 2 == 0 { Color::Red } else { Color::Blue }))
                .collect()
        })
        .collect();
    Grid::from_rows(cells).expect("checkerboard dimensions are non-zero")
}
