//! The bubble grid.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// Largest board the engine will allocate, in cells.
pub const MAX_CELLS: usize = 1 << 20;

/// A cell coordinate. Row 0 is the top of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

impl From<(usize, usize)> for Pos {
    fn from((row, col): (usize, usize)) -> Self {
        Pos { row, col }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A fixed-size board of bubbles.
///
/// Cells are stored as a flat vector in row-major order (indices
/// `0..cols` are row 0, and so on). `None` marks an empty cell; empties only
/// exist between a pop and the following refill.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Color>>,
}

impl Grid {
    /// An all-empty grid.
    ///
    /// Fails if either dimension is zero or the board would hold more than
    /// [`MAX_CELLS`] cells.
    pub fn empty(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidGrid(format!(
                "grid must be at least 1x1, got {rows}x{cols}"
            )));
        }
        let len = rows
            .checked_mul(cols)
            .filter(|&len| len <= MAX_CELLS)
            .ok_or_else(|| {
                Error::InvalidGrid(format!(
                    "a {rows}x{cols} grid exceeds the {MAX_CELLS} cell limit"
                ))
            })?;
        Ok(Grid {
            rows,
            cols,
            cells: vec![None; len],
        })
    }

    /// A grid with every cell drawn uniformly from `palette`.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        palette: &[Color],
        rng: &mut R,
    ) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::InvalidGrid("palette is empty".into()));
        }
        let mut grid = Grid::empty(rows, cols)?;
        for cell in grid.cells.iter_mut() {
            *cell = Some(palette[rng.gen_range(0..palette.len())]);
        }
        Ok(grid)
    }

    /// Build a grid from explicit rows, top row first.
    pub fn from_rows(rows: Vec<Vec<Option<Color>>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut grid = Grid::empty(height, width)?;
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(Error::InvalidGrid(format!(
                    "row {r} has {} cells, expected {width}",
                    row.len()
                )));
            }
            let start = r * width;
            grid.cells[start..start + width].copy_from_slice(&row);
        }
        Ok(grid)
    }

    /// Parse a grid from color symbols, one line per row.
    ///
    /// `.` is an empty cell; whitespace inside a line is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut row = Vec::new();
            for ch in line.chars().filter(|c| !c.is_whitespace()) {
                if ch == '.' {
                    row.push(None);
                } else {
                    let color = Color::from_symbol(ch).ok_or_else(|| {
                        Error::InvalidGrid(format!("unknown color symbol {ch:?}"))
                    })?;
                    row.push(Some(color));
                }
            }
            rows.push(row);
        }
        Grid::from_rows(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cells in row-major order.
    pub fn cells(&self) -> &[Option<Color>] {
        &self.cells
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Row-major index of an in-bounds position.
    #[inline]
    pub(crate) fn index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    fn check(&self, pos: Pos) -> Result<usize> {
        if self.in_bounds(pos) {
            Ok(self.index(pos))
        } else {
            Err(Error::OutOfBounds {
                row: pos.row,
                col: pos.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// The color at `pos`, or `None` if the cell is empty.
    pub fn get(&self, pos: Pos) -> Result<Option<Color>> {
        let idx = self.check(pos)?;
        Ok(self.cells[idx])
    }

    pub fn set(&mut self, pos: Pos, color: Color) -> Result<()> {
        let idx = self.check(pos)?;
        self.cells[idx] = Some(color);
        Ok(())
    }

    /// Empty every listed cell. Already-empty and out-of-range cells are
    /// left alone.
    pub fn clear<'a, I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = &'a Pos>,
    {
        for &pos in positions {
            if self.in_bounds(pos) {
                let idx = self.index(pos);
                self.cells[idx] = None;
            }
        }
    }

    /// Raw cell access for the column passes in `gravity`.
    #[inline]
    pub(crate) fn cell_mut(&mut self, pos: Pos) -> &mut Option<Color> {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    #[inline]
    pub(crate) fn cell(&self, pos: Pos) -> Option<Color> {
        self.cells[self.index(pos)]
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos { row, col }))
    }

    /// The in-bounds axis neighbours of `pos` (up, down, left, right).
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        let up = pos.row.checked_sub(1).map(|row| Pos { row, col: pos.col });
        let down = Some(Pos { row: pos.row + 1, col: pos.col });
        let left = pos.col.checked_sub(1).map(|col| Pos { row: pos.row, col });
        let right = Some(Pos { row: pos.row, col: pos.col + 1 });
        [up, down, left, right]
            .into_iter()
            .flatten()
            .filter(move |&p| self.in_bounds(p))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Cells as color indices, 255 for empty. Used by the bindings.
    pub fn to_indices(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|c| c.map_or(u8::MAX, Color::index))
            .collect()
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grid {{ rows: {}, cols: {} }}", self.rows, self.cols)?;
        for row in self.cells.chunks(self.cols) {
            for cell in row {
                write!(f, "{}", cell.map_or('.', Color::symbol))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let border = format!("+{}+", "---".repeat(self.cols));
        writeln!(f, "{border}")?;
        for row in self.cells.chunks(self.cols) {
            write!(f, "|")?;
            for cell in row {
                write!(f, " {} ", cell.map_or('.', Color::symbol))?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{border}")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_fills_every_cell_from_palette() {
        let mut rng = SmallRng::seed_from_u64(7);
        let palette = [Color::Red, Color::Blue];
        let grid = Grid::random(5, 4, &palette, &mut rng).unwrap();
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.cols(), 4);
        assert!(grid.is_full());
        assert!(grid
            .cells()
            .iter()
            .all(|c| matches!(c, Some(Color::Red) | Some(Color::Blue))));
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Grid::random(8, 8, &Color::ALL, &mut SmallRng::seed_from_u64(3)).unwrap();
        let b = Grid::random(8, 8, &Color::ALL, &mut SmallRng::seed_from_u64(3)).unwrap();
        let c = Grid::random(8, 8, &Color::ALL, &mut SmallRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(Grid::empty(0, 3), Err(Error::InvalidGrid(_))));
        assert!(matches!(Grid::from_rows(vec![]), Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert!(matches!(
            Grid::empty(usize::MAX / 2, 4),
            Err(Error::InvalidGrid(_))
        ));
        assert!(matches!(
            Grid::empty(MAX_CELLS, 2),
            Err(Error::InvalidGrid(_))
        ));
        assert_eq!(Grid::empty(MAX_CELLS, 1).unwrap().cells().len(), MAX_CELLS);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let grid = Grid::parse("RG\nBY").unwrap();
        assert_eq!(grid.get(Pos::new(1, 0)).unwrap(), Some(Color::Blue));
        assert_eq!(
            grid.get(Pos::new(2, 0)),
            Err(Error::OutOfBounds { row: 2, col: 0, rows: 2, cols: 2 })
        );
        assert!(grid.get(Pos::new(0, 2)).is_err());
    }

    #[test]
    fn test_set_and_clear() {
        let mut grid = Grid::parse("RR\nRR").unwrap();
        grid.set(Pos::new(0, 1), Color::Green).unwrap();
        assert_eq!(grid.get(Pos::new(0, 1)).unwrap(), Some(Color::Green));
        assert!(grid.set(Pos::new(5, 5), Color::Green).is_err());

        let targets = [Pos::new(0, 0), Pos::new(1, 1), Pos::new(9, 9)];
        grid.clear(&targets);
        assert_eq!(grid.empty_count(), 2);
        // Clearing again changes nothing
        grid.clear(&targets);
        assert_eq!(grid.empty_count(), 2);
        assert_eq!(grid.get(Pos::new(0, 0)).unwrap(), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![Some(Color::Red), Some(Color::Red)], vec![Some(Color::Red)]];
        assert!(matches!(Grid::from_rows(rows), Err(Error::InvalidGrid(_))));
        assert!(Grid::parse("RR\nX.").is_err());
    }

    #[test]
    fn test_neighbors() {
        let grid = Grid::empty(3, 3).unwrap();
        let corner: Vec<Pos> = grid.neighbors(Pos::new(0, 0)).collect();
        assert_eq!(corner, vec![Pos::new(1, 0), Pos::new(0, 1)]);
        assert_eq!(grid.neighbors(Pos::new(1, 1)).count(), 4);
        assert_eq!(grid.neighbors(Pos::new(2, 2)).count(), 2);
    }

    #[test]
    fn test_positions_row_major() {
        let grid = Grid::empty(2, 3).unwrap();
        let positions: Vec<Pos> = grid.positions().collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], Pos::new(0, 0));
        assert_eq!(positions[3], Pos::new(1, 0));
    }

    #[test]
    fn test_to_indices() {
        let grid = Grid::parse("R.\nGO").unwrap();
        assert_eq!(grid.to_indices(), vec![0, 255, 1, 5]);
    }

    #[test]
    fn test_display_format() {
        let grid = Grid::parse("RG\n.B").unwrap();
        let display = format!("{}", grid);
        assert!(display.contains("+------+"));
        assert!(display.contains("| R  G |"));
        assert!(display.contains("| .  B |"));
    }

    #[test]
    fn test_debug_format() {
        let grid = Grid::parse("RG\n.B").unwrap();
        let debug = format!("{:?}", grid);
        assert!(debug.contains("rows: 2"));
        assert!(debug.contains(".B"));
    }
}
