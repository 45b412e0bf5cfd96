//! # Bubble Pop Python Bindings
//!
//! This crate provides Python bindings to the Bubble Pop engine using PyO3.
//! It exposes a `Session` class for scripted play and agent training.

use bubble_pop_core::{
    Color, Error, GameConfig, Grid, Outcome, PopApplied, PopResult, Pos, RejectReason,
    Session as CoreSession, SessionSnapshot, TickResult,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};

/// Python wrapper for a Bubble Pop session.
///
/// Usage:
///     from bubble_pop import Session
///     session = Session(seed=42)
///     session.start()
///     row, col = session.hint(2)
///     result = session.select(row, col)
///     print(result)  # {'kind': 'applied', 'score_delta': 45, ...}
#[pyclass]
pub struct Session {
    inner: CoreSession,
}

#[pymethods]
impl Session {
    /// Create a new session with the given seed.
    ///
    /// Args:
    ///     seed: 64-bit seed for deterministic RNG
    ///     rows, cols: board size (default 8x8)
    ///     colors: number of bubble colors, 1-6 (default 6)
    ///     min_group_size: smallest poppable group (default 3)
    #[new]
    #[pyo3(signature = (seed, rows=None, cols=None, colors=None, min_group_size=None))]
    fn new(
        seed: u64,
        rows: Option<usize>,
        cols: Option<usize>,
        colors: Option<usize>,
        min_group_size: Option<usize>,
    ) -> PyResult<Self> {
        let defaults = GameConfig::default();
        let colors = colors.unwrap_or(Color::ALL.len());
        if colors == 0 || colors > Color::ALL.len() {
            return Err(PyValueError::new_err(format!(
                "Invalid colors: {}. Must be 1-{}.",
                colors,
                Color::ALL.len()
            )));
        }
        let config = GameConfig {
            rows: rows.unwrap_or(defaults.rows),
            cols: cols.unwrap_or(defaults.cols),
            palette: Color::ALL[..colors].to_vec(),
            min_group_size: min_group_size.unwrap_or(defaults.min_group_size),
            ..defaults
        };
        let inner = CoreSession::new(config, seed).map_err(to_py_err)?;
        Ok(Session { inner })
    }

    /// Deal the opening board and start the clock.
    ///
    /// Returns:
    ///     dict with keys: grid, score, level, time_remaining, state
    fn start(&mut self, py: Python<'_>) -> PyResult<PyObject> {
        let snapshot = self.inner.start().map_err(to_py_err)?;
        snapshot_dict(py, &snapshot)
    }

    /// Start on an explicit board.
    ///
    /// Args:
    ///     rows: list of strings, one per row, using R G B Y P O
    fn start_with_grid(&mut self, py: Python<'_>, rows: Vec<String>) -> PyResult<PyObject> {
        let grid = Grid::parse(&rows.join("\n")).map_err(to_py_err)?;
        let snapshot = self.inner.start_with_grid(grid).map_err(to_py_err)?;
        snapshot_dict(py, &snapshot)
    }

    /// Select the bubble at (row, col).
    ///
    /// Returns:
    ///     dict with key `kind` set to "rejected", "applied" or "session_ended"
    fn select(&mut self, py: Python<'_>, row: usize, col: usize) -> PyResult<PyObject> {
        let result = self
            .inner
            .select(Pos::new(row, col))
            .map_err(to_py_err)?;
        pop_result_dict(py, &result)
    }

    /// Take one second off the clock.
    ///
    /// Returns:
    ///     dict with key `kind` set to "running" or "session_ended"
    fn tick(&mut self, py: Python<'_>) -> PyResult<PyObject> {
        let result = self.inner.tick().map_err(to_py_err)?;
        tick_result_dict(py, &result)
    }

    /// Take several seconds off the clock, stopping if the session ends.
    fn advance(&mut self, py: Python<'_>, seconds: u32) -> PyResult<PyObject> {
        let result = self.inner.advance(seconds).map_err(to_py_err)?;
        tick_result_dict(py, &result)
    }

    /// Go back to the not-started state with a new seed.
    fn reset(&mut self, seed: u64) {
        self.inner.reset(seed);
    }

    /// Suggest a cell to pop as (row, col), or None if there is no move.
    #[pyo3(signature = (depth=2))]
    fn hint(&self, depth: usize) -> Option<(usize, usize)> {
        self.inner.hint(depth).map(|pos| (pos.row, pos.col))
    }

    /// Get the current board as rows of color indices (None = empty).
    ///
    /// Returns an empty list before the session starts.
    fn grid(&self) -> Vec<Vec<Option<u8>>> {
        self.inner.grid().map(grid_rows).unwrap_or_default()
    }

    /// Get the current score.
    fn score(&self) -> u64 {
        self.inner.score()
    }

    /// Get the current level.
    fn level(&self) -> u32 {
        self.inner.level()
    }

    /// Get the seconds left on the clock.
    fn time_remaining(&self) -> u32 {
        self.inner.time_remaining()
    }

    /// Get the session state: "not_started", "running", "won" or "lost".
    fn state(&self) -> &'static str {
        self.inner.state().as_str()
    }

    /// Check whether any region can still be popped.
    fn has_legal_move(&self) -> bool {
        self.inner.has_legal_move()
    }

    fn __repr__(&self) -> String {
        format!(
            "Session(score={}, level={}, time_remaining={}, state={})",
            self.inner.score(),
            self.inner.level(),
            self.inner.time_remaining(),
            self.inner.state().as_str()
        )
    }

    fn __str__(&self) -> String {
        format!("{}", self.inner)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Caller mistakes become `ValueError`; calls in the wrong session state
/// become `RuntimeError`.
fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::SessionNotRunning { .. } | Error::AlreadyStarted => {
            PyRuntimeError::new_err(err.to_string())
        }
        Error::OutOfBounds { .. }
        | Error::EmptyOrigin { .. }
        | Error::InvalidConfig(_)
        | Error::InvalidGrid(_) => PyValueError::new_err(err.to_string()),
    }
}

fn outcome_name(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Won => "won",
        Outcome::Lost => "lost",
    }
}

fn grid_rows(grid: &Grid) -> Vec<Vec<Option<u8>>> {
    grid.cells()
        .chunks(grid.cols())
        .map(|row| row.iter().map(|cell| cell.map(Color::index)).collect())
        .collect()
}

fn snapshot_dict(py: Python<'_>, snapshot: &SessionSnapshot) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    add_snapshot(dict, snapshot)?;
    Ok(dict.into())
}

fn add_snapshot(dict: &PyDict, snapshot: &SessionSnapshot) -> PyResult<()> {
    let grid = snapshot.grid.as_ref().map(grid_rows).unwrap_or_default();
    dict.set_item("grid", grid)?;
    dict.set_item("score", snapshot.score)?;
    dict.set_item("level", snapshot.level)?;
    dict.set_item("time_remaining", snapshot.time_remaining)?;
    dict.set_item("state", snapshot.state.as_str())?;
    Ok(())
}

fn add_pop(dict: &PyDict, pop: &PopApplied) -> PyResult<()> {
    let cleared: Vec<(usize, usize)> = pop.cleared.iter().map(|p| (p.row, p.col)).collect();
    dict.set_item("cleared", cleared)?;
    dict.set_item("grid", grid_rows(&pop.grid))?;
    dict.set_item("score_delta", pop.score_delta)?;
    dict.set_item("level_changed", pop.level_changed)?;
    Ok(())
}

fn pop_result_dict(py: Python<'_>, result: &PopResult) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    match result {
        PopResult::Rejected(RejectReason::TooSmall { size, required }) => {
            dict.set_item("kind", "rejected")?;
            dict.set_item("reason", "too_small")?;
            dict.set_item("size", *size)?;
            dict.set_item("required", *required)?;
        }
        PopResult::Rejected(RejectReason::EmptyCell) => {
            dict.set_item("kind", "rejected")?;
            dict.set_item("reason", "empty_cell")?;
        }
        PopResult::Applied(pop) => {
            dict.set_item("kind", "applied")?;
            add_pop(dict, pop)?;
        }
        PopResult::SessionEnded { outcome, pop } => {
            dict.set_item("kind", "session_ended")?;
            dict.set_item("outcome", outcome_name(*outcome))?;
            add_pop(dict, pop)?;
        }
    }
    Ok(dict.into())
}

fn tick_result_dict(py: Python<'_>, result: &TickResult) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    match result {
        TickResult::Running(snapshot) => {
            dict.set_item("kind", "running")?;
            add_snapshot(dict, snapshot)?;
        }
        TickResult::SessionEnded { outcome } => {
            dict.set_item("kind", "session_ended")?;
            dict.set_item("outcome", outcome_name(*outcome))?;
        }
    }
    Ok(dict.into())
}

/// Color index constants for convenience.
#[pyclass]
struct Colors;

#[pymethods]
impl Colors {
    #[classattr]
    const RED: u8 = 0;
    #[classattr]
    const GREEN: u8 = 1;
    #[classattr]
    const BLUE: u8 = 2;
    #[classattr]
    const YELLOW: u8 = 3;
    #[classattr]
    const PURPLE: u8 = 4;
    #[classattr]
    const ORANGE: u8 = 5;
}

/// Python module for the Bubble Pop game.
#[pymodule]
fn bubble_pop(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<Session>()?;
    m.add_class::<Colors>()?;
    Ok(())
}
