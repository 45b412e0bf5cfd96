//! Engine errors.

use crate::session::SessionState;

/// Errors returned by the engine.
///
/// None of these are fatal: the caller recovers by choosing another action
/// or resetting the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("cell ({row}, {col}) is empty")]
    EmptyOrigin { row: usize, col: usize },
    #[error("session is not running (state: {state})")]
    SessionNotRunning { state: SessionState },
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
