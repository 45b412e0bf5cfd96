//! # Bubble Pop Core Engine
//!
//! A pure Rust implementation of the Bubble Pop puzzle: a grid of colored
//! bubbles where clicking a group of three or more same-colored neighbours
//! pops it, the bubbles above fall into the gap and fresh bubbles drop in
//! from the top. Sessions are timed, scored per level, and driven by a
//! seedable PRNG so every game can be replayed exactly.
//!
//! The grid operations are free functions over a borrowed [`Grid`]:
//! [`find_region`], [`collapse`], [`refill`] and [`has_legal_move`]. The
//! [`Session`] type strings them together into a game.
//!
//! ## Example
//!
//! ```rust
//! use bubble_pop_core::{GameConfig, PopResult, Session};
//!
//! let mut session = Session::new(GameConfig::default(), 42).unwrap();
//! session.start().unwrap();
//!
//! if let Some(pos) = session.hint(2) {
//!     match session.select(pos).unwrap() {
//!         PopResult::Applied(pop) => println!("+{} points", pop.score_delta),
//!         other => println!("{:?}", other),
//!     }
//! }
//! if session.is_running() {
//!     session.tick().unwrap();
//! }
//! println!("Score: {}, Time: {}", session.score(), session.time_remaining());
//! ```

pub mod color;
pub mod config;
pub mod deadlock;
pub mod error;
pub mod gravity;
pub mod grid;
pub mod region;
pub mod session;
pub mod solver;

#[cfg(test)]
mod testing;

pub use color::Color;
pub use config::GameConfig;
pub use deadlock::{clearable_regions, has_legal_move};
pub use error::{Error, Result};
pub use gravity::{collapse, collapse_and_refill, refill};
pub use grid::{Grid, Pos};
pub use region::{find_region, Region};
pub use session::{
    Outcome, PopApplied, PopResult, RejectReason, Session, SessionSnapshot, SessionState,
    TickResult,
};
