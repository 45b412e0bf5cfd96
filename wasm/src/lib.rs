//! # Bubble Pop WebAssembly Bindings
//!
//! This crate provides JavaScript-friendly bindings to the Bubble Pop engine
//! using wasm-bindgen. It wraps a core [`Session`] and exposes a class-like API
//! suitable for driving the browser page. The page owns the one-second
//! interval and calls `tick`; the engine never reads a clock.

use bubble_pop_core::{GameConfig, PopResult, Pos, Session};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Result of a `select` call, serialized for JavaScript.
#[derive(Serialize)]
pub struct JsSelectResult {
    /// The board after the selection (row-major color indices, 255 = empty).
    pub grid: Vec<u8>,
    /// Current total score.
    pub score: u64,
    /// Current level.
    pub level: u32,
    /// Seconds left on the clock.
    pub time_remaining: u32,
    /// The detailed result: `rejected`, `applied` or `session_ended`.
    pub result: PopResult,
}

/// WebAssembly wrapper for a Bubble Pop session.
#[wasm_bindgen]
pub struct WasmSession {
    session: Session,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a new session with the given seed.
    ///
    /// `config` is an optional object with any subset of the `GameConfig`
    /// fields, using their snake_case names (`rows`, `palette`,
    /// `min_group_size`). Missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, config: JsValue) -> Result<WasmSession, JsError> {
        let config: GameConfig = if config.is_undefined() || config.is_null() {
            GameConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(WasmSession {
            session: Session::new(config, seed)?,
        })
    }

    /// Deal the opening board and start the clock.
    ///
    /// Returns the session snapshot.
    pub fn start(&mut self) -> Result<JsValue, JsError> {
        let snapshot = self.session.start()?;
        Ok(serde_wasm_bindgen::to_value(&snapshot)?)
    }

    /// Select the bubble at `(row, col)`.
    ///
    /// Returns an object containing:
    /// - grid: color indices with 255 for empty cells
    /// - score, level, time_remaining
    /// - result: `{ kind: "rejected" | "applied" | "session_ended", ... }`
    pub fn select(&mut self, row: usize, col: usize) -> Result<JsValue, JsError> {
        let result = self.session.select(Pos::new(row, col))?;
        let js_result = JsSelectResult {
            grid: self.get_grid(),
            score: self.session.score(),
            level: self.session.level(),
            time_remaining: self.session.time_remaining(),
            result,
        };
        Ok(serde_wasm_bindgen::to_value(&js_result)?)
    }

    /// Take one second off the clock.
    ///
    /// Returns `{ kind: "running", ... }` with the snapshot or
    /// `{ kind: "session_ended", outcome: "lost" }`.
    pub fn tick(&mut self) -> Result<JsValue, JsError> {
        let result = self.session.tick()?;
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }

    /// Go back to the not-started state with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.session.reset(seed);
    }

    /// Get the current board as color indices (row-major, 255 = empty).
    ///
    /// Empty before the session starts.
    #[wasm_bindgen(js_name = getGrid)]
    pub fn get_grid(&self) -> Vec<u8> {
        self.session
            .grid()
            .map(|grid| grid.to_indices())
            .unwrap_or_default()
    }

    /// Get the number of board rows.
    #[wasm_bindgen(js_name = getRows)]
    pub fn get_rows(&self) -> usize {
        self.session.config().rows
    }

    /// Get the number of board columns.
    #[wasm_bindgen(js_name = getCols)]
    pub fn get_cols(&self) -> usize {
        self.session.config().cols
    }

    /// Get the current score.
    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u64 {
        self.session.score()
    }

    /// Get the current level.
    #[wasm_bindgen(js_name = getLevel)]
    pub fn get_level(&self) -> u32 {
        self.session.level()
    }

    /// Get the seconds left on the clock.
    #[wasm_bindgen(js_name = getTimeRemaining)]
    pub fn get_time_remaining(&self) -> u32 {
        self.session.time_remaining()
    }

    /// Get the session state: `not_started`, `running`, `won` or `lost`.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        self.session.state().as_str().to_string()
    }

    /// Suggest a cell to pop as `[row, col]`, or `undefined` if none.
    pub fn hint(&self, depth: usize) -> Option<Vec<u32>> {
        self.session
            .hint(depth)
            .map(|pos| vec![pos.row as u32, pos.col as u32])
    }
}

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
