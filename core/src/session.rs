//! Timed game sessions.
//!
//! A [`Session`] owns the grid, the score, the level clock and the seeded
//! random source. Every operation runs to completion before returning: a pop
//! clears, collapses, refills and re-checks for deadlock on a working copy
//! and publishes the new grid in one step.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Serialize, Serializer};

use crate::config::GameConfig;
use crate::deadlock::has_legal_move;
use crate::error::{Error, Result};
use crate::gravity::collapse_and_refill;
use crate::grid::{Grid, Pos};
use crate::region::{find_region, Region};
use crate::solver;

/// Attempts at dealing an opening board that has at least one move.
const MAX_DEAL_ATTEMPTS: usize = 100;

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// No moves remained after a pop, or the final level's target was hit.
    Won,
    /// The clock ran out.
    Lost,
}

/// Where a session is in its lifecycle.
///
/// Serializes as a single string: `"not_started"`, `"running"`, `"won"` or
/// `"lost"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotStarted,
    Running,
    Ended(Outcome),
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::NotStarted => "not_started",
            SessionState::Running => "running",
            SessionState::Ended(Outcome::Won) => "won",
            SessionState::Ended(Outcome::Lost) => "lost",
        }
    }
}

impl Serialize for SessionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::NotStarted => f.write_str("not started"),
            SessionState::Running => f.write_str("running"),
            SessionState::Ended(Outcome::Won) => f.write_str("ended (won)"),
            SessionState::Ended(Outcome::Lost) => f.write_str("ended (lost)"),
        }
    }
}

/// Why a selection was refused. Nothing changes when a pop is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The region is below the minimum group size.
    TooSmall { size: usize, required: usize },
    /// The selected cell holds no bubble.
    EmptyCell,
}

/// A pop that went through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopApplied {
    /// Cells removed, in their pre-collapse positions.
    pub cleared: Region,
    /// The board after collapse and refill.
    pub grid: Grid,
    pub score_delta: u64,
    pub level_changed: bool,
}

/// Result of selecting a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopResult {
    Rejected(RejectReason),
    Applied(PopApplied),
    /// The pop was applied and finished the session.
    SessionEnded { outcome: Outcome, pop: PopApplied },
}

/// Result of advancing the clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickResult {
    Running(SessionSnapshot),
    SessionEnded { outcome: Outcome },
}

/// Read-only view for renderers and HUDs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// `None` before the session starts.
    pub grid: Option<Grid>,
    pub score: u64,
    pub level: u32,
    pub time_remaining: u32,
    pub state: SessionState,
}

/// One timed play-through.
#[derive(Clone)]
pub struct Session {
    config: GameConfig,
    rng: SmallRng,
    state: SessionState,
    grid: Option<Grid>,
    score: u64,
    level: u32,
    time_remaining: u32,
}

impl Session {
    /// Create a session in the `NotStarted` state.
    ///
    /// The seed drives both the opening board and every refill, so the same
    /// seed and the same inputs replay the same game.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, seed))
    }

    /// A session with the default configuration.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(GameConfig::default(), seed)
    }

    /// Deal a fresh board and start the clock.
    ///
    /// Boards without a single legal move are redealt a bounded number of
    /// times; the last deal is kept regardless.
    pub fn start(&mut self) -> Result<SessionSnapshot> {
        self.ensure_not_started()?;
        let mut grid = self.deal()?;
        for _ in 1..MAX_DEAL_ATTEMPTS {
            if has_legal_move(&grid, self.config.min_group_size) {
                break;
            }
            grid = self.deal()?;
        }
        self.begin(grid);
        Ok(self.snapshot())
    }

    /// Start on a caller-provided board instead of a random one.
    ///
    /// The board must match the configured dimensions and be full.
    pub fn start_with_grid(&mut self, grid: Grid) -> Result<SessionSnapshot> {
        self.ensure_not_started()?;
        if grid.rows() != self.config.rows || grid.cols() != self.config.cols {
            return Err(Error::InvalidGrid(format!(
                "expected {}x{}, got {}x{}",
                self.config.rows,
                self.config.cols,
                grid.rows(),
                grid.cols()
            )));
        }
        if !grid.is_full() {
            return Err(Error::InvalidGrid("starting grid has empty cells".into()));
        }
        self.begin(grid);
        Ok(self.snapshot())
    }

    /// Select the bubble at `pos` and pop its region if it is big enough.
    pub fn select(&mut self, pos: Pos) -> Result<PopResult> {
        let grid = self.running_grid()?;
        let region = match find_region(grid, pos) {
            Ok(region) => region,
            Err(Error::EmptyOrigin { .. }) => {
                return Ok(PopResult::Rejected(RejectReason::EmptyCell));
            }
            Err(e) => return Err(e),
        };

        let required = self.config.min_group_size;
        if region.len() < required {
            log::debug!("rejected pop at {pos}: region of {} < {required}", region.len());
            return Ok(PopResult::Rejected(RejectReason::TooSmall {
                size: region.len(),
                required,
            }));
        }

        let mut next = grid.clone();
        next.clear(&region);
        collapse_and_refill(&mut next, &self.config.palette, &mut self.rng);

        let score_delta = self.config.pop_score(region.len(), self.level);
        self.score += score_delta;
        log::debug!(
            "popped {} bubbles at {pos} for {score_delta} points (score {})",
            region.len(),
            self.score
        );

        let (level_changed, cleared_all_levels) = self.advance_levels();
        let deadlocked = !has_legal_move(&next, self.config.min_group_size);
        self.grid = Some(next.clone());

        let pop = PopApplied {
            cleared: region,
            grid: next,
            score_delta,
            level_changed,
        };

        if cleared_all_levels || deadlocked {
            self.end(Outcome::Won);
            return Ok(PopResult::SessionEnded {
                outcome: Outcome::Won,
                pop,
            });
        }
        Ok(PopResult::Applied(pop))
    }

    /// Take one second off the clock. Hitting zero loses the session.
    pub fn tick(&mut self) -> Result<TickResult> {
        self.ensure_running()?;
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.end(Outcome::Lost);
            return Ok(TickResult::SessionEnded {
                outcome: Outcome::Lost,
            });
        }
        Ok(TickResult::Running(self.snapshot()))
    }

    /// Apply `seconds` ticks, stopping early if the session ends.
    pub fn advance(&mut self, seconds: u32) -> Result<TickResult> {
        self.ensure_running()?;
        for _ in 0..seconds {
            if let ended @ TickResult::SessionEnded { .. } = self.tick()? {
                return Ok(ended);
            }
        }
        Ok(TickResult::Running(self.snapshot()))
    }

    /// Throw the session away and go back to `NotStarted` with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
        self.state = SessionState::NotStarted;
        self.grid = None;
        self.score = 0;
        self.level = 1;
        self.time_remaining = self.config.time_allowance(1);
    }

    /// Suggest a cell to pop, looking `depth` pops ahead.
    ///
    /// Returns `None` when the session is not running or no move exists.
    pub fn hint(&self, depth: usize) -> Option<Pos> {
        let grid = self.running_grid().ok()?;
        solver::find_best_move(grid, self.config.min_group_size, depth)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            grid: self.grid.clone(),
            score: self.score,
            level: self.level,
            time_remaining: self.time_remaining,
            state: self.state,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The board, once the session has started.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Whether any poppable region remains. False outside a running session.
    pub fn has_legal_move(&self) -> bool {
        self.running_grid()
            .map_or(false, |grid| has_legal_move(grid, self.config.min_group_size))
    }

    // -------------------------------------------------------------------------
    // Private methods
    // -------------------------------------------------------------------------

    fn build(config: GameConfig, seed: u64) -> Self {
        let time_remaining = config.time_allowance(1);
        Session {
            config,
            rng: SmallRng::seed_from_u64(seed),
            state: SessionState::NotStarted,
            grid: None,
            score: 0,
            level: 1,
            time_remaining,
        }
    }

    fn deal(&mut self) -> Result<Grid> {
        Grid::random(
            self.config.rows,
            self.config.cols,
            &self.config.palette,
            &mut self.rng,
        )
    }

    fn begin(&mut self, grid: Grid) {
        self.grid = Some(grid);
        self.score = 0;
        self.level = 1;
        self.time_remaining = self.config.time_allowance(1);
        self.state = SessionState::Running;
        log::info!(
            "session started on a {}x{} board with {}s on the clock",
            self.config.rows,
            self.config.cols,
            self.time_remaining
        );
    }

    fn end(&mut self, outcome: Outcome) {
        self.state = SessionState::Ended(outcome);
        log::info!(
            "session {:?} at level {} with score {}",
            outcome,
            self.level,
            self.score
        );
    }

    /// Move up through every level target the score has reached.
    ///
    /// Returns `(level_changed, cleared_final_level)`. Each new level resets
    /// the clock to that level's allowance.
    fn advance_levels(&mut self) -> (bool, bool) {
        let mut changed = false;
        while let Some(target) = self.config.level_target(self.level) {
            if self.score < target {
                break;
            }
            if self.level >= self.config.max_level {
                return (changed, true);
            }
            self.level += 1;
            self.time_remaining = self.config.time_allowance(self.level);
            changed = true;
            log::info!(
                "reached level {} with {}s on the clock",
                self.level,
                self.time_remaining
            );
        }
        (changed, false)
    }

    fn ensure_not_started(&self) -> Result<()> {
        if self.state == SessionState::NotStarted {
            Ok(())
        } else {
            Err(Error::AlreadyStarted)
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.state == SessionState::Running {
            Ok(())
        } else {
            Err(Error::SessionNotRunning { state: self.state })
        }
    }

    fn running_grid(&self) -> Result<&Grid> {
        self.ensure_running()?;
        self.grid
            .as_ref()
            .ok_or(Error::SessionNotRunning { state: self.state })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Session {{ state: {:?}, score: {}, level: {}, time_remaining: {} }}",
            self.state, self.score, self.level, self.time_remaining
        )?;
        if let Some(grid) = &self.grid {
            write!(f, "{:?}", grid)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Score: {}  Level: {}  Time: {}",
            self.score, self.level, self.time_remaining
        )?;
        match &self.grid {
            Some(grid) => write!(f, "{}", grid),
            None => writeln!(f, "(not started)"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
