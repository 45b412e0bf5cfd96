//! Game configuration.
//!
//! Every tunable the session uses lives here. The defaults reproduce the
//! browser game: an 8x8 board of six colors, groups of three or more, 60
//! seconds on level 1 shrinking by 5 seconds per level down to 15.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::grid::MAX_CELLS;

pub const DEFAULT_ROWS: usize = 8;
pub const DEFAULT_COLS: usize = 8;
pub const DEFAULT_MIN_GROUP: usize = 3;
pub const DEFAULT_POINTS_PER_CELL: u32 = 10;
pub const DEFAULT_LEVEL_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_BASE_TIME: u32 = 60;
pub const DEFAULT_TIME_DECREASE: u32 = 5;
pub const DEFAULT_MIN_TIME: u32 = 15;
pub const DEFAULT_LEVEL_SCORE_STEP: u64 = 1000;
pub const DEFAULT_MAX_LEVEL: u32 = 5;

/// Session configuration.
///
/// Deserializing fills missing fields from [`GameConfig::default`], so the
/// bindings can pass partial objects such as `{ "rows": 10 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Colors new bubbles are drawn from.
    pub palette: Vec<Color>,
    /// Smallest region a player may pop.
    pub min_group_size: usize,
    pub points_per_cell: u32,
    pub level_multiplier: f64,
    /// Seconds on the clock at level 1.
    pub base_time: u32,
    /// Seconds removed from the allowance per level.
    pub time_decrease: u32,
    /// Floor for the per-level allowance.
    pub min_time: u32,
    /// Score needed per level to advance; `None` disables level progression.
    pub level_score_step: Option<u64>,
    /// Reaching the score target on this level wins the session.
    pub max_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            palette: Color::ALL.to_vec(),
            min_group_size: DEFAULT_MIN_GROUP,
            points_per_cell: DEFAULT_POINTS_PER_CELL,
            level_multiplier: DEFAULT_LEVEL_MULTIPLIER,
            base_time: DEFAULT_BASE_TIME,
            time_decrease: DEFAULT_TIME_DECREASE,
            min_time: DEFAULT_MIN_TIME,
            level_score_step: Some(DEFAULT_LEVEL_SCORE_STEP),
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl GameConfig {
    /// Check that the configuration describes a playable session.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self
            .rows
            .checked_mul(self.cols)
            .map_or(true, |cells| cells > MAX_CELLS)
        {
            return Err(Error::InvalidConfig(format!(
                "a {}x{} grid exceeds the {MAX_CELLS} cell limit",
                self.rows, self.cols
            )));
        }
        if self.palette.is_empty() {
            return Err(Error::InvalidConfig("palette is empty".into()));
        }
        for (i, color) in self.palette.iter().enumerate() {
            if self.palette[..i].contains(color) {
                return Err(Error::InvalidConfig(format!(
                    "palette lists {color} more than once"
                )));
            }
        }
        if self.min_group_size == 0 {
            return Err(Error::InvalidConfig("min_group_size must be at least 1".into()));
        }
        if !self.level_multiplier.is_finite() || self.level_multiplier <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "level_multiplier must be positive, got {}",
                self.level_multiplier
            )));
        }
        if self.min_time == 0 || self.min_time > self.base_time {
            return Err(Error::InvalidConfig(format!(
                "min_time must be in 1..={}, got {}",
                self.base_time, self.min_time
            )));
        }
        if self.max_level == 0 {
            return Err(Error::InvalidConfig("max_level must be at least 1".into()));
        }
        if self.level_score_step == Some(0) {
            return Err(Error::InvalidConfig("level_score_step must be positive".into()));
        }
        Ok(())
    }

    /// Seconds on the clock when `level` starts.
    pub fn time_allowance(&self, level: u32) -> u32 {
        let cut = self
            .time_decrease
            .saturating_mul(level.saturating_sub(1));
        self.base_time.saturating_sub(cut).max(self.min_time)
    }

    /// Points for popping `region_size` bubbles at `level`.
    ///
    /// `floor(size * points_per_cell * level * level_multiplier)`.
    pub fn pop_score(&self, region_size: usize, level: u32) -> u64 {
        let raw = region_size as f64
            * f64::from(self.points_per_cell)
            * f64::from(level)
            * self.level_multiplier;
        raw.floor() as u64
    }

    /// Total score at which `level` is complete, if levels are enabled.
    pub fn level_target(&self, level: u32) -> Option<u64> {
        self.level_score_step
            .map(|step| step.saturating_mul(u64::from(level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rows, 8);
        assert_eq!(config.cols, 8);
        assert_eq!(config.palette.len(), 6);
        assert_eq!(config.min_group_size, 3);
    }

    #[test]
    fn test_time_allowance_steps_down_to_floor() {
        let config = GameConfig::default();
        assert_eq!(config.time_allowance(1), 60);
        assert_eq!(config.time_allowance(2), 55);
        assert_eq!(config.time_allowance(5), 40);
        assert_eq!(config.time_allowance(10), 15);
        assert_eq!(config.time_allowance(1000), 15);
    }

    #[test]
    fn test_pop_score() {
        let config = GameConfig::default();
        assert_eq!(config.pop_score(4, 2), 120);
        assert_eq!(config.pop_score(3, 1), 45);
        // floor(5 * 10 * 1 * 1.25) = floor(62.5)
        let config = GameConfig {
            level_multiplier: 1.25,
            ..GameConfig::default()
        };
        assert_eq!(config.pop_score(5, 1), 62);
    }

    #[test]
    fn test_level_target() {
        let config = GameConfig::default();
        assert_eq!(config.level_target(1), Some(1000));
        assert_eq!(config.level_target(3), Some(3000));

        let config = GameConfig {
            level_score_step: None,
            ..GameConfig::default()
        };
        assert_eq!(config.level_target(1), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            GameConfig { rows: 0, ..GameConfig::default() },
            GameConfig { rows: usize::MAX / 2, cols: 4, ..GameConfig::default() },
            GameConfig { rows: 2048, cols: 1024, ..GameConfig::default() },
            GameConfig { palette: vec![], ..GameConfig::default() },
            GameConfig {
                palette: vec![Color::Red, Color::Red],
                ..GameConfig::default()
            },
            GameConfig { min_group_size: 0, ..GameConfig::default() },
            GameConfig { level_multiplier: 0.0, ..GameConfig::default() },
            GameConfig { level_multiplier: f64::NAN, ..GameConfig::default() },
            GameConfig { min_time: 90, ..GameConfig::default() },
            GameConfig { max_level: 0, ..GameConfig::default() },
            GameConfig { level_score_step: Some(0), ..GameConfig::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"rows": 4, "palette": ["red", "blue"]}"#).unwrap();
        assert_eq!(config.rows, 4);
        assert_eq!(config.cols, DEFAULT_COLS);
        assert_eq!(config.palette, vec![Color::Red, Color::Blue]);
        assert_eq!(config.level_score_step, Some(DEFAULT_LEVEL_SCORE_STEP));
    }

    #[test]
    fn test_null_level_step_disables_levels() {
        let config: GameConfig = serde_json::from_str(r#"{"level_score_step": null}"#).unwrap();
        assert_eq!(config.level_score_step, None);
    }
}
