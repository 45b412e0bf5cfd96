//! Bubble colors.

use serde::{Deserialize, Serialize};

/// The six bubble colors of the game.
///
/// Each color has a stable index (`0..6`) used by the bindings to pass
/// boards across language boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
    Yellow = 3,
    Purple = 4,
    Orange = 5,
}

impl Color {
    /// All colors in index order.
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
    ];

    /// Convert a u8 to a Color (0=Red, ..., 5=Orange).
    /// Returns None for invalid values.
    pub fn from_u8(value: u8) -> Option<Color> {
        Self::ALL.get(value as usize).copied()
    }

    /// The stable index of this color.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Single-letter symbol used by the text board.
    pub fn symbol(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Purple => 'P',
            Color::Orange => 'O',
        }
    }

    /// Parse a symbol back into a color, case-insensitively.
    pub fn from_symbol(symbol: char) -> Option<Color> {
        Self::ALL
            .into_iter()
            .find(|c| c.symbol() == symbol.to_ascii_uppercase())
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Orange => "orange",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
