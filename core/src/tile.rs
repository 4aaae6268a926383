use serde::{Deserialize, Serialize};

/// What a board position holds, independent of what the player has seen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Mine,
    /// Safe tile with the number of mines in its Moore neighbourhood.
    Clear(u8),
}

impl Tile {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn adjacent_mines(self) -> Option<u8> {
        match self {
            Self::Mine => None,
            Self::Clear(count) => Some(count),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Clear(0)
    }
}

/// Canonical player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Revealed,
    Flagged,
    /// The mine that ended the game.
    Exploded,
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}
