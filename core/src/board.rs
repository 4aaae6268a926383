use core::ops::Index;
use ndarray::Array2;

use crate::*;

/// Mine layout plus the adjacency counts derived from it.
///
/// The counts are computed once when the board is built; there is no way to
/// move a mine afterwards, so they can never go stale.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    tiles: Array2<Tile>,
    size: Coord2,
    mine_count: CellCount,
}

impl Board {
    /// Places `config.mines` mines uniformly at random, never on `excluded`.
    pub fn generate(config: GameConfig, excluded: Option<Coord2>, seed: u64) -> Result<Self> {
        RandomMinefieldGenerator::new(seed, excluded).generate(config)
    }

    /// Fails unless at least one mine and one safe cell remain.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidConfiguration);
        }

        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::OutOfBounds);
            }
            let slot = &mut mine_mask[coords.to_nd_index()];
            if *slot {
                return Err(GameError::InvalidConfiguration);
            }
            *slot = true;
        }

        let board = Self::from_mine_mask(size, &mine_mask);
        board.game_config().validate()?;
        Ok(board)
    }

    /// `mine_mask` must have shape `size`.
    pub(crate) fn from_mine_mask(size: Coord2, mine_mask: &Array2<bool>) -> Self {
        let mut tiles: Array2<Tile> = Array2::default(size.to_nd_index());
        let mut mine_count: CellCount = 0;

        let (rows, cols) = size;
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                tiles[coords.to_nd_index()] = if mine_mask[coords.to_nd_index()] {
                    mine_count += 1;
                    Tile::Mine
                } else {
                    let adjacent = mine_mask
                        .iter_neighbors(coords)
                        .filter(|&pos| mine_mask[pos.to_nd_index()])
                        .count();
                    Tile::Clear(adjacent as u8)
                };
            }
        }

        Self {
            tiles,
            size,
            mine_count,
        }
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size, self.mine_count)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size.0 && coords.1 < self.size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn tile_at(&self, coords: Coord2) -> Option<Tile> {
        self.tiles.get(coords.to_nd_index()).copied()
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self.tile_at(coords).is_some_and(Tile::is_mine)
    }

    /// Adjacency count of a safe cell; `None` for mines and out-of-bounds cells.
    pub fn adjacent_mines(&self, coords: Coord2) -> Option<u8> {
        self.tile_at(coords).and_then(Tile::adjacent_mines)
    }

    /// Mine positions in row-major order.
    pub fn mine_coords(&self) -> Vec<Coord2> {
        self.coords().filter(|&pos| self[pos].is_mine()).collect()
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (rows, cols) = self.size;
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size)
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.tiles[coords.to_nd_index()]
    }
}
