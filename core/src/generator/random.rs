use ndarray::Array2;

use super::*;

/// Purely random placement that can keep one starting cell free of mines.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    excluded: Option<Coord2>,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, excluded: Option<Coord2>) -> Self {
        Self { seed, excluded }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Result<Board> {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfiguration);
        }

        let cols_usize = usize::from(cols);
        let excluded_index = match self.excluded {
            Some((row, col)) if row < rows && col < cols => {
                Some(usize::from(row) * cols_usize + usize::from(col))
            }
            Some(_) => return Err(GameError::OutOfBounds),
            None => None,
        };

        let mut candidates: Vec<usize> = (0..usize::from(config.total_cells()))
            .filter(|&index| Some(index) != excluded_index)
            .collect();
        let mines = usize::from(config.mines);
        if mines > candidates.len() {
            log::warn!(
                "Cannot place {} mines, only {} cells are eligible",
                mines,
                candidates.len()
            );
            return Err(GameError::InvalidConfiguration);
        }

        // partial Fisher-Yates: the first `mines` candidates become the sample
        let mut rng = SmallRng::seed_from_u64(self.seed);
        for placed in 0..mines {
            let pick = rng.random_range(placed..candidates.len());
            candidates.swap(placed, pick);
        }

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for &index in &candidates[..mines] {
            mine_mask[[index / cols_usize, index % cols_usize]] = true;
        }

        let board = Board::from_mine_mask(config.size, &mine_mask);
        log::debug!(
            "Generated {}x{} board with {} mines (seed {}, excluded {:?})",
            rows,
            cols,
            board.mine_count(),
            self.seed,
            self.excluded
        );
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_cell_is_never_mined() {
        let config = GameConfig::new_unchecked((2, 2), 3);
        for seed in 0..32 {
            let board = RandomMinefieldGenerator::new(seed, Some((1, 0)))
                .generate(config)
                .unwrap();
            assert!(!board.contains_mine((1, 0)));
            assert_eq!(board.mine_count(), 3);
        }
    }

    #[test]
    fn too_many_mines_for_eligible_cells() {
        let config = GameConfig::new_unchecked((2, 2), 4);
        let generated = RandomMinefieldGenerator::new(1, Some((0, 0))).generate(config);
        assert_eq!(generated, Err(GameError::InvalidConfiguration));
    }

    #[test]
    fn full_board_without_exclusion_is_allowed() {
        let config = GameConfig::new_unchecked((2, 2), 4);
        let board = RandomMinefieldGenerator::new(1, None).generate(config).unwrap();
        assert_eq!(board.safe_cell_count(), 0);
    }

    #[test]
    fn excluded_cell_outside_board() {
        let config = GameConfig::new_unchecked((2, 2), 1);
        let generated = RandomMinefieldGenerator::new(1, Some((0, 2))).generate(config);
        assert_eq!(generated, Err(GameError::OutOfBounds));
    }
}
