use chrono::prelude::*;
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::*;

/// Valid transitions:
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Playing
    }
}

/// What a single reveal did to the session.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealResult {
    pub outcome: RevealOutcome,
    pub status: GameStatus,
    /// Every cell whose state changed, in the order it changed.
    pub changed: Vec<Coord2>,
}

/// Represents a game from start to finish.
///
/// Mines are not placed until the first reveal, and never under the cell being
/// revealed, so the first click is always safe.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    config: GameConfig,
    seed: u64,
    board: Option<Board>,
    cells: Array2<CellState>,
    flags_placed: Saturating<CellCount>,
    revealed_count: Saturating<CellCount>,
    status: GameStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    turn_count: u32,
    triggered_mine: Option<Coord2>,
}

impl GameSession {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        Self::new_at(config, seed, Utc::now())
    }

    pub fn new_at(config: GameConfig, seed: u64, now: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        Ok(Self::blank(config, seed, None, now))
    }

    /// Starts a game on a fixed board, skipping first-click placement.
    pub fn with_board(board: Board) -> Result<Self> {
        Self::with_board_at(board, Utc::now())
    }

    pub fn with_board_at(board: Board, now: DateTime<Utc>) -> Result<Self> {
        let config = board.game_config();
        config.validate()?;
        Ok(Self::blank(config, 0, Some(board), now))
    }

    fn blank(config: GameConfig, seed: u64, board: Option<Board>, now: DateTime<Utc>) -> Self {
        Self {
            config,
            seed,
            board,
            cells: Array2::default(config.size.to_nd_index()),
            flags_placed: Saturating(0),
            revealed_count: Saturating(0),
            status: Default::default(),
            started_at: now,
            ended_at: None,
            turn_count: 0,
            triggered_mine: None,
        }
    }

    /// Reassembles a session from already validated parts.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        config: GameConfig,
        seed: u64,
        board: Option<Board>,
        cells: Array2<CellState>,
        flags_placed: CellCount,
        revealed_count: CellCount,
        status: GameStatus,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        turn_count: u32,
        triggered_mine: Option<Coord2>,
    ) -> Self {
        Self {
            config,
            seed,
            board,
            cells,
            flags_placed: Saturating(flags_placed),
            revealed_count: Saturating(revealed_count),
            status,
            started_at,
            ended_at,
            turn_count,
            triggered_mine,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The mine layout, once the first reveal has placed it.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub(crate) fn cells(&self) -> &Array2<CellState> {
        &self.cells
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn flags_placed(&self) -> CellCount {
        self.flags_placed.0
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flags_placed.0 as isize)
    }

    /// Seconds since the game started, frozen once it ends.
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs_at(Utc::now())
    }

    pub fn elapsed_secs_at(&self, now: DateTime<Utc>) -> u32 {
        (self.ended_at.unwrap_or(now) - self.started_at)
            .num_seconds()
            .clamp(0, u32::MAX.into()) as u32
    }

    /// `None` when `coords` is outside the board.
    pub fn cell_at(&self, coords: Coord2) -> Option<CellState> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub fn adjacent_mines(&self, coords: Coord2) -> Option<u8> {
        self.board.as_ref()?.adjacent_mines(coords)
    }

    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.board
            .as_ref()
            .is_some_and(|board| board.contains_mine(coords))
    }

    /// A flag left on a safe cell after the game ended.
    pub fn is_misflagged(&self, coords: Coord2) -> bool {
        self.is_finished()
            && self.cell_at(coords) == Some(CellState::Flagged)
            && !self.has_mine_at(coords)
    }

    /// True once every safe cell has been revealed.
    pub fn check_win(&self) -> bool {
        self.board.as_ref().is_some_and(|board| {
            self.revealed_count == Saturating(board.safe_cell_count())
        })
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (rows, cols) = self.config.size;
        if coords.0 < rows && coords.1 < cols {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        use CellState::*;
        use FlagOutcome::*;

        let coords = self.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(NoChange);
        }

        let cell = &mut self.cells[coords.to_nd_index()];
        Ok(match *cell {
            Hidden => {
                *cell = Flagged;
                self.flags_placed += 1;
                Changed
            }
            Flagged => {
                *cell = Hidden;
                self.flags_placed -= 1;
                Changed
            }
            Revealed | Exploded => NoChange,
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealResult> {
        self.reveal_at(coords, Utc::now())
    }

    pub fn reveal_at(&mut self, coords: Coord2, now: DateTime<Utc>) -> Result<RevealResult> {
        let coords = self.validate_coords(coords)?;

        if self.is_finished() || self.cells[coords.to_nd_index()] != CellState::Hidden {
            return Ok(self.result(RevealOutcome::NoChange, Vec::new()));
        }

        let board = match self.board.take() {
            Some(board) => board,
            None => Board::generate(self.config, Some(coords), self.seed)?,
        };
        let board = self.board.insert(board);
        self.turn_count = self.turn_count.saturating_add(1);

        let mut changed = Vec::new();
        if board.contains_mine(coords) {
            log::debug!("Hit mine at {:?}", coords);
            self.cells[coords.to_nd_index()] = CellState::Exploded;
            changed.push(coords);
            for mine in board.mine_coords() {
                let cell = &mut self.cells[mine.to_nd_index()];
                if *cell == CellState::Hidden {
                    *cell = CellState::Revealed;
                    changed.push(mine);
                }
            }
            self.triggered_mine = Some(coords);
            self.finish(GameStatus::Lost, now);
            return Ok(self.result(RevealOutcome::HitMine, changed));
        }

        let opened = flood_reveal(board, &mut self.cells, coords, &mut changed);
        self.revealed_count += opened;

        if self.check_win() {
            self.finish(GameStatus::Won, now);
            Ok(self.result(RevealOutcome::Won, changed))
        } else {
            Ok(self.result(RevealOutcome::Revealed, changed))
        }
    }

    fn finish(&mut self, status: GameStatus, now: DateTime<Utc>) {
        if self.status.is_finished() {
            return;
        }
        self.status = status;
        self.ended_at = Some(now);
        log::debug!("Game finished: {:?} after {} turns", status, self.turn_count);
    }

    fn result(&self, outcome: RevealOutcome, changed: Vec<Coord2>) -> RevealResult {
        RevealResult {
            outcome,
            status: self.status,
            changed,
        }
    }
}

/// Opens the safe cell at `start` and, when it borders no mines, every hidden
/// cell reachable through zero cells. Flags stop the fill. Returns how many
/// cells were opened.
fn flood_reveal(
    board: &Board,
    cells: &mut Array2<CellState>,
    start: Coord2,
    changed: &mut Vec<Coord2>,
) -> CellCount {
    let mut opened: CellCount = 0;
    let mut visited = HashSet::from([start]);
    let mut to_visit = VecDeque::from([start]);

    while let Some(visit_coords) = to_visit.pop_front() {
        let cell = &mut cells[visit_coords.to_nd_index()];
        if *cell != CellState::Hidden {
            log::trace!("Skipping cell at {:?}", visit_coords);
            continue;
        }

        let Some(count) = board.adjacent_mines(visit_coords) else {
            continue;
        };
        *cell = CellState::Revealed;
        opened += 1;
        changed.push(visit_coords);
        log::trace!("Opened cell at {:?}, mine count: {}", visit_coords, count);

        if count == 0 {
            for pos in board.iter_neighbors(visit_coords) {
                if visited.insert(pos) {
                    to_visit.push_back(pos);
                }
            }
        }
    }

    opened
}
