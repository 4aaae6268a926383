//! Saving and resuming an unfinished game.
//!
//! A [`Snapshot`] is the flat, serializable form of a [`GameSession`]. It is
//! written through a [`SnapshotStore`], which only ever holds the latest game.
//! Finished games are removed from the store instead of saved, since there is
//! nothing left to resume.

use chrono::prelude::*;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::*;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub rows: Coord,
    pub cols: Coord,
    pub mine_count: CellCount,
    pub seed: u64,
    /// `None` until the first reveal has placed the mines.
    pub mine_coords: Option<Vec<Coord2>>,
    /// Row-major.
    pub cells: Vec<CellState>,
    pub flags_placed: CellCount,
    pub revealed_count: CellCount,
    pub status: GameStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub turn_count: u32,
    pub triggered_mine: Option<Coord2>,
}

impl Snapshot {
    pub fn from_session(session: &GameSession) -> Self {
        let (rows, cols) = session.size();
        Self {
            version: SNAPSHOT_VERSION,
            rows,
            cols,
            mine_count: session.total_mines(),
            seed: session.seed(),
            mine_coords: session.board().map(Board::mine_coords),
            cells: session.cells().iter().copied().collect(),
            flags_placed: session.flags_placed(),
            revealed_count: session.revealed_count(),
            status: session.status(),
            started_at: session.started_at(),
            ended_at: session.ended_at(),
            turn_count: session.turn_count(),
            triggered_mine: session.triggered_mine(),
        }
    }

    /// Rebuilds the session, rejecting snapshots no sequence of moves could
    /// have produced.
    pub fn into_session(self) -> Result<GameSession, PersistenceError> {
        use CellState::*;

        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }

        let size = (self.rows, self.cols);
        let config = GameConfig::new(size, self.mine_count)?;

        if self.cells.len() != usize::from(config.total_cells()) {
            return Err(PersistenceError::Corrupt("cell grid does not match board size"));
        }
        let cells = Array2::from_shape_vec(size.to_nd_index(), self.cells)
            .map_err(|_| PersistenceError::Corrupt("cell grid does not match board size"))?;

        let board = self
            .mine_coords
            .map(|mine_coords| Board::from_mine_coords(size, &mine_coords))
            .transpose()?;

        let mut flagged: CellCount = 0;
        let mut revealed_safe: CellCount = 0;
        let mut exploded: Option<Coord2> = None;
        for ((row, col), &cell) in cells.indexed_iter() {
            let coords = (row as Coord, col as Coord);
            let has_mine = board.as_ref().is_some_and(|b| b.contains_mine(coords));
            match cell {
                Hidden => {}
                Flagged => flagged += 1,
                Revealed if has_mine && self.status != GameStatus::Lost => {
                    return Err(PersistenceError::Corrupt("mine revealed in a running game"));
                }
                Revealed if has_mine => {}
                Revealed => revealed_safe += 1,
                Exploded if !has_mine || exploded.is_some() => {
                    return Err(PersistenceError::Corrupt("exploded cell is not the triggered mine"));
                }
                Exploded => exploded = Some(coords),
            }
        }

        match &board {
            Some(board) if board.mine_count() != config.mines => {
                return Err(PersistenceError::Corrupt("mine list does not match mine count"));
            }
            None if revealed_safe > 0 || self.status != GameStatus::Playing => {
                return Err(PersistenceError::Corrupt("cells revealed before mines were placed"));
            }
            _ => {}
        }
        if flagged != self.flags_placed || revealed_safe != self.revealed_count {
            return Err(PersistenceError::Corrupt("counters disagree with cell grid"));
        }
        if exploded != self.triggered_mine {
            return Err(PersistenceError::Corrupt("triggered mine disagrees with cell grid"));
        }
        let consistent_status = match self.status {
            GameStatus::Playing => {
                exploded.is_none() && revealed_safe < config.safe_cell_count()
            }
            GameStatus::Won => exploded.is_none() && revealed_safe == config.safe_cell_count(),
            GameStatus::Lost => exploded.is_some(),
        };
        if !consistent_status || self.ended_at.is_some() != self.status.is_finished() {
            return Err(PersistenceError::Corrupt("status disagrees with cell grid"));
        }

        Ok(GameSession::from_parts(
            config,
            self.seed,
            board,
            cells,
            self.flags_placed,
            self.revealed_count,
            self.status,
            self.started_at,
            self.ended_at,
            self.turn_count,
            self.triggered_mine,
        ))
    }
}

/// Durable slot holding at most one encoded snapshot.
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Clearing an empty store is not an error.
    fn clear(&mut self) -> io::Result<()>;
}

/// Keeps the snapshot in a single file. The file is only open for the
/// duration of each call.
#[derive(Clone, Debug, PartialEq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub const DEFAULT_FILE_NAME: &'static str = "minesweeper.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        staging.into()
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILE_NAME)
    }
}

impl SnapshotStore for FileStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        // a crash mid-write leaves the previous snapshot intact
        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)
    }

    fn clear(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_none()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.bytes = None;
        Ok(())
    }
}

/// Overwrites the stored snapshot, or removes it once the game is over.
///
/// Failures are logged and returned; callers are free to keep playing.
pub fn save<S: SnapshotStore + ?Sized>(
    store: &mut S,
    session: &GameSession,
) -> Result<(), PersistenceError> {
    let saved = if session.is_finished() {
        log::debug!("Game over, clearing saved game");
        store.clear().map_err(PersistenceError::from)
    } else {
        serde_json::to_vec(&Snapshot::from_session(session))
            .map_err(PersistenceError::from)
            .and_then(|bytes| store.write(&bytes).map_err(PersistenceError::from))
    };

    if let Err(err) = &saved {
        log::error!("Could not save game: {}", err);
    }
    saved
}

/// Like [`load`], but reports why nothing could be restored.
pub fn try_load<S: SnapshotStore + ?Sized>(
    store: &S,
) -> Result<Option<GameSession>, PersistenceError> {
    let Some(bytes) = store.read()? else {
        return Ok(None);
    };
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    snapshot.into_session().map(Some)
}

/// Restores the saved game. Missing or unreadable saves mean "start fresh".
pub fn load<S: SnapshotStore + ?Sized>(store: &S) -> Option<GameSession> {
    match try_load(store) {
        Ok(session) => session,
        Err(err) => {
            log::warn!("Ignoring saved game: {}", err);
            None
        }
    }
}

/// When the saved game was started, for offering to resume it.
pub fn saved_at<S: SnapshotStore + ?Sized>(store: &S) -> Option<DateTime<Utc>> {
    load(store).map(|session| session.started_at())
}
