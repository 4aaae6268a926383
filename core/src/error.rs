use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid board configuration")]
    InvalidConfiguration,
    #[error("Coordinates are outside the board")]
    OutOfBounds,
}

pub type Result<T, E = GameError> = core::result::Result<T, E>;

/// Failure to store or restore a game snapshot. Never fatal to gameplay.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Snapshot storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot could not be encoded or decoded: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("Snapshot is inconsistent: {0}")]
    Corrupt(&'static str),
    #[error("Snapshot describes an invalid game: {0}")]
    Invalid(#[from] GameError),
}
