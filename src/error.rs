use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("{} not found", .0.display())]
    Missing(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("grid is empty")]
    EmptyGrid,

    #[error("malformed input at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("maze size must be odd and at least 5, got {0}")]
    InvalidSize(usize),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("no path from {from:?} to {to:?}")]
    NoPath {
        from: crate::grid::Pos,
        to: crate::grid::Pos,
    },
}

impl MazeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            MazeError::Missing(path)
        } else {
            MazeError::Io { path, source }
        }
    }
}

/// Recoverable mini-game input errors, shown to the player as a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RevealError {
    #[error("Tile was already revealed. Please choose another one.")]
    AlreadyRevealed,

    #[error("Tile is flagged. Remove the flag first.")]
    Flagged,

    #[error("Tile is outside the minefield.")]
    OutOfBounds,
}
