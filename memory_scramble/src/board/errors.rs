//! Error taxonomy exposed by the board.

use thiserror::Error;

/// Ways a flip can fail.
///
/// These are the only errors [`Board::flip`](super::Board::flip) surfaces;
/// everything else is an invariant violation and asserts fatally.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FlipError {
    /// The coordinates fall outside the grid.
    #[error("no such position ({row},{col}) on the board")]
    InvalidCoordinates { row: usize, col: usize },
    /// The cell exists but its card has been removed.
    #[error("no card at ({row},{col})")]
    NoCardHere { row: usize, col: usize },
    /// A second-card flip targeted a face-up card some player controls.
    #[error("card at ({row},{col}) is face up and controlled")]
    TargetControlled { row: usize, col: usize },
}

/// Errors from constructing a board, directly or from the textual format.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The board text does not follow the documented format.
    #[error("malformed board (line {line}): {reason}")]
    Parse { line: usize, reason: String },
    /// Direct construction was handed the wrong number of labels.
    #[error("expected {expected} card labels, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("failed to read board file: {0}")]
    Io(#[from] std::io::Error),
}
