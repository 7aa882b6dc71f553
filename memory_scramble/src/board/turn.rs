//! Per-player turn records and the flip outcome type.

use tokio::sync::oneshot;

use super::errors::FlipError;
use super::grid::Coord;

/// Tracks one player's progression through the current turn.
///
/// The list holds the positions flipped this turn, plus any positions left
/// over from a finished turn that await finalization at the player's next
/// flip. A simple `Option` cannot express the latter: a mismatched turn
/// leaves both positions pending, so the record needs room for two.
#[derive(Debug)]
pub(crate) struct PlayerRecord {
    controlled: Vec<Coord>,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            controlled: Vec::with_capacity(2),
        }
    }
}

impl PlayerRecord {
    pub fn positions(&self) -> &[Coord] {
        &self.controlled
    }

    pub fn push(&mut self, coord: Coord) {
        assert!(self.controlled.len() < 2, "a turn involves at most two cards");
        self.controlled.push(coord);
    }

    pub fn clear(&mut self) {
        self.controlled.clear();
    }
}

/// Result of one locked flip attempt, matched outside the lock.
#[derive(Debug)]
pub(crate) enum FlipAttempt {
    /// The card is held (or was reserved for us by a wake); render a snapshot
    /// and return it.
    Acquired,
    Failed(FlipError),
    /// Queued behind the cell's controller; await the signal, then retry the
    /// attempt from scratch.
    Wait(oneshot::Receiver<()>),
    /// Defensive restart state: yield to the scheduler and try again.
    Retry,
}
