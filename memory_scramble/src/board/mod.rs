//! The concurrent Memory Scramble board.
//!
//! [`Board`] is a single in-memory object safe to share across any number of
//! concurrent callers. Four operations form its public surface: [`look`]
//! (read a snapshot), [`flip`] (take or wait for the next card of the
//! caller's turn), [`map`] (atomically rewrite every live card label), and
//! [`watch`] (suspend until the next observable change).
//!
//! One async mutex serializes every state-mutating section; tokio's mutex
//! queues acquirers fairly, so lock handoff is FIFO. Suspensions (a flip
//! waiting for a controlled cell, a watch waiting for a change) happen
//! outside the lock on one-shot channels whose send halves the board keeps
//! until fulfilled.
//!
//! [`look`]: Board::look
//! [`flip`]: Board::flip
//! [`map`]: Board::map
//! [`watch`]: Board::watch

mod errors;
mod grid;
mod parse;
mod state;
mod turn;

pub use errors::{FlipError, SetupError};
pub use grid::{Coord, PlayerId};

use std::future::Future;
use std::path::Path;
use tokio::sync::Mutex;

use grid::Grid;
use state::BoardState;
use turn::FlipAttempt;

/// A shared multiplayer board of face-down cards flipped in pairs.
///
/// All internal state is owned exclusively by the board; snapshots handed to
/// callers are fresh strings with no reference to internal storage.
#[derive(Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    state: Mutex<BoardState>,
}

impl Board {
    /// Builds a board directly from `rows * cols` labels in row-major order.
    ///
    /// # Errors
    ///
    /// [`SetupError::LengthMismatch`] if the label count does not fill the
    /// grid. Zero dimensions and malformed labels are programmer errors.
    pub fn new(rows: usize, cols: usize, labels: Vec<String>) -> Result<Self, SetupError> {
        let expected = rows * cols;
        if labels.len() != expected {
            return Err(SetupError::LengthMismatch {
                expected,
                found: labels.len(),
            });
        }
        let grid = Grid::new(rows, cols, labels);
        Ok(Self {
            rows,
            cols,
            state: Mutex::new(BoardState::new(grid)),
        })
    }

    /// Parses a board from its textual format: a `<rows>x<cols>` header
    /// followed by one non-empty label per line, row-major, with blank lines
    /// ignored.
    ///
    /// # Errors
    ///
    /// [`SetupError::Parse`] describing the offending line.
    pub fn parse(text: &str) -> Result<Self, SetupError> {
        let (rows, cols, labels) = parse::parse(text)?;
        log::info!("parsed {rows}x{cols} board with {} cards", labels.len());
        Ok(Self {
            rows,
            cols,
            state: Mutex::new(BoardState::new(Grid::new(rows, cols, labels))),
        })
    }

    /// Reads and parses a board file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns a snapshot of the board from `player`'s perspective.
    ///
    /// The snapshot is rendered in one lock-holding segment, so it reflects a
    /// state consistent with a single atomic observation. Look never mutates
    /// and never suspends beyond lock acquisition.
    pub async fn look(&self, player: &PlayerId) -> String {
        let state = self.state.lock().await;
        state.render(player)
    }

    /// Flips the next card of `player`'s turn at `(row, col)`.
    ///
    /// The player's previous turn, if any, is finalized first: a matched pair
    /// is removed, a mismatched pair turned back face down, and one waiter
    /// per settled cell woken. Then the flip itself proceeds: the first card
    /// of a turn waits (suspended, unbounded) while another player controls
    /// the target cell; the second card never waits, failing instead and
    /// relinquishing the first card.
    ///
    /// Returns a snapshot taken right after the flip takes effect.
    ///
    /// # Errors
    ///
    /// [`FlipError::InvalidCoordinates`], [`FlipError::NoCardHere`], or
    /// [`FlipError::TargetControlled`].
    pub async fn flip(
        &self,
        player: &PlayerId,
        row: usize,
        col: usize,
    ) -> Result<String, FlipError> {
        loop {
            let signal = {
                let mut state = self.state.lock().await;
                state.finalize_previous(player);
                match state.attempt(player, row, col) {
                    FlipAttempt::Acquired => {
                        state.check_invariants();
                        return Ok(state.render(player));
                    }
                    FlipAttempt::Failed(error) => {
                        state.check_invariants();
                        return Err(error);
                    }
                    FlipAttempt::Wait(signal) => Some(signal),
                    FlipAttempt::Retry => None,
                }
            };
            match signal {
                // Suspended behind the cell's controller. The send half lives
                // in the board, so a closed channel only means the board went
                // away mid-wait; retrying is harmless either way.
                Some(signal) => {
                    let _ = signal.await;
                }
                None => tokio::task::yield_now().await,
            }
        }
    }

    /// Atomically rewrites every live card label with `rewrite`.
    ///
    /// Labels are copied out under the lock, `rewrite` runs and may suspend
    /// freely with the lock released, and the results are applied in one
    /// atomic step: any concurrent observer sees either all old labels or all
    /// new ones. Cells emptied between the two phases are skipped.
    ///
    /// `rewrite` must be a pure function of its argument and must not call
    /// back into the same board.
    ///
    /// # Errors
    ///
    /// The first error `rewrite` returns; the board is left unchanged.
    pub async fn map<F, Fut, E>(&self, player: &PlayerId, mut rewrite: F) -> Result<String, E>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let current = {
            let state = self.state.lock().await;
            state.present_labels()
        };
        let mut rewrites = Vec::with_capacity(current.len());
        for (coord, label) in current {
            rewrites.push((coord, rewrite(label).await?));
        }
        let mut state = self.state.lock().await;
        state.apply_rewrites(rewrites);
        state.check_invariants();
        Ok(state.render(player))
    }

    /// Suspends until the board next changes, then returns a snapshot taken
    /// after the change.
    ///
    /// Every watcher registered before a change event is woken by that event;
    /// watchers registered afterwards see only later events.
    pub async fn watch(&self, player: &PlayerId) -> String {
        let signal = {
            let mut state = self.state.lock().await;
            state.subscribe()
        };
        let _ = signal.await;
        self.look(player).await
    }
}
