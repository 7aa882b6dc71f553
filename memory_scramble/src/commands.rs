//! Command façade over the board operations.
//!
//! Front ends (HTTP routes, drivers) bind to these four free functions; each
//! delegates one-to-one to the corresponding [`Board`] method and their
//! signatures are fixed.

use std::future::Future;

use crate::board::{Board, FlipError, PlayerId};

/// Reads a snapshot of `board` from `player`'s perspective.
pub async fn look(board: &Board, player: &PlayerId) -> String {
    board.look(player).await
}

/// Flips the next card of `player`'s turn at `(row, col)`.
pub async fn flip(
    board: &Board,
    player: &PlayerId,
    row: usize,
    col: usize,
) -> Result<String, FlipError> {
    board.flip(player, row, col).await
}

/// Atomically rewrites every live card label on `board` with `rewrite`.
pub async fn map<F, Fut, E>(board: &Board, player: &PlayerId, rewrite: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    board.map(player, rewrite).await
}

/// Suspends until `board` next changes, then reads a snapshot.
pub async fn watch(board: &Board, player: &PlayerId) -> String {
    board.watch(player).await
}
