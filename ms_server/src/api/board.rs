//! Board operation handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use memory_scramble::{Board, PlayerId, commands};
use serde::Deserialize;
use std::convert::Infallible;

use super::AppState;
use crate::{config, metrics};

/// Parses and validates a player id: non-empty, `[A-Za-z0-9_]` only.
fn parse_player(raw: &str) -> Option<PlayerId> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(PlayerId::new(raw))
}

/// Parses `"row,col"` coordinates.
fn parse_coord(raw: &str) -> Option<(usize, usize)> {
    let (row, col) = raw.split_once(',')?;
    Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
}

fn bad_request(reason: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, reason.to_string())
}

fn bad_player(op: &'static str) -> (StatusCode, String) {
    metrics::board_op(op, 400);
    bad_request("player id must match [A-Za-z0-9_]+")
}

/// `GET /look/{player}` - snapshot from the player's perspective.
pub async fn look(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> (StatusCode, String) {
    let Some(player) = parse_player(&player) else {
        return bad_player("look");
    };
    let board = state.current_board().await;
    let snapshot = commands::look(&board, &player).await;
    metrics::board_op("look", 200);
    (StatusCode::OK, snapshot)
}

/// `GET /flip/{player}/{row},{col}` - flip the next card of the turn.
///
/// May hold the request open until the target card is released. Conflicts
/// surface as `409` with the failure reason as the body.
pub async fn flip(
    State(state): State<AppState>,
    Path((player, coord)): Path<(String, String)>,
) -> (StatusCode, String) {
    let Some(player) = parse_player(&player) else {
        return bad_player("flip");
    };
    let Some((row, col)) = parse_coord(&coord) else {
        metrics::board_op("flip", 400);
        return bad_request("coordinates must look like row,col");
    };
    let board = state.current_board().await;
    match commands::flip(&board, &player, row, col).await {
        Ok(snapshot) => {
            metrics::board_op("flip", 200);
            (StatusCode::OK, snapshot)
        }
        Err(error) => {
            tracing::debug!(player = %player, row, col, %error, "flip rejected");
            metrics::board_op("flip", 409);
            (StatusCode::CONFLICT, error.to_string())
        }
    }
}

/// `GET /replace/{player}/{from}/{to}` - rewrite every `from` label to `to`.
pub async fn replace(
    State(state): State<AppState>,
    Path((player, from, to)): Path<(String, String, String)>,
) -> (StatusCode, String) {
    let Some(player) = parse_player(&player) else {
        return bad_player("replace");
    };
    if to.is_empty() || to.chars().any(char::is_whitespace) {
        metrics::board_op("replace", 400);
        return bad_request("replacement labels must be non-empty and whitespace-free");
    }
    let board = state.current_board().await;
    let snapshot = commands::map(&board, &player, |label| {
        let from = from.clone();
        let to = to.clone();
        async move { Ok::<_, Infallible>(if label == from { to } else { label }) }
    })
    .await
    .unwrap_or_else(|never| match never {});
    metrics::board_op("replace", 200);
    (StatusCode::OK, snapshot)
}

/// `GET /watch/{player}` - snapshot taken after the next board change.
///
/// Holds the request open until the board changes. Dropping the connection
/// abandons the wait; the board layer itself never cancels.
pub async fn watch(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> (StatusCode, String) {
    let Some(player) = parse_player(&player) else {
        return bad_player("watch");
    };
    let board = state.current_board().await;
    let snapshot = commands::watch(&board, &player).await;
    metrics::board_op("watch", 200);
    (StatusCode::OK, snapshot)
}

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    filename: String,
}

/// `GET /reset?filename=NAME` - parse a board file and swap it in.
///
/// The filename must be a bare file name inside the configured boards
/// directory. The swap is atomic: requests started before it finish against
/// the old board.
pub async fn reset(
    State(state): State<AppState>,
    Query(params): Query<ResetParams>,
) -> (StatusCode, String) {
    let Some(path) = config::board_path(state.boards_dir(), &params.filename) else {
        metrics::board_reset("rejected");
        return bad_request("filename must be a bare file name");
    };
    match Board::from_file(&path).await {
        Ok(board) => {
            tracing::info!(
                file = %path.display(),
                rows = board.rows(),
                cols = board.cols(),
                "board reset"
            );
            state.swap_board(board).await;
            metrics::board_reset("ok");
            (StatusCode::OK, "OK".to_string())
        }
        Err(error) => {
            tracing::warn!(file = %path.display(), %error, "board reset failed");
            metrics::board_reset("failed");
            bad_request(&error.to_string())
        }
    }
}
