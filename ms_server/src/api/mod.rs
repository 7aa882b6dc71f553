//! HTTP API for the Memory Scramble server.
//!
//! Every route speaks plain text: snapshots on success, a short reason on
//! failure. One board is live at a time; `/reset` swaps in a freshly parsed
//! one without disturbing operations already in flight.
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Liveness probe
//! - `GET /look/{player}` - Snapshot from the player's perspective
//! - `GET /flip/{player}/{row},{col}` - Flip the next card of the turn
//! - `GET /replace/{player}/{from}/{to}` - Rewrite every `from` label to `to`
//! - `GET /watch/{player}` - Snapshot taken after the next board change
//! - `GET /reset?filename=NAME` - Parse a board file and swap it in
//!
//! Player ids are restricted to `[A-Za-z0-9_]+` at this boundary; flip
//! conflicts map to `409 Conflict` with the failure reason as the body.

pub mod board;

use axum::{Router, routing::get};
use memory_scramble::Board;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Application state shared across all handlers.
///
/// Cloned for each request (cheap due to Arc wrappers). The board slot holds
/// the current board; `/reset` swaps the inner `Arc` atomically, so
/// operations already in flight finish against the board they started on.
#[derive(Clone)]
pub struct AppState {
    board: Arc<RwLock<Arc<Board>>>,
    boards_dir: PathBuf,
}

impl AppState {
    pub fn new(board: Board, boards_dir: PathBuf) -> Self {
        Self {
            board: Arc::new(RwLock::new(Arc::new(board))),
            boards_dir,
        }
    }

    /// The board current at this instant.
    pub async fn current_board(&self) -> Arc<Board> {
        self.board.read().await.clone()
    }

    /// Atomically replaces the current board.
    ///
    /// Watchers and waiters parked on the old board resolve only if that
    /// board changes again; the board layer has no cancellation.
    pub async fn swap_board(&self, board: Board) {
        *self.board.write().await = Arc::new(board);
    }

    pub fn boards_dir(&self) -> &Path {
        &self.boards_dir
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET /health                       - Health check
/// GET /look/{player}                - Look
/// GET /flip/{player}/{coord}        - Flip at "row,col"
/// GET /replace/{player}/{from}/{to} - Map with a point rewrite
/// GET /watch/{player}               - Watch
/// GET /reset?filename=NAME          - Re-parse a file and swap the board
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/look/{player}", get(board::look))
        .route("/flip/{player}/{coord}", get(board::flip))
        .route("/replace/{player}/{from}/{to}", get(board::replace))
        .route("/watch/{player}", get(board::watch))
        .route("/reset", get(board::reset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
async fn health_check() -> &'static str {
    "OK"
}
