//! # Memory Scramble
//!
//! A shared multiplayer "Memory Scramble" board: a rectangular grid of
//! face-down cards that concurrent players flip in pairs, trying to find
//! matching labels.
//!
//! The heart of the crate is the [`Board`] abstract data type. It combines a
//! per-player two-step turn state machine, per-cell ownership with queued
//! waiters, lazy finalization of each player's previous turn, an atomic bulk
//! label rewrite, and a change-notification subscription, all safe under any
//! number of concurrent callers.
//!
//! ## Operations
//!
//! - **Look**: read a textual snapshot of the board from one player's
//!   perspective.
//! - **Flip**: take (or wait for) the next card of the caller's turn.
//! - **Map**: atomically rewrite every live card label with a caller-supplied
//!   async function.
//! - **Watch**: suspend until the board next changes, then read a snapshot.
//!
//! ## Core Modules
//!
//! - [`board`]: the grid, turn state machine, waiter/watcher registries, and
//!   the `Board` type itself
//! - [`commands`]: a thin façade re-exporting the four operations as free
//!   functions with fixed signatures
//!
//! ## Example
//!
//! ```no_run
//! use memory_scramble::{Board, PlayerId, commands};
//!
//! #[tokio::main]
//! async fn main() {
//!     let board = Board::parse("1x2\nA\nA\n").unwrap();
//!     let alice = PlayerId::new("alice");
//!     let snapshot = commands::flip(&board, &alice, 0, 0).await.unwrap();
//!     print!("{snapshot}");
//! }
//! ```

/// The concurrent board and its supporting state.
pub mod board;
pub use board::{Board, Coord, FlipError, PlayerId, SetupError};

/// Command façade over the four board operations.
pub mod commands;
