//! Memory Scramble game server.
//!
//! Serves one shared board over plain-text HTTP routes; see the `api`
//! module for the route table.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Error;
use ctrlc::set_handler;
use memory_scramble::Board;
use pico_args::Arguments;

use ms_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a shared Memory Scramble board server

USAGE:
  ms_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address   [default: env SERVER_BIND or 127.0.0.1:8080]
  --board      FILE        Board file loaded at startup [default: env BOARD_FILE or boards/ab.txt]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  BOARD_FILE               Board file loaded at startup
  BOARDS_DIR               Directory /reset may load board files from
  MS_METRICS_BIND          Optional Prometheus scrape endpoint address
";

struct Args {
    bind: Option<SocketAddr>,
    board: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists (searches current dir and parent dirs)
    // Note: dotenvy does NOT override existing environment variables
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        board: pargs.opt_value_from_str("--board")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    // Initialize structured logging
    logging::init();

    // Load and validate configuration
    let config = ServerConfig::from_env(args.bind, args.board)
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    // Initialize Prometheus metrics exporter when configured
    if let Some(metrics_addr) = config.metrics_bind {
        if let Err(e) = metrics::init_metrics(metrics_addr) {
            tracing::warn!("Failed to initialize metrics: {e}. Metrics will not be available.");
        } else {
            tracing::info!("Metrics endpoint available at http://{metrics_addr}/metrics");
        }
    }

    tracing::info!("Loading board from {}", config.board_file.display());
    let board = Board::from_file(&config.board_file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load board: {e}"))?;
    tracing::info!("Board ready: {}x{}", board.rows(), board.cols());

    let state = api::AppState::new(board, config.boards_dir.clone());
    let app = api::create_router(state);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
