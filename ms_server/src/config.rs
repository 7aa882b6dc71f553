//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Complete server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Board file loaded at startup
    pub board_file: PathBuf,
    /// Directory `/reset` is allowed to load board files from
    pub boards_dir: PathBuf,
    /// Optional Prometheus scrape endpoint bind address
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `board_override` - Optional board file override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        board_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_addr("SERVER_BIND")?.unwrap_or_else(|| {
                "127.0.0.1:8080"
                    .parse()
                    .expect("Default bind address is valid")
            }),
        };

        let board_file = board_override
            .or_else(|| std::env::var("BOARD_FILE").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("boards/ab.txt"));

        let boards_dir = std::env::var("BOARDS_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("boards"));

        let metrics_bind = parse_env_addr("MS_METRICS_BIND")?;

        Ok(Self {
            bind,
            board_file,
            boards_dir,
            metrics_bind,
        })
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending knob.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                var: "BOARD_FILE".to_string(),
                reason: "Must name a board file".to_string(),
            });
        }

        if self.boards_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                var: "BOARDS_DIR".to_string(),
                reason: "Must name a directory".to_string(),
            });
        }

        if self.board_file.file_name().is_none() {
            return Err(ConfigError::Invalid {
                var: "BOARD_FILE".to_string(),
                reason: format!("{} does not name a file", self.board_file.display()),
            });
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an optional socket address environment variable.
fn parse_env_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("Not a socket address: {raw}"),
            }),
        Err(_) => Ok(None),
    }
}

/// Checks that `name` is a bare file name suitable for lookup inside the
/// boards directory: no separators, no parent-directory escapes.
pub fn sanitized_board_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        None
    } else {
        Some(name)
    }
}

/// Resolves a sanitized board name inside `boards_dir`.
pub fn board_path(boards_dir: &Path, name: &str) -> Option<PathBuf> {
    sanitized_board_name(name).map(|name| boards_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SERVER_BIND".to_string(),
            reason: "Not a socket address: nonsense".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SERVER_BIND"));
        assert!(msg.contains("nonsense"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let bind: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let config =
            ServerConfig::from_env(Some(bind), Some(PathBuf::from("boards/custom.txt"))).unwrap();
        assert_eq!(config.bind, bind);
        assert_eq!(config.board_file, PathBuf::from("boards/custom.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_board_file_fails_validation() {
        let config = ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            board_file: PathBuf::new(),
            boards_dir: PathBuf::from("boards"),
            metrics_bind: None,
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_board_name_sanitization() {
        assert_eq!(sanitized_board_name("ab.txt"), Some("ab.txt"));
        assert_eq!(sanitized_board_name(""), None);
        assert_eq!(sanitized_board_name("../secrets.txt"), None);
        assert_eq!(sanitized_board_name("dir/ab.txt"), None);
        assert_eq!(sanitized_board_name("dir\\ab.txt"), None);
    }

    #[test]
    fn test_board_path_joins_inside_the_boards_dir() {
        let dir = Path::new("boards");
        assert_eq!(board_path(dir, "ab.txt"), Some(PathBuf::from("boards/ab.txt")));
        assert_eq!(board_path(dir, "../ab.txt"), None);
    }
}
