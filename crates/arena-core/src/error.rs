//! Core error types for ssh-arena

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a connection could not be turned into a player
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// Every identity in the pool is in use
    #[error("This game is full.")]
    GameFull,

    /// The display name (and its suffixed fallback) is already registered
    #[error("The name {0:?} is already taken.")]
    NameTaken(String),
}

impl AdmissionError {
    /// Plain-text notice written to the peer before the connection closes
    pub fn notice(&self) -> String {
        format!("{}\r\n", self)
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_full_notice() {
        assert_eq!(AdmissionError::GameFull.notice(), "This game is full.\r\n");
    }

    #[test]
    fn test_name_taken_notice() {
        let notice = AdmissionError::NameTaken("Bob-7".to_string()).notice();
        assert_eq!(notice, "The name \"Bob-7\" is already taken.\r\n");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("max_players must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid config: max_players must be at least 1");
    }
}
