//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// Configuration for the arena server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on (all IPv4 interfaces)
    pub port: u16,

    /// Path to the server's long-term host key
    pub host_key_path: PathBuf,

    /// Number of identities in the pool, i.e. the player limit
    pub max_players: u16,

    /// How long an unadmitted connection may hold resources
    #[serde(with = "duration_secs")]
    pub admission_timeout: Duration,

    /// Pending resize events buffered per player
    pub resize_queue_capacity: usize,

    /// Delay before answering a rejected authentication attempt
    #[serde(with = "duration_secs")]
    pub auth_rejection_time: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let config_dir = super::default_config_dir();

        Self {
            port: 2200,
            host_key_path: config_dir.join("host_key"),
            max_players: 64,
            admission_timeout: Duration::from_secs(30),
            resize_queue_capacity: 16,
            auth_rejection_time: Duration::from_secs(1),
        }
    }
}

impl ServerConfig {
    /// Listen address covering every IPv4 interface
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_players == 0 {
            return Err(ConfigError::Invalid(
                "max_players must be at least 1".to_string(),
            ));
        }
        if self.resize_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "resize_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.admission_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "admission_timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 2200);
        assert_eq!(config.bind_address(), "0.0.0.0:2200");
        assert!(config.host_key_path.ends_with("ssh-arena/host_key"));
        assert!(config.resize_queue_capacity > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let config = ServerConfig {
            max_players: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("port = 4000\nadmission_timeout = 5").unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.admission_timeout, Duration::from_secs(5));
        assert_eq!(config.max_players, ServerConfig::default().max_players);
    }
}
