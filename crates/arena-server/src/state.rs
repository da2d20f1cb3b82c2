//! Shared server state

use std::sync::Arc;

use arena_core::config::ServerConfig;
use arena_core::IdentityPool;

use crate::session::PlayerRegistry;

/// State shared by every connection handler and the session loop
pub struct ServerState {
    /// Configuration
    pub config: ServerConfig,
    /// Identities available to new players
    pub identities: Arc<IdentityPool>,
    /// Players currently online
    pub players: Arc<PlayerRegistry>,
    /// `ssh` commands players can use to reach this server, one per line
    pub addresses: String,
}

impl ServerState {
    /// Create state with an identity pool sized by `config.max_players`
    pub fn new(config: ServerConfig) -> Self {
        let pool = IdentityPool::new(config.max_players);
        Self::with_pool(config, pool)
    }

    /// Create state drawing identities from the given pool
    pub fn with_pool(config: ServerConfig, pool: IdentityPool) -> Self {
        Self {
            config,
            identities: Arc::new(pool),
            players: Arc::new(PlayerRegistry::new()),
            addresses: String::new(),
        }
    }

    /// Set the advertised connect commands
    pub fn with_addresses(mut self, addresses: String) -> Self {
        self.addresses = addresses;
        self
    }
}
