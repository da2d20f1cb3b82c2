//! SSH server implementation

mod admission;
mod handler;
mod host_key;
mod listener;

use std::sync::Arc;

use arena_core::config::ServerConfig;
use russh_keys::key::KeyPair;

pub use admission::{admit_player, ChannelDecision, ChannelGate, Claim};
pub use handler::ClientHandler;
pub use host_key::load_or_generate_host_key;
pub use listener::ArenaServer;

/// Build the russh configuration for the given host key
pub fn ssh_config(host_key: KeyPair, config: &ServerConfig) -> Arc<russh::server::Config> {
    let mut ssh = russh::server::Config::default();
    ssh.keys.push(host_key);
    ssh.auth_rejection_time = config.auth_rejection_time;
    ssh.auth_rejection_time_initial = Some(std::time::Duration::from_secs(0));
    Arc::new(ssh)
}
