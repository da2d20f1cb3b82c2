//! arena-server: SSH front door for a multiplayer terminal game
//!
//! The server accepts SSH connections, admits exactly one interactive
//! session per connection, assigns each player a bounded identity and a
//! sanitized display name, services the session's channel requests, and
//! hands every admitted session to the game's session loop.

pub mod lobby;
pub mod server;
pub mod session;
pub mod state;

pub use server::ArenaServer;
pub use state::ServerState;
