//! Admitted players and the hand-off to the session behavior loop

use std::sync::Arc;

use russh::server::Msg;
use russh::Channel;
use tokio::sync::{mpsc, watch};

use arena_core::{Fingerprint, Identity};
use arena_protocol::Resize;

/// An admitted, named, identity-bound participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identity drawn from the pool; must be released when the player leaves
    pub id: Identity,
    /// User name exactly as the client claimed it (untrusted)
    pub ssh_name: String,
    /// Sanitized display name, also the registry key
    pub name: String,
    /// Key fingerprint, or the peer IP when no key was presented
    pub fingerprint: Fingerprint,
}

impl Player {
    /// Create a new player
    pub fn new(
        id: Identity,
        ssh_name: impl Into<String>,
        name: impl Into<String>,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            id,
            ssh_name: ssh_name.into(),
            name: name.into(),
            fingerprint,
        }
    }
}

/// A freshly admitted session, delivered once on the admission queue.
///
/// The consumer owns the channel from here on. When the player leaves it
/// must remove the player from the registry and release its identity.
pub struct AdmittedSession {
    /// The registered player
    pub player: Arc<Player>,
    /// Byte stream of the admitted session channel
    pub channel: Channel<Msg>,
    /// Terminal size changes, in arrival order
    pub resizes: mpsc::Receiver<Resize>,
    /// Flips to `true` once the client started its shell
    shell: watch::Receiver<bool>,
}

impl AdmittedSession {
    /// Create a new admitted session
    pub fn new(
        player: Arc<Player>,
        channel: Channel<Msg>,
        resizes: mpsc::Receiver<Resize>,
        shell: watch::Receiver<bool>,
    ) -> Self {
        Self {
            player,
            channel,
            resizes,
            shell,
        }
    }

    /// Wait until the client has started its shell.
    ///
    /// Returns `false` if the connection went away first.
    pub async fn shell_started(&mut self) -> bool {
        self.shell.wait_for(|started| *started).await.is_ok()
    }
}
