//! Channel admission and player creation
//!
//! A connection carries exactly one interactive session. The first channel
//! offered decides the fate of the connection: a `session` channel is
//! admitted, anything else closes the connection. Every later offer is
//! refused, whatever its type.

use std::net::SocketAddr;
use std::sync::Arc;

use arena_core::{name, AdmissionError, Fingerprint};
use arena_protocol::{ChannelKind, RejectReason};

use crate::session::Player;
use crate::state::ServerState;

/// What to do with a channel open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDecision {
    /// Accept the channel as the connection's session
    Accept,
    /// Refuse the channel
    Reject {
        reason: RejectReason,
        /// Tear down the whole connection, not just this channel
        close_connection: bool,
    },
}

/// Tracks channel offers on one connection
#[derive(Debug, Default)]
pub struct ChannelGate {
    offers: usize,
}

impl ChannelGate {
    /// Create a gate that has not seen any channel yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide on the next channel offered by the peer
    pub fn offer(&mut self, kind: &ChannelKind) -> ChannelDecision {
        self.offers += 1;
        if self.offers > 1 {
            return ChannelDecision::Reject {
                reason: RejectReason::Prohibited,
                close_connection: false,
            };
        }
        if kind.is_session() {
            ChannelDecision::Accept
        } else {
            ChannelDecision::Reject {
                reason: RejectReason::UnknownChannelType,
                close_connection: true,
            }
        }
    }

    /// Number of channels offered so far
    pub fn offers(&self) -> usize {
        self.offers
    }
}

/// Identity material recorded during authentication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claim {
    /// User name as sent by the client
    pub user: String,
    /// Fingerprint of the public key used, if any
    pub key: Option<Fingerprint>,
}

/// Turn an authenticated claim into a registered player.
///
/// Draws an identity without waiting, derives the display name and
/// fingerprint, and registers the player. On failure nothing is left
/// behind: a drawn identity goes back to the pool.
pub fn admit_player(
    state: &ServerState,
    claim: &Claim,
    peer_addr: SocketAddr,
) -> Result<Arc<Player>, AdmissionError> {
    let id = state
        .identities
        .try_acquire()
        .ok_or(AdmissionError::GameFull)?;

    let player = Player::new(
        id,
        claim.user.clone(),
        name::display_name(&claim.user, id),
        Fingerprint::resolve(claim.key.clone(), peer_addr),
    );

    match state.players.register(player) {
        Ok(player) => Ok(player),
        Err(e) => {
            state.identities.release(id);
            Err(e)
        }
    }
}
