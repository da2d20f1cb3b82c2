//! SSH client handler implementation
//!
//! Implements the russh server handler that takes one connection from
//! handshake to an admitted player: authentication is recorded but never
//! refused, the first session channel is admitted, later channels are
//! refused, and channel requests are serviced until the channel closes.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use russh::server::{Auth, Handle, Handler, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec, Disconnect, MethodSet};
use russh_keys::key::PublicKey;
use russh_keys::PublicKeyBase64;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use arena_core::{AdmissionError, Fingerprint};
use arena_protocol::request::SHELL;
use arena_protocol::{ChannelKind, ChannelRequest, Reply, Resize};

use crate::server::admission::{admit_player, ChannelDecision, ChannelGate, Claim};
use crate::session::{declined, AdmittedSession, Dispatcher, Player};
use crate::state::ServerState;

/// The channel admitted on this connection and its dispatcher
struct AdmittedChannel {
    id: ChannelId,
    player: Arc<Player>,
    dispatcher: Dispatcher,
}

/// Handler for a single SSH client connection
pub struct ClientHandler {
    /// Shared server state
    state: Arc<ServerState>,
    /// Peer address of the connecting client
    peer_addr: SocketAddr,
    /// Identity material recorded during authentication
    claim: Claim,
    /// Enforces one session channel per connection
    gate: ChannelGate,
    /// Set once a player was admitted
    admitted: Option<AdmittedChannel>,
    /// Admission failed; the connection ends when the peer closes its channel
    turned_away: bool,
    /// Queue of freshly admitted sessions
    admissions: mpsc::Sender<AdmittedSession>,
    /// Cancelled once the connection was admitted, disarming the deadline
    settled: CancellationToken,
}

impl ClientHandler {
    /// Create a new client handler
    pub fn new(
        state: Arc<ServerState>,
        admissions: mpsc::Sender<AdmittedSession>,
        peer_addr: SocketAddr,
        settled: CancellationToken,
    ) -> Self {
        Self {
            state,
            peer_addr,
            claim: Claim::default(),
            gate: ChannelGate::new(),
            admitted: None,
            turned_away: false,
            admissions,
            settled,
        }
    }

    /// Record the claimed user and key; nothing is ever refused here
    fn record_claim(&mut self, user: &str, key: Option<Fingerprint>) -> Auth {
        tracing::info!(
            "Auth claim from {}: user {:?}, key {}",
            self.peer_addr,
            user,
            key.as_ref()
                .map_or_else(|| "none".to_string(), |k| k.to_string())
        );
        self.claim = Claim {
            user: user.to_string(),
            key,
        };
        Auth::Accept
    }

    /// Refuse a channel of a type other than `session`.
    ///
    /// If it is the first channel the connection is torn down as well.
    fn refuse_channel(&mut self, kind: ChannelKind) -> Result<bool, anyhow::Error> {
        match self.gate.offer(&kind) {
            ChannelDecision::Reject {
                reason,
                close_connection: true,
            } => {
                tracing::info!(
                    "Closing connection from {}: first channel is {:?} ({}, code {})",
                    self.peer_addr,
                    kind.as_str(),
                    reason,
                    reason.code()
                );
                Err(anyhow::anyhow!("unknown channel type: {}", kind))
            }
            decision => {
                tracing::info!(
                    "Rejecting {} channel from {}: {:?}",
                    kind,
                    self.peer_addr,
                    decision
                );
                Ok(false)
            }
        }
    }

    /// Admit the player behind `channel` and hand the session to the
    /// session loop.
    fn admit(&mut self, channel: Channel<Msg>) -> Result<(), AdmissionError> {
        let player = admit_player(&self.state, &self.claim, self.peer_addr)?;
        tracing::info!(
            "Creating new player {:?}: id: {}, fingerprint: {}",
            player.name,
            player.id,
            player.fingerprint
        );

        let channel_id = channel.id();
        let (resize_tx, resize_rx) = mpsc::channel(self.state.config.resize_queue_capacity.max(1));
        let (shell_tx, shell_rx) = watch::channel(false);

        self.admitted = Some(AdmittedChannel {
            id: channel_id,
            player: Arc::clone(&player),
            dispatcher: Dispatcher::new(player.name.clone(), resize_tx, shell_tx),
        });
        self.settled.cancel();

        let session = AdmittedSession::new(Arc::clone(&player), channel, resize_rx, shell_rx);
        let admissions = self.admissions.clone();
        let state = Arc::clone(&self.state);

        // Waits for the session loop to take the player while requests on
        // this connection keep being serviced
        tokio::spawn(async move {
            if admissions.send(session).await.is_err() {
                tracing::warn!("Session loop is gone, dropping player {:?}", player.name);
                state.players.remove(&player);
                state.identities.release(player.id);
            }
        });

        Ok(())
    }

    /// Service one channel request and write back the reply it needs
    fn service(
        &mut self,
        channel: ChannelId,
        request: ChannelRequest,
        session: &mut Session,
    ) -> Result<(), anyhow::Error> {
        let response = match self.admitted.as_mut() {
            Some(admitted) if admitted.id == channel => admitted.dispatcher.dispatch(request),
            _ => declined(&request),
        };

        match response.reply() {
            Some(Reply::Accept) => session.channel_success(channel),
            Some(Reply::Decline) => session.channel_failure(channel),
            None => {}
        }
        Ok(())
    }
}

/// Write `notice` to the channel, close it and end the connection
fn turn_away(handle: Handle, channel: ChannelId, notice: String) {
    tokio::spawn(async move {
        let _ = handle
            .data(channel, CryptoVec::from_slice(notice.as_bytes()))
            .await;
        let _ = handle.close(channel).await;
        let _ = handle
            .disconnect(
                Disconnect::ByApplication,
                notice.trim_end().to_string(),
                String::new(),
            )
            .await;
    });
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = anyhow::Error;

    /// Ask clients to present a key (or at least a password) so a
    /// fingerprint can be recorded
    async fn auth_none(&mut self, _user: &str) -> Result<Auth, Self::Error> {
        Ok(Auth::Reject {
            proceed_with_methods: Some(MethodSet::PUBLICKEY | MethodSet::PASSWORD),
        })
    }

    async fn auth_password(&mut self, user: &str, _password: &str) -> Result<Auth, Self::Error> {
        Ok(self.record_claim(user, None))
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        let fingerprint = Fingerprint::from_key_bytes(&public_key.public_key_bytes());
        Ok(self.record_claim(user, Some(fingerprint)))
    }

    /// Global requests are answered with a failure so the peer never waits
    async fn tcpip_forward(
        &mut self,
        address: &str,
        port: &mut u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        tracing::debug!("Discarding tcpip-forward {}:{} from {}", address, port, self.peer_addr);
        Ok(false)
    }

    async fn cancel_tcpip_forward(
        &mut self,
        address: &str,
        port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            "Discarding cancel-tcpip-forward {}:{} from {}",
            address,
            port,
            self.peer_addr
        );
        Ok(false)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        session: &mut Session,
    ) -> Result<bool, Self::Error> {
        if let ChannelDecision::Reject { reason, .. } = self.gate.offer(&ChannelKind::Session) {
            tracing::info!(
                "Rejecting extra session channel from {}: {}",
                self.peer_addr,
                reason
            );
            return Ok(false);
        }

        let channel_id = channel.id();
        tracing::debug!("Session channel opened: {:?}", channel_id);

        if let Err(e) = self.admit(channel) {
            match e {
                AdmissionError::GameFull => {
                    tracing::info!("Game full, turning away {}", self.peer_addr)
                }
                AdmissionError::NameTaken(ref name) => {
                    tracing::info!("Name {:?} taken, turning away {}", name, self.peer_addr)
                }
            }
            // The channel is confirmed once this returns; the notice follows it
            self.turned_away = true;
            turn_away(session.handle(), channel_id, e.notice());
        }

        Ok(true)
    }

    async fn channel_open_x11(
        &mut self,
        _channel: Channel<Msg>,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.refuse_channel(ChannelKind::X11)
    }

    async fn channel_open_direct_tcpip(
        &mut self,
        _channel: Channel<Msg>,
        _host_to_connect: &str,
        _port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.refuse_channel(ChannelKind::DirectTcpip)
    }

    async fn channel_open_forwarded_tcpip(
        &mut self,
        _channel: Channel<Msg>,
        _host_to_connect: &str,
        _port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.refuse_channel(ChannelKind::ForwardedTcpip)
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.service(channel, ChannelRequest::from_wire(SHELL, &[]), session)
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        tracing::debug!(
            "exec of {:?} requested by {}",
            String::from_utf8_lossy(data),
            self.peer_addr
        );
        self.service(channel, ChannelRequest::from_wire("exec", data), session)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let request = ChannelRequest::PtyRequest {
            term: term.to_string(),
            size: Resize::new(col_width, row_height),
        };
        self.service(channel, request, session)
    }

    async fn window_change_request(
        &mut self,
        channel: ChannelId,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let request = ChannelRequest::WindowChange {
            size: Resize::new(col_width, row_height),
        };
        self.service(channel, request, session)
    }

    async fn env_request(
        &mut self,
        channel: ChannelId,
        _variable_name: &str,
        _variable_value: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.service(channel, ChannelRequest::from_wire("env", &[]), session)
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        tracing::debug!("subsystem {:?} requested by {}", name, self.peer_addr);
        self.service(
            channel,
            ChannelRequest::from_wire("subsystem", name.as_bytes()),
            session,
        )
    }

    async fn channel_eof(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        tracing::debug!("Channel EOF: {:?}", channel);
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        tracing::debug!("Channel closed: {:?}", channel);

        if self.turned_away {
            return Err(anyhow::anyhow!("connection from {} turned away", self.peer_addr));
        }

        if let Some(admitted) = self.admitted.as_mut() {
            if admitted.id == channel {
                tracing::info!("Player {:?} closed their channel", admitted.player.name);
                admitted.dispatcher.close();
            }
        }

        Ok(())
    }
}
