//! SSH server listener
//!
//! Accepts incoming connections and spawns a handler for each client.

use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use russh_keys::key::KeyPair;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::server::handler::ClientHandler;
use crate::session::AdmittedSession;
use crate::state::ServerState;

/// SSH server that listens for incoming players
pub struct ArenaServer {
    /// russh server configuration
    ssh_config: Arc<russh::server::Config>,
    /// Shared server state
    state: Arc<ServerState>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
    /// Queue of freshly admitted sessions
    admissions: mpsc::Sender<AdmittedSession>,
}

impl ArenaServer {
    /// Create a new SSH server
    pub fn new(
        host_key: KeyPair,
        state: Arc<ServerState>,
        cancel: CancellationToken,
        admissions: mpsc::Sender<AdmittedSession>,
    ) -> Self {
        Self {
            ssh_config: super::ssh_config(host_key, &state.config),
            state,
            cancel,
            admissions,
        }
    }

    /// Bind the configured port on all IPv4 interfaces and serve until
    /// cancelled. Failing to bind is fatal.
    pub async fn run(&self) -> Result<()> {
        let bind_addr = self.state.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;
        self.serve(listener).await
    }

    /// Accept connections from an already bound listener until cancelled
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("SSH server listening on {}", local_addr);

        loop {
            tokio::select! {
                // Check for shutdown
                _ = self.cancel.cancelled() => {
                    tracing::info!("SSH server shutting down");
                    break;
                }

                // Accept new connections
                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            self.handle_connection(socket, peer_addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle a new incoming connection on its own task
    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::info!("New connection from {}", peer_addr);

        let config = Arc::clone(&self.ssh_config);
        let state = Arc::clone(&self.state);
        let admissions = self.admissions.clone();
        let shutdown = self.cancel.clone();
        let deadline = self.state.config.admission_timeout;

        tokio::spawn(async move {
            let (socket, watchdog) = match Watchdog::arm(socket) {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("Dropping connection from {}: {}", peer_addr, e);
                    return;
                }
            };

            let settled = CancellationToken::new();
            let watchdog = tokio::spawn(watchdog.run(
                deadline,
                settled.clone(),
                shutdown,
                peer_addr,
            ));

            let handler = ClientHandler::new(state, admissions, peer_addr, settled);
            let result = async {
                let session = russh::server::run_stream(config, socket, handler).await?;
                session.await
            }
            .await;
            watchdog.abort();

            match result {
                Ok(()) => {
                    tracing::info!("Connection from {} closed normally", peer_addr);
                }
                Err(e) => {
                    tracing::warn!("Connection from {} closed with error: {}", peer_addr, e);
                }
            }
        });
    }
}

/// Shuts a connection down if it is not admitted in time, or when the
/// server stops.
struct Watchdog {
    /// Second handle to the same socket as the one russh drives
    socket: std::net::TcpStream,
}

impl Watchdog {
    /// Split off a handle to `socket` that can shut it down later
    fn arm(socket: TcpStream) -> std::io::Result<(TcpStream, Self)> {
        let socket = socket.into_std()?;
        let watched = socket.try_clone()?;
        Ok((TcpStream::from_std(socket)?, Self { socket: watched }))
    }

    async fn run(
        self,
        deadline: Duration,
        settled: CancellationToken,
        shutdown: CancellationToken,
        peer_addr: SocketAddr,
    ) {
        tokio::select! {
            _ = settled.cancelled() => {
                shutdown.cancelled().await;
                tracing::debug!("Server stopping, closing connection from {}", peer_addr);
            }
            _ = tokio::time::sleep(deadline) => {
                tracing::info!(
                    "Connection from {} not admitted within {:?}, closing",
                    peer_addr,
                    deadline
                );
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("Server stopping, closing connection from {}", peer_addr);
            }
        }

        let _ = self.socket.shutdown(Shutdown::Both);
    }
}
