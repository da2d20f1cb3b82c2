//! Channel request dispatcher
//!
//! One dispatcher serves the single admitted channel of a connection for
//! as long as that channel lives. Requests are handled strictly in arrival
//! order, and every request except `window-change` gets exactly one reply.
//!
//! Dispatching never waits: it runs inside the connection's event loop, so
//! a resize the session loop has no room for is dropped.

use tokio::sync::{mpsc, watch};

use arena_protocol::{ChannelRequest, Reply, Resize, Response};

/// Lifecycle of the admitted channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No request seen yet
    AwaitingFirstRequest,
    /// Steady state for the life of the channel
    Servicing,
    /// Channel or connection torn down
    Closed,
}

/// Services requests on an admitted session channel
pub struct Dispatcher {
    /// Player name, for logging
    player: String,
    state: DispatchState,
    /// Resize events for the session behavior loop
    resizes: mpsc::Sender<Resize>,
    /// Set once the default shell was started
    shell: watch::Sender<bool>,
}

impl Dispatcher {
    /// Create a dispatcher feeding `resizes` and `shell`
    pub fn new(
        player: impl Into<String>,
        resizes: mpsc::Sender<Resize>,
        shell: watch::Sender<bool>,
    ) -> Self {
        Self {
            player: player.into(),
            state: DispatchState::AwaitingFirstRequest,
            resizes,
            shell,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Service one request and decide what goes back to the peer
    pub fn dispatch(&mut self, request: ChannelRequest) -> Response {
        if self.state == DispatchState::Closed {
            tracing::debug!("[{}] {} request after close", self.player, request.kind());
            return declined(&request);
        }
        self.state = DispatchState::Servicing;

        tracing::debug!("[{}] {} request: {:?}", self.player, request.kind(), request);

        match request {
            // Only the default shell is offered, never an explicit command
            ChannelRequest::Shell { payload } => {
                if payload.is_empty() {
                    self.shell.send_replace(true);
                    Response::Reply(Reply::Accept)
                } else {
                    Response::Reply(Reply::Decline)
                }
            }
            ChannelRequest::PtyRequest { size, .. } => {
                self.notify_resize(size);
                Response::Reply(Reply::Accept)
            }
            ChannelRequest::WindowChange { size } => {
                self.notify_resize(size);
                Response::Silent
            }
            ChannelRequest::Other { .. } => Response::Reply(Reply::Decline),
        }
    }

    /// Stop servicing; later requests are declined
    pub fn close(&mut self) {
        self.state = DispatchState::Closed;
    }

    fn notify_resize(&self, size: Resize) {
        match self.resizes.try_send(size) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("[{}] resize {} dropped, queue full", self.player, size);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("[{}] resize {} dropped, no consumer", self.player, size);
            }
        }
    }
}

/// Response for a request that will not be acted upon
pub fn declined(request: &ChannelRequest) -> Response {
    if request.requires_reply() {
        Response::Reply(Reply::Decline)
    } else {
        Response::Silent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn dispatcher_with(
        capacity: usize,
    ) -> (Dispatcher, mpsc::Receiver<Resize>, watch::Receiver<bool>) {
        let (resize_tx, resize_rx) = mpsc::channel(capacity);
        let (shell_tx, shell_rx) = watch::channel(false);
        (Dispatcher::new("Bob", resize_tx, shell_tx), resize_rx, shell_rx)
    }

    fn dispatcher() -> (Dispatcher, mpsc::Receiver<Resize>, watch::Receiver<bool>) {
        dispatcher_with(8)
    }

    fn shell(payload: &'static [u8]) -> ChannelRequest {
        ChannelRequest::Shell {
            payload: Bytes::from_static(payload),
        }
    }

    fn window_change(width: u32, height: u32) -> ChannelRequest {
        ChannelRequest::WindowChange {
            size: Resize::new(width, height),
        }
    }

    #[test]
    fn test_shell_without_payload_accepted() {
        let (mut dispatcher, _resizes, shell_rx) = dispatcher();
        assert_eq!(dispatcher.state(), DispatchState::AwaitingFirstRequest);

        let response = dispatcher.dispatch(shell(b""));
        assert_eq!(response, Response::Reply(Reply::Accept));
        assert_eq!(dispatcher.state(), DispatchState::Servicing);
        assert!(*shell_rx.borrow());
    }

    #[test]
    fn test_shell_with_payload_declined() {
        let (mut dispatcher, _resizes, shell_rx) = dispatcher();

        let response = dispatcher.dispatch(shell(b"rm -rf /"));
        assert_eq!(response, Response::Reply(Reply::Decline));
        assert!(!*shell_rx.borrow());
    }

    #[tokio::test]
    async fn test_pty_request_forwards_size() {
        let (mut dispatcher, mut resizes, _shell) = dispatcher();

        let response = dispatcher.dispatch(ChannelRequest::PtyRequest {
            term: "xterm".to_string(),
            size: Resize::new(80, 24),
        });
        assert_eq!(response, Response::Reply(Reply::Accept));
        assert_eq!(resizes.recv().await, Some(Resize::new(80, 24)));
    }

    #[tokio::test]
    async fn test_window_change_is_silent() {
        let (mut dispatcher, mut resizes, _shell) = dispatcher();

        let request = ChannelRequest::from_wire("window-change", &[0, 0, 0, 132, 0, 0, 0, 43]);
        assert_eq!(dispatcher.dispatch(request), Response::Silent);
        assert_eq!(resizes.recv().await, Some(Resize::new(132, 43)));
    }

    #[tokio::test]
    async fn test_resizes_keep_arrival_order() {
        let (mut dispatcher, mut resizes, _shell) = dispatcher();

        for width in [10, 20, 30] {
            dispatcher.dispatch(window_change(width, 5));
        }
        for width in [10, 20, 30] {
            assert_eq!(resizes.recv().await.map(|r| r.width), Some(width));
        }
    }

    #[test]
    fn test_full_resize_queue_does_not_hold_up_replies() {
        let (mut dispatcher, mut resizes, shell_rx) = dispatcher_with(2);

        for width in 1..=40 {
            assert_eq!(dispatcher.dispatch(window_change(width, 5)), Response::Silent);
        }
        let pty = ChannelRequest::PtyRequest {
            term: "xterm".to_string(),
            size: Resize::new(80, 24),
        };
        assert_eq!(dispatcher.dispatch(pty), Response::Reply(Reply::Accept));
        assert_eq!(dispatcher.dispatch(shell(b"")), Response::Reply(Reply::Accept));
        assert!(*shell_rx.borrow());

        // the oldest events were kept, the overflow dropped
        assert_eq!(resizes.try_recv().map(|r| r.width), Ok(1));
        assert_eq!(resizes.try_recv().map(|r| r.width), Ok(2));
        assert!(resizes.try_recv().is_err());
    }

    #[test]
    fn test_other_requests_declined() {
        let (mut dispatcher, _resizes, _shell) = dispatcher();

        for kind in ["exec", "env", "subsystem", "x11-req"] {
            let response = dispatcher.dispatch(ChannelRequest::Other {
                kind: kind.to_string(),
            });
            assert_eq!(response, Response::Reply(Reply::Decline), "{}", kind);
        }
    }

    #[test]
    fn test_resize_without_consumer_still_replies() {
        let (mut dispatcher, resizes, _shell) = dispatcher();
        drop(resizes);

        let response = dispatcher.dispatch(ChannelRequest::PtyRequest {
            term: String::new(),
            size: Resize::new(1, 1),
        });
        assert_eq!(response, Response::Reply(Reply::Accept));
    }

    #[test]
    fn test_closed_dispatcher_declines() {
        let (mut dispatcher, _resizes, _shell) = dispatcher();
        dispatcher.close();

        assert_eq!(dispatcher.dispatch(shell(b"")), Response::Reply(Reply::Decline));
        assert_eq!(dispatcher.dispatch(window_change(1, 1)), Response::Silent);
        assert_eq!(dispatcher.state(), DispatchState::Closed);
    }
}
