//! Channel-level requests and their replies
//!
//! Every request on a session channel must be answered exactly once,
//! except `window-change`, which the peer sends without expecting a reply.
//! [`Response`] keeps the two cases apart so the handler can not forget to
//! reply to a request that needs one.

use bytes::{Buf, Bytes};

use crate::resize::Resize;

/// Request type: start the user's default shell
pub const SHELL: &str = "shell";
/// Request type: allocate a pseudo-terminal
pub const PTY_REQ: &str = "pty-req";
/// Request type: terminal dimensions changed
pub const WINDOW_CHANGE: &str = "window-change";

/// A request received on an admitted session channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRequest {
    /// `shell`; a non-empty payload means an explicit command was asked for
    Shell { payload: Bytes },
    /// `pty-req` with the terminal type and initial size
    PtyRequest { term: String, size: Resize },
    /// `window-change` with the new size
    WindowChange { size: Resize },
    /// Any request kind the arena does not act upon
    Other { kind: String },
}

impl ChannelRequest {
    /// Build a request from its type string and raw payload.
    ///
    /// Decoding never fails: truncated dimension fields become a zero
    /// [`Resize`] and unknown kinds become [`ChannelRequest::Other`].
    ///
    /// The server calls this for requests that carry no dimensions; russh
    /// delivers `pty-req` and `window-change` with their sizes parsed.
    pub fn from_wire(kind: &str, payload: &[u8]) -> Self {
        match kind {
            SHELL => Self::Shell {
                payload: Bytes::copy_from_slice(payload),
            },
            PTY_REQ => Self::PtyRequest {
                term: decode_term(payload),
                size: Resize::decode_pty_request(payload),
            },
            WINDOW_CHANGE => Self::WindowChange {
                size: Resize::decode(payload),
            },
            other => Self::Other {
                kind: other.to_string(),
            },
        }
    }

    /// The request type string
    pub fn kind(&self) -> &str {
        match self {
            Self::Shell { .. } => SHELL,
            Self::PtyRequest { .. } => PTY_REQ,
            Self::WindowChange { .. } => WINDOW_CHANGE,
            Self::Other { kind } => kind,
        }
    }

    /// Whether the peer expects a success/failure reply
    pub fn requires_reply(&self) -> bool {
        !matches!(self, Self::WindowChange { .. })
    }
}

/// Reply to a request that requires one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `SSH_MSG_CHANNEL_SUCCESS`
    Accept,
    /// `SSH_MSG_CHANNEL_FAILURE`
    Decline,
}

impl Reply {
    /// Whether this reply accepts the request
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl From<bool> for Reply {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Accept
        } else {
            Self::Decline
        }
    }
}

/// Outcome of servicing one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Exactly one reply must be written back
    Reply(Reply),
    /// Nothing is written back (`window-change`)
    Silent,
}

impl Response {
    /// The reply to send, if any
    pub fn reply(&self) -> Option<Reply> {
        match self {
            Self::Reply(reply) => Some(*reply),
            Self::Silent => None,
        }
    }
}

/// Read the TERM string at the head of a `pty-req` payload
fn decode_term(mut payload: &[u8]) -> String {
    if payload.len() < 4 {
        return String::new();
    }
    let len = payload.get_u32() as usize;
    let len = len.min(payload.len());
    String::from_utf8_lossy(&payload[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pty_payload(term: &str, width: u32, height: u32) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(term.len() as u32).to_be_bytes());
        payload.extend_from_slice(term.as_bytes());
        payload.extend_from_slice(&width.to_be_bytes());
        payload.extend_from_slice(&height.to_be_bytes());
        payload.extend_from_slice(&[0; 8]);
        payload.push(0);
        payload
    }

    #[test]
    fn test_shell_from_wire() {
        let request = ChannelRequest::from_wire("shell", &[]);
        assert_eq!(
            request,
            ChannelRequest::Shell {
                payload: Bytes::new()
            }
        );
        assert!(request.requires_reply());
    }

    #[test]
    fn test_pty_request_from_wire() {
        let request = ChannelRequest::from_wire("pty-req", &pty_payload("xterm-256color", 80, 24));
        assert_eq!(
            request,
            ChannelRequest::PtyRequest {
                term: "xterm-256color".to_string(),
                size: Resize::new(80, 24),
            }
        );
    }

    #[test]
    fn test_window_change_from_wire() {
        let request = ChannelRequest::from_wire(
            "window-change",
            &[0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x18],
        );
        assert_eq!(
            request,
            ChannelRequest::WindowChange {
                size: Resize::new(80, 24)
            }
        );
        assert!(!request.requires_reply());
    }

    #[test]
    fn test_window_change_short_payload() {
        let request = ChannelRequest::from_wire("window-change", &[0, 0, 0]);
        assert_eq!(
            request,
            ChannelRequest::WindowChange {
                size: Resize::default()
            }
        );
    }

    #[test]
    fn test_unknown_kind() {
        let request = ChannelRequest::from_wire("env", b"\0\0\0\x04LANG");
        assert_eq!(request.kind(), "env");
        assert!(request.requires_reply());
    }

    #[test]
    fn test_reply_from_bool() {
        assert_eq!(Reply::from(true), Reply::Accept);
        assert_eq!(Reply::from(false), Reply::Decline);
        assert_eq!(Response::Silent.reply(), None);
        assert_eq!(Response::Reply(Reply::Accept).reply(), Some(Reply::Accept));
    }
}
