//! Logical channel types offered by SSH peers

use std::fmt;

/// Channel type string for an interactive session
pub const SESSION: &str = "session";

/// Kind of logical channel a peer asked to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// Interactive session (`session`)
    Session,
    /// X11 forwarding (`x11`)
    X11,
    /// Local port forwarding (`direct-tcpip`)
    DirectTcpip,
    /// Remote port forwarding (`forwarded-tcpip`)
    ForwardedTcpip,
    /// Anything else
    Other(String),
}

impl ChannelKind {
    /// Parse the channel type string from a `CHANNEL_OPEN` message.
    ///
    /// russh parses channel opens itself and hands the server typed
    /// callbacks; this is the raw-name mapping those callbacks stand for.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            SESSION => Self::Session,
            "x11" => Self::X11,
            "direct-tcpip" => Self::DirectTcpip,
            "forwarded-tcpip" => Self::ForwardedTcpip,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name of this channel type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Session => SESSION,
            Self::X11 => "x11",
            Self::DirectTcpip => "direct-tcpip",
            Self::ForwardedTcpip => "forwarded-tcpip",
            Self::Other(kind) => kind,
        }
    }

    /// Whether this is an interactive session channel
    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason code attached to a rejected channel open (RFC 4254 §5.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `SSH_OPEN_ADMINISTRATIVELY_PROHIBITED`
    Prohibited,
    /// `SSH_OPEN_UNKNOWN_CHANNEL_TYPE`
    UnknownChannelType,
}

impl RejectReason {
    /// Numeric reason code as sent on the wire
    pub fn code(&self) -> u32 {
        match self {
            Self::Prohibited => 1,
            Self::UnknownChannelType => 3,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prohibited => write!(f, "administratively prohibited"),
            Self::UnknownChannelType => write!(f, "unknown channel type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kind_from_wire() {
        assert_eq!(ChannelKind::from_wire("session"), ChannelKind::Session);
        assert_eq!(ChannelKind::from_wire("direct-tcpip"), ChannelKind::DirectTcpip);
        assert_eq!(
            ChannelKind::from_wire("auth-agent@openssh.com"),
            ChannelKind::Other("auth-agent@openssh.com".to_string())
        );
    }

    #[test]
    fn test_channel_kind_name_roundtrip() {
        for name in ["session", "x11", "direct-tcpip", "forwarded-tcpip", "custom"] {
            assert_eq!(ChannelKind::from_wire(name).as_str(), name);
        }
        assert!(ChannelKind::Session.is_session());
        assert!(!ChannelKind::X11.is_session());
    }

    #[test]
    fn test_reject_reason_codes() {
        assert_eq!(RejectReason::Prohibited.code(), 1);
        assert_eq!(RejectReason::UnknownChannelType.code(), 3);
    }
}
