//! Core domain types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU16;

/// Numeric identity handed to an admitted player.
///
/// Zero is reserved on the wire to mean "no identity available"; here that
/// case is `Option<Identity>::None`, so an `Identity` is always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(NonZeroU16);

impl Identity {
    /// Create an identity, returning `None` for the reserved value 0
    pub fn new(id: u16) -> Option<Self> {
        NonZeroU16::new(id).map(Self)
    }

    /// Get the raw value
    pub fn get(&self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NonZeroU16> for Identity {
    fn from(id: NonZeroU16) -> Self {
        Self(id)
    }
}

/// Best-effort stable identifier for a connecting peer.
///
/// Authentication is observational only: a key fingerprint proves the peer
/// holds the matching private key, but a [`Fingerprint::PeerAddress`] is
/// whatever address the connection came from. It is shared by everyone
/// behind the same NAT and can be spoofed, so consumers must not treat it
/// as proof of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Lowercase hex SHA-256 of the public key's SSH wire encoding
    PublicKey(String),
    /// Bare IP address of the peer (no public key was presented)
    PeerAddress(IpAddr),
}

impl Fingerprint {
    /// Fingerprint the SSH wire encoding of a public key
    pub fn from_key_bytes(key: &[u8]) -> Self {
        Self::PublicKey(hex::encode(Sha256::digest(key)))
    }

    /// Pick the key fingerprint if one was recorded, else the peer's IP
    pub fn resolve(key: Option<Fingerprint>, peer: SocketAddr) -> Self {
        key.unwrap_or(Self::PeerAddress(peer.ip()))
    }

    /// Whether this fingerprint comes from the spoofable address fallback
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::PeerAddress(_))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKey(hash) => f.write_str(hash),
            Self::PeerAddress(ip) => write!(f, "{}", ip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_zero_is_reserved() {
        assert!(Identity::new(0).is_none());
        assert_eq!(Identity::new(7).map(|id| id.get()), Some(7));
    }

    #[test]
    fn test_identity_display() {
        let id = Identity::new(42).unwrap();
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_key_fingerprint_is_hex_sha256() {
        let fingerprint = Fingerprint::from_key_bytes(b"abc");
        assert_eq!(
            fingerprint.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(!fingerprint.is_weak());
    }

    #[test]
    fn test_resolve_falls_back_to_peer_ip() {
        let peer: SocketAddr = "203.0.113.5:51000".parse().unwrap();
        let fingerprint = Fingerprint::resolve(None, peer);
        assert_eq!(fingerprint.to_string(), "203.0.113.5");
        assert!(fingerprint.is_weak());
    }

    #[test]
    fn test_resolve_prefers_key() {
        let peer: SocketAddr = "[2001:db8::1]:22".parse().unwrap();
        let key = Fingerprint::from_key_bytes(b"key");
        assert_eq!(Fingerprint::resolve(Some(key.clone()), peer), key);
        assert_eq!(Fingerprint::resolve(None, peer).to_string(), "2001:db8::1");
    }
}
