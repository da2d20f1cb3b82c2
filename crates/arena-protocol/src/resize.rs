//! Terminal dimension decoding
//!
//! Both `pty-req` and `window-change` channel requests carry the terminal
//! size as a pair of big-endian `u32` values (columns, then rows). Resize
//! handling is best-effort: a payload that is too short decodes to a
//! zero-sized [`Resize`] instead of an error.

use bytes::Buf;
use serde::{Deserialize, Serialize};

/// Number of bytes holding a width/height pair
pub const DIMS_LEN: usize = 8;

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resize {
    /// Number of columns
    pub width: u32,
    /// Number of rows
    pub height: u32,
}

impl Resize {
    /// Create a new resize event
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether this is the zero value produced by a malformed payload
    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Decode two big-endian `u32`s from the start of `buf`.
    ///
    /// Buffers shorter than eight bytes yield `Resize::default()`.
    pub fn decode(mut buf: &[u8]) -> Self {
        if buf.len() < DIMS_LEN {
            return Self::default();
        }
        let width = buf.get_u32();
        let height = buf.get_u32();
        Self { width, height }
    }

    /// Decode the dimensions embedded in a `pty-req` payload.
    ///
    /// The payload starts with the TERM string (a `u32` length followed by
    /// its bytes). Only the low byte of the length (payload byte 3) is
    /// consulted; the dimensions start right after the string.
    ///
    /// The server receives `pty-req` already parsed by russh; this decodes
    /// the raw payload for tooling and tests that work on captured bytes.
    pub fn decode_pty_request(payload: &[u8]) -> Self {
        let Some(&term_len) = payload.get(3) else {
            return Self::default();
        };
        match payload.get(4 + term_len as usize..) {
            Some(rest) => Self::decode(rest),
            None => Self::default(),
        }
    }
}

impl std::fmt::Display for Resize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_dims() {
        let buf = [0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x18];
        assert_eq!(Resize::decode(&buf), Resize::new(80, 24));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        // window-change also carries pixel sizes after the cell sizes
        let buf = [0, 0, 0, 120, 0, 0, 0, 40, 0, 0, 3, 0, 0, 0, 2, 0];
        assert_eq!(Resize::decode(&buf), Resize::new(120, 40));
    }

    #[test]
    fn test_decode_short_payload_is_zero() {
        for len in 0..DIMS_LEN {
            let buf = vec![0xff; len];
            let resize = Resize::decode(&buf);
            assert!(resize.is_zero(), "len {} decoded to {}", len, resize);
        }
    }

    #[test]
    fn test_decode_pty_request() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&5u32.to_be_bytes());
        payload.extend_from_slice(b"xterm");
        payload.extend_from_slice(&100u32.to_be_bytes());
        payload.extend_from_slice(&30u32.to_be_bytes());
        payload.extend_from_slice(&[0; 8]);
        payload.extend_from_slice(&[0, 0, 0, 1, 0]);

        assert_eq!(Resize::decode_pty_request(&payload), Resize::new(100, 30));
    }

    #[test]
    fn test_decode_pty_request_truncated() {
        assert!(Resize::decode_pty_request(&[]).is_zero());
        assert!(Resize::decode_pty_request(&[0, 0, 0]).is_zero());
        // TERM length points past the end of the payload
        assert!(Resize::decode_pty_request(&[0, 0, 0, 200, b'x']).is_zero());
        // dimensions cut short
        assert!(Resize::decode_pty_request(&[0, 0, 0, 1, b'x', 0, 0, 0, 80]).is_zero());
    }

    #[test]
    fn test_resize_display() {
        assert_eq!(Resize::new(80, 24).to_string(), "80x24");
    }

    #[test]
    fn test_resize_serialize() {
        let json = serde_json::to_string(&Resize::new(80, 24)).unwrap();
        assert_eq!(json, r#"{"width":80,"height":24}"#);
    }
}
