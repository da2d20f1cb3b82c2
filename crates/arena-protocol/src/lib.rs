//! arena-protocol: SSH channel-level wire decoding for ssh-arena
//!
//! This crate describes the parts of the SSH connection protocol the
//! arena server cares about: which kind of logical channel a peer offers,
//! which channel-level requests it sends, and how terminal dimensions are
//! carried inside those requests.

pub mod channel;
pub mod request;
pub mod resize;

pub use channel::{ChannelKind, RejectReason};
pub use request::{ChannelRequest, Reply, Response};
pub use resize::Resize;
