//! arena-core: Core types, identity pool and configuration for ssh-arena
//!
//! This crate provides the pieces of connection admission that do not
//! depend on the SSH transport: player identities and the bounded pool
//! they are drawn from, display-name sanitizing, peer fingerprints,
//! address advertisement and the server configuration.

pub mod addresses;
pub mod config;
pub mod error;
pub mod name;
pub mod pool;
pub mod types;

pub use error::{AdmissionError, ConfigError};
pub use pool::IdentityPool;
pub use types::{Fingerprint, Identity};
