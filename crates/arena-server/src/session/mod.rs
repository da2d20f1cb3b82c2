//! Admitted sessions: players, the online registry and request dispatch

mod dispatch;
mod player;
mod registry;

pub use dispatch::{declined, DispatchState, Dispatcher};
pub use player::{AdmittedSession, Player};
pub use registry::PlayerRegistry;
