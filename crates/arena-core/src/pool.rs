//! Bounded pool of player identities
//!
//! The pool is filled once at startup and gates how many players can be
//! online at the same time. Drawing never waits: when the pool is empty the
//! caller is told so immediately and turns the connection away.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use rand::seq::SliceRandom;

use crate::types::Identity;

/// Fixed-capacity supply of unique identities
#[derive(Debug)]
pub struct IdentityPool {
    capacity: usize,
    inner: Mutex<PoolInner>,
}

#[derive(Debug, Default)]
struct PoolInner {
    /// Identities ready to be handed out
    free: VecDeque<Identity>,
    /// Identities currently held by a player
    issued: HashSet<Identity>,
}

impl IdentityPool {
    /// Create a pool holding identities `1..=capacity` in shuffled order
    pub fn new(capacity: u16) -> Self {
        let mut ids: Vec<Identity> = (1..=capacity).filter_map(Identity::new).collect();
        ids.shuffle(&mut rand::thread_rng());
        Self::from_identities(ids)
    }

    /// Create a pool handing out `ids` in the given order.
    ///
    /// Duplicates are dropped so no identity can be held twice.
    pub fn from_identities(ids: impl IntoIterator<Item = Identity>) -> Self {
        let mut seen = HashSet::new();
        let free: VecDeque<Identity> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self {
            capacity: free.len(),
            inner: Mutex::new(PoolInner {
                free,
                issued: HashSet::new(),
            }),
        }
    }

    /// Take an identity if one is available right now
    pub fn try_acquire(&self) -> Option<Identity> {
        let mut inner = self.lock();
        let id = inner.free.pop_front()?;
        inner.issued.insert(id);
        Some(id)
    }

    /// Return an identity to the pool.
    ///
    /// Returns `false` (and leaves the pool untouched) if `id` is not
    /// currently issued, e.g. on a double release.
    pub fn release(&self, id: Identity) -> bool {
        let mut inner = self.lock();
        if !inner.issued.remove(&id) {
            tracing::warn!("Ignoring release of identity {} that is not in use", id);
            return false;
        }
        inner.free.push_back(id);
        true
    }

    /// Number of identities ready to be handed out
    pub fn available(&self) -> usize {
        self.lock().free.len()
    }

    /// Number of identities currently issued
    pub fn in_use(&self) -> usize {
        self.lock().issued.len()
    }

    /// Total number of identities managed by this pool
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        // The pool's invariants hold between statements, so a poisoned
        // lock still guards consistent data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
