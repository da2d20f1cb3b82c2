//! Directory of online players

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use arena_core::name;
use arena_core::AdmissionError;

use super::player::Player;

/// Online players indexed by display name.
///
/// A single lock guards the map; admissions and departures are rare
/// compared to the work each session does.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Mutex<HashMap<String, Arc<Player>>>,
}

impl PlayerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player under its display name.
    ///
    /// If the name is already online the player is registered as
    /// `<name>-<id>` instead. Fails with [`AdmissionError::NameTaken`] if
    /// that name is taken as well.
    pub fn register(&self, mut player: Player) -> Result<Arc<Player>, AdmissionError> {
        let mut players = self.lock();

        if players.contains_key(&player.name) {
            let renamed = name::suffixed(&player.name, player.id);
            if players.contains_key(&renamed) {
                return Err(AdmissionError::NameTaken(renamed));
            }
            tracing::info!(
                "Name {:?} already online, registering player {} as {:?}",
                player.name,
                player.id,
                renamed
            );
            player.name = renamed;
        }

        let player = Arc::new(player);
        players.insert(player.name.clone(), Arc::clone(&player));
        Ok(player)
    }

    /// Get a player by display name
    pub fn get(&self, name: &str) -> Option<Arc<Player>> {
        self.lock().get(name).cloned()
    }

    /// Remove a departing player.
    ///
    /// Only removes the entry if it still belongs to `player`, so a late
    /// departure can not evict a newer player that reused the name.
    pub fn remove(&self, player: &Player) -> bool {
        let mut players = self.lock();
        match players.get(&player.name) {
            Some(current) if current.id == player.id => {
                players.remove(&player.name);
                true
            }
            _ => false,
        }
    }

    /// Display names of all online players, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of online players
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nobody is online
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Player>>> {
        self.players.lock().unwrap_or_else(|e| e.into_inner())
    }
}
