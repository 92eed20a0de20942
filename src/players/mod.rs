//! Connected player registry
//!
//! Tracks which players are currently online and where they stand.
//! Registry membership is the online flag: the host registers a player
//! on connect and removes them on disconnect. The teleport path treats
//! any name missing from the registry as an offline target.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::world::Location;

/// A connected player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique player name
    pub id: String,
    /// Current position
    pub location: Location,
}

/// Registry of all connected players
#[derive(Default)]
pub struct PlayerRegistry {
    players: RwLock<HashMap<String, Player>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a player as connected at the given position
    pub async fn connect(&self, id: impl Into<String>, location: Location) {
        let id = id.into();
        let player = Player {
            id: id.clone(),
            location,
        };
        self.players.write().await.insert(id, player);
    }

    /// Remove a player from the registry
    pub async fn disconnect(&self, id: &str) -> bool {
        self.players.write().await.remove(id).is_some()
    }

    /// Check whether a player is connected
    pub async fn is_connected(&self, id: &str) -> bool {
        self.players.read().await.contains_key(id)
    }

    /// Get a player's current position
    pub async fn location(&self, id: &str) -> Option<Location> {
        self.players
            .read()
            .await
            .get(id)
            .map(|p| p.location.clone())
    }

    /// Move a connected player. Returns false if the player is gone.
    pub async fn set_location(&self, id: &str, location: Location) -> bool {
        let mut players = self.players.write().await;
        match players.get_mut(id) {
            Some(player) => {
                player.location = location;
                true
            }
            None => false,
        }
    }

    /// Number of connected players
    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    /// Names of all connected players, sorted
    pub async fn player_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.players.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
