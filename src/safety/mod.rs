//! Safe arrival search
//!
//! Worlds carry a set of hazardous block positions (lava, void, cactus).
//! Before finishing a spawn teleport the dispatcher asks for a safe
//! block near the intended arrival. Exact destinations and requests
//! with the unsafe flag skip the search entirely.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::world::Location;

/// Integer block position
pub type BlockPos = (i64, i64, i64);

/// Hazard registry and safe-spot search
#[derive(Debug, Default)]
pub struct SafetySearch {
    /// Hazardous block positions by world
    hazards: RwLock<HashMap<String, HashSet<BlockPos>>>,
}

impl SafetySearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Mark a block position as hazardous
    pub async fn mark_unsafe(&self, world: &str, x: i64, y: i64, z: i64) {
        self.hazards
            .write()
            .await
            .entry(world.to_string())
            .or_default()
            .insert((x, y, z));
    }

    /// Clear all hazards recorded for a world
    pub async fn clear_world(&self, world: &str) {
        self.hazards.write().await.remove(world);
    }

    /// Check whether a block position is free of hazards
    pub async fn is_safe(&self, world: &str, x: i64, y: i64, z: i64) -> bool {
        let hazards = self.hazards.read().await;
        hazards
            .get(world)
            .map(|set| !set.contains(&(x, y, z)))
            .unwrap_or(true)
    }

    /// Number of hazards recorded for a world
    pub async fn hazard_count(&self, world: &str) -> usize {
        self.hazards
            .read()
            .await
            .get(world)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Find a safe arrival point near the given location.
    ///
    /// Returns the location itself when its block is safe. Otherwise
    /// scans the surrounding volume nearest-first (ties broken by x,
    /// then z, then y, so results are deterministic) and returns the
    /// center of the first safe block. `None` when the whole search
    /// volume is hazardous.
    pub async fn find_safe(&self, near: &Location, radius: i64, height: i64) -> Option<Location> {
        let hazards = self.hazards.read().await;
        let Some(world_hazards) = hazards.get(&near.world) else {
            return Some(near.clone());
        };

        let (bx, by, bz) = near.block_pos();
        if !world_hazards.contains(&(bx, by, bz)) {
            return Some(near.clone());
        }

        let mut offsets = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                for dy in -height..=height {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    offsets.push((dx, dy, dz));
                }
            }
        }
        offsets.sort_by_key(|&(dx, dy, dz)| (dx * dx + dy * dy + dz * dz, dx, dz, dy));

        for (dx, dy, dz) in offsets {
            let pos = (bx + dx, by + dy, bz + dz);
            if !world_hazards.contains(&pos) {
                debug!(
                    world = %near.world,
                    from = ?(bx, by, bz),
                    to = ?pos,
                    "Adjusted arrival to safe block"
                );
                return Some(Location::new(
                    near.world.clone(),
                    pos.0 as f64 + 0.5,
                    pos.1 as f64,
                    pos.2 as f64 + 0.5,
                ));
            }
        }

        None
    }
}
