//! Teleport destination parsing and resolution
//!
//! Destination strings name where a teleport lands:
//! - `otherworld` or `w:otherworld` - spawn of the named world
//! - `e:otherworld:10,64,-5` - exact coordinates in the named world
//!
//! Parsing is pure; [`resolve`] additionally looks the world up in the
//! registry and produces the concrete arrival point. Resolution never
//! mutates anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{Location, World, WorldManager};

/// Type id for world spawn destinations, used in permission nodes
pub const WORLD_SPAWN_TYPE: &str = "w";

/// Type id for exact-coordinate destinations, used in permission nodes
pub const EXACT_TYPE: &str = "e";

/// A parsed teleport destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Destination {
    /// Spawn point of a named world
    WorldSpawn { world: String },
    /// Exact coordinates in a named world
    Exact { world: String, x: f64, y: f64, z: f64 },
}

impl Destination {
    /// Parse a destination string
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DestinationError::InvalidFormat(raw.to_string()));
        }

        if let Some(rest) = raw.strip_prefix("e:") {
            let Some((world, coords)) = rest.split_once(':') else {
                return Err(DestinationError::InvalidFormat(raw.to_string()));
            };
            if world.is_empty() {
                return Err(DestinationError::InvalidFormat(raw.to_string()));
            }

            let parts: Vec<&str> = coords.split(',').collect();
            if parts.len() != 3 {
                return Err(DestinationError::InvalidFormat(raw.to_string()));
            }
            let mut xyz = [0.0f64; 3];
            for (slot, part) in xyz.iter_mut().zip(&parts) {
                *slot = part
                    .trim()
                    .parse()
                    .map_err(|_| DestinationError::InvalidFormat(raw.to_string()))?;
            }

            return Ok(Destination::Exact {
                world: world.to_string(),
                x: xyz[0],
                y: xyz[1],
                z: xyz[2],
            });
        }

        let world = raw.strip_prefix("w:").unwrap_or(raw);
        if world.is_empty() || world.contains(':') {
            return Err(DestinationError::InvalidFormat(raw.to_string()));
        }

        Ok(Destination::WorldSpawn {
            world: world.to_string(),
        })
    }

    /// Destination type id (`w` or `e`)
    pub fn type_id(&self) -> &'static str {
        match self {
            Destination::WorldSpawn { .. } => WORLD_SPAWN_TYPE,
            Destination::Exact { .. } => EXACT_TYPE,
        }
    }

    /// Name of the world this destination points into
    pub fn world_name(&self) -> &str {
        match self {
            Destination::WorldSpawn { world } => world,
            Destination::Exact { world, .. } => world,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::WorldSpawn { world } => write!(f, "{}", world),
            Destination::Exact { world, x, y, z } => {
                write!(f, "{}:{},{},{}", world, x, y, z)
            }
        }
    }
}

/// Destination resolution errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DestinationError {
    #[error("Unknown world: {0}")]
    UnknownWorld(String),

    #[error("World not loaded: {0}")]
    WorldNotLoaded(String),

    #[error("Invalid destination format: {0}")]
    InvalidFormat(String),
}

/// A destination resolved against the world registry
#[derive(Debug, Clone)]
pub struct ResolvedDestination {
    /// World snapshot at resolution time
    pub world: World,
    /// Concrete arrival point
    pub location: Location,
    destination: Destination,
}

impl ResolvedDestination {
    /// Destination type id, used in permission nodes
    pub fn type_id(&self) -> &'static str {
        self.destination.type_id()
    }

    /// Finer-permission suffix naming the specific destination
    pub fn finer_suffix(&self) -> &str {
        self.destination.world_name()
    }

    /// Whether arrivals here get the safe-spot search.
    /// Exact destinations land verbatim; spawn destinations follow the
    /// world's `adjust_spawn` setting.
    pub fn adjust_safety(&self) -> bool {
        match self.destination {
            Destination::Exact { .. } => false,
            Destination::WorldSpawn { .. } => self.world.adjust_spawn,
        }
    }

    /// Human-readable destination name for player messages
    pub fn describe(&self) -> String {
        self.destination.to_string()
    }
}

/// Resolve a raw destination string against the world registry.
///
/// The named world must be registered and loaded; the returned value
/// carries the arrival point and everything permission checks need.
pub async fn resolve(
    raw: &str,
    worlds: &WorldManager,
) -> Result<ResolvedDestination, DestinationError> {
    let destination = Destination::parse(raw)?;

    let world = worlds
        .get_world(destination.world_name())
        .await
        .ok_or_else(|| DestinationError::UnknownWorld(destination.world_name().to_string()))?;
    if !world.loaded {
        return Err(DestinationError::WorldNotLoaded(world.name));
    }

    let location = match &destination {
        Destination::WorldSpawn { .. } => world.spawn.clone(),
        Destination::Exact { world, x, y, z } => Location::new(world.clone(), *x, *y, *z),
    };

    Ok(ResolvedDestination {
        world,
        location,
        destination,
    })
}
