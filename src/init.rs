//! World database initialization
//!
//! One-time store setup for the warpcore_init tool.

use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::world::store::WorldStore;
use crate::world::{CreateWorldOptions, Environment, WorldManager};

/// A world to create during initialization
#[derive(Debug, Clone)]
pub struct WorldSeed {
    pub name: String,
    pub environment: Environment,
    pub spawn: Option<(f64, f64, f64)>,
}

impl WorldSeed {
    /// A normal-environment seed with the default spawn
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: Environment::Normal,
            spawn: None,
        }
    }

    /// Parse a seed argument of the form `NAME[:ENVIRONMENT[:X,Y,Z]]`
    ///
    /// Examples: `world`, `hell:nether`, `void:end:0,128,0`
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            bail!("World seed needs a name: {:?}", raw);
        }

        let mut seed = WorldSeed::new(name);
        if let Some(env) = parts.next() {
            seed.environment = env
                .trim()
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
        }
        if let Some(coords) = parts.next() {
            let nums: Vec<&str> = coords.split(',').collect();
            if nums.len() != 3 {
                bail!("Spawn must be X,Y,Z: {:?}", raw);
            }
            let mut xyz = [0.0f64; 3];
            for (slot, part) in xyz.iter_mut().zip(&nums) {
                *slot = part
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Bad spawn coordinate in {:?}", raw))?;
            }
            seed.spawn = Some((xyz[0], xyz[1], xyz[2]));
        }

        Ok(seed)
    }
}

/// Initialize a new world database
///
/// # Arguments
/// * `path` - Path to the SQLite database file (must not exist)
/// * `seeds` - Worlds to create in the fresh store
///
/// # Errors
/// * Database file already exists
/// * A seed world name is invalid or duplicated
/// * Store creation fails
pub async fn init_store(path: &Path, seeds: Vec<WorldSeed>) -> Result<()> {
    // Fail if database already exists
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    info!("Creating new world database at {}", path.display());

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Database path is not valid UTF-8"))?;
    let store = WorldStore::open(Some(path_str)).await?;
    let manager = WorldManager::new(Some(store));

    for seed in seeds {
        let mut options =
            CreateWorldOptions::world_name(&seed.name).environment(seed.environment);
        if let Some((x, y, z)) = seed.spawn {
            options = options.spawn_at(x, y, z);
        }
        let world = manager.create_world(options).await?;
        info!("  Created world '{}' ({})", world.name, world.environment);
    }

    info!("World database initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_seed_parse_name_only() {
        let seed = WorldSeed::parse("world").unwrap();
        assert_eq!(seed.name, "world");
        assert_eq!(seed.environment, Environment::Normal);
        assert!(seed.spawn.is_none());
    }

    #[test]
    fn test_seed_parse_full() {
        let seed = WorldSeed::parse("void:end:0,128,0").unwrap();
        assert_eq!(seed.name, "void");
        assert_eq!(seed.environment, Environment::End);
        assert_eq!(seed.spawn, Some((0.0, 128.0, 0.0)));
    }

    #[test]
    fn test_seed_parse_errors() {
        assert!(WorldSeed::parse("").is_err());
        assert!(WorldSeed::parse("hell:overworld").is_err());
        assert!(WorldSeed::parse("void:end:1,2").is_err());
        assert!(WorldSeed::parse("void:end:a,b,c").is_err());
    }

    #[tokio::test]
    async fn test_init_store_creates_new() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("worlds.db");

        let seeds = vec![
            WorldSeed::parse("world").unwrap(),
            WorldSeed::parse("hell:nether:8,70,8").unwrap(),
        ];
        init_store(&db_path, seeds).await.unwrap();

        // Verify file was created and the worlds are retrievable
        assert!(db_path.exists());
        let store = WorldStore::open(db_path.to_str()).await.unwrap();
        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let hell = store.fetch("hell").await.unwrap().unwrap();
        assert_eq!(hell.environment, Environment::Nether);
        assert_eq!(hell.spawn.x, 8.0);
    }

    #[tokio::test]
    async fn test_init_store_fails_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("worlds.db");

        init_store(&db_path, Vec::new()).await.unwrap();

        let result = init_store(&db_path, Vec::new()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_init_store_rejects_bad_name() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("worlds.db");

        let result = init_store(&db_path, vec![WorldSeed::new("bad name")]).await;
        assert!(result.is_err());
    }
}
