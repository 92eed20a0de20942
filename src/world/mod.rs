//! World registry and management
//!
//! Worlds are the teleport destinations the engine knows about:
//! - Name validation and creation via [`CreateWorldOptions`]
//! - Loaded/unloaded lifecycle (only loaded worlds accept teleports)
//! - Spawn point tracking
//! - Optional sqlite persistence via [`store::WorldStore`]

pub mod store;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use store::WorldStore;

/// Maximum world name length
pub const MAX_WORLD_NAME_LEN: usize = 64;

/// A point in a named world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World this location belongs to
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    /// Create a new location
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Integer block coordinates containing this location
    pub fn block_pos(&self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{},{}", self.world, self.x, self.y, self.z)
    }
}

/// World environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Normal,
    Nether,
    End,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Normal
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Normal => write!(f, "normal"),
            Environment::Nether => write!(f, "nether"),
            Environment::End => write!(f, "end"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Environment::Normal),
            "nether" => Ok(Environment::Nether),
            "end" => Ok(Environment::End),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Validation errors for world names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty or longer than 64 characters
    Length,
    /// Name contains characters outside [A-Za-z0-9_-]
    InvalidFormat,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Length => {
                write!(f, "World name must be 1-64 characters")
            }
            NameError::InvalidFormat => {
                write!(
                    f,
                    "World name may only contain letters, digits, underscores, and hyphens"
                )
            }
        }
    }
}

impl std::error::Error for NameError {}

/// Allowed world name pattern
static WORLD_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Validate a world name.
///
/// # Rules
/// - Length: 1-64 characters
/// - Pattern: letters, digits, underscores, hyphens
pub fn validate_world_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() || name.len() > MAX_WORLD_NAME_LEN {
        return Err(NameError::Length);
    }

    if !WORLD_NAME_REGEX.is_match(name) {
        return Err(NameError::InvalidFormat);
    }

    Ok(())
}

/// A registered world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Unique world name
    pub name: String,
    /// Environment type
    pub environment: Environment,
    /// Generation seed
    pub seed: i64,
    /// Whether structures generate in this world
    pub generate_structures: bool,
    /// Spawn point
    pub spawn: Location,
    /// Whether spawn teleports into this world get safety adjustment
    pub adjust_spawn: bool,
    /// Whether the world is currently loaded
    pub loaded: bool,
    /// RFC3339 creation timestamp
    pub created_at: String,
    /// RFC3339 last-update timestamp
    pub updated_at: String,
}

impl World {
    /// Update the modification timestamp
    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Options for creating a new world
///
/// Fluent builder; unset fields fall back to defaults (normal environment,
/// random seed, structures on, spawn adjustment on, spawn at 0,64,0).
#[derive(Debug, Clone)]
pub struct CreateWorldOptions {
    name: String,
    environment: Environment,
    seed: Option<i64>,
    generate_structures: bool,
    adjust_spawn: bool,
    spawn: Option<(f64, f64, f64)>,
}

impl CreateWorldOptions {
    /// Start building options for a world with the given name
    pub fn world_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: Environment::Normal,
            seed: None,
            generate_structures: true,
            adjust_spawn: true,
            spawn: None,
        }
    }

    /// Set the environment type
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the generation seed (random when unset)
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set whether structures generate
    pub fn generate_structures(mut self, generate: bool) -> Self {
        self.generate_structures = generate;
        self
    }

    /// Set whether spawn teleports get safety adjustment
    pub fn adjust_spawn(mut self, adjust: bool) -> Self {
        self.adjust_spawn = adjust;
        self
    }

    /// Set the spawn point
    pub fn spawn_at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.spawn = Some((x, y, z));
        self
    }

    /// Materialize a world record from these options
    fn build(self) -> World {
        let now = chrono::Utc::now().to_rfc3339();
        let (x, y, z) = self.spawn.unwrap_or((0.0, 64.0, 0.0));
        World {
            spawn: Location::new(self.name.clone(), x, y, z),
            name: self.name,
            environment: self.environment,
            seed: self.seed.unwrap_or_else(rand::random),
            generate_structures: self.generate_structures,
            adjust_spawn: self.adjust_spawn,
            loaded: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// World management errors
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Invalid world name: {0}")]
    InvalidName(#[from] NameError),

    #[error("World already exists: {0}")]
    AlreadyExists(String),

    #[error("World not found: {0}")]
    NotFound(String),

    #[error("World already loaded: {0}")]
    AlreadyLoaded(String),

    #[error("World not loaded: {0}")]
    NotLoaded(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// World registry
///
/// In-memory map of registered worlds, optionally backed by a store.
/// The teleport path only reads from the registry; administration
/// operations are the only writers.
pub struct WorldManager {
    /// Registered worlds by name
    worlds: RwLock<HashMap<String, World>>,
    /// Optional persistence backend
    store: Option<WorldStore>,
}

impl std::fmt::Debug for WorldManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldManager")
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl WorldManager {
    /// Create a new world manager
    pub fn new(store: Option<WorldStore>) -> Self {
        Self {
            worlds: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Create a shared instance
    pub fn shared(store: Option<WorldStore>) -> Arc<Self> {
        Arc::new(Self::new(store))
    }

    /// Populate the registry from the store on startup
    pub async fn load_all(&self) -> Result<usize, WorldError> {
        let Some(ref store) = self.store else {
            return Ok(0);
        };

        let records = store.fetch_all().await?;
        let mut worlds = self.worlds.write().await;
        for world in records {
            worlds.insert(world.name.clone(), world);
        }

        debug!("Loaded {} worlds from store", worlds.len());
        Ok(worlds.len())
    }

    /// Create and register a new world
    pub async fn create_world(&self, options: CreateWorldOptions) -> Result<World, WorldError> {
        validate_world_name(&options.name)?;

        let mut worlds = self.worlds.write().await;
        if worlds.contains_key(&options.name) {
            return Err(WorldError::AlreadyExists(options.name));
        }

        let world = options.build();
        if let Some(ref store) = self.store {
            store.upsert(&world).await?;
        }

        info!(world = %world.name, environment = %world.environment, "Created world");
        worlds.insert(world.name.clone(), world.clone());
        Ok(world)
    }

    /// Get a snapshot of a world by name
    pub async fn get_world(&self, name: &str) -> Option<World> {
        self.worlds.read().await.get(name).cloned()
    }

    /// Check whether a world is registered
    pub async fn is_world(&self, name: &str) -> bool {
        self.worlds.read().await.contains_key(name)
    }

    /// Check whether a world is registered and loaded
    pub async fn is_loaded(&self, name: &str) -> bool {
        self.worlds
            .read()
            .await
            .get(name)
            .map(|w| w.loaded)
            .unwrap_or(false)
    }

    /// Names of all registered worlds, sorted
    pub async fn world_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.worlds.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered worlds
    pub async fn world_count(&self) -> usize {
        self.worlds.read().await.len()
    }

    /// Mark a registered world as loaded
    pub async fn load_world(&self, name: &str) -> Result<(), WorldError> {
        let mut worlds = self.worlds.write().await;
        let world = worlds
            .get_mut(name)
            .ok_or_else(|| WorldError::NotFound(name.to_string()))?;

        if world.loaded {
            return Err(WorldError::AlreadyLoaded(name.to_string()));
        }

        world.loaded = true;
        world.touch();
        if let Some(ref store) = self.store {
            store.upsert(world).await?;
        }

        info!(world = %name, "Loaded world");
        Ok(())
    }

    /// Mark a loaded world as unloaded
    pub async fn unload_world(&self, name: &str) -> Result<(), WorldError> {
        let mut worlds = self.worlds.write().await;
        let world = worlds
            .get_mut(name)
            .ok_or_else(|| WorldError::NotFound(name.to_string()))?;

        if !world.loaded {
            return Err(WorldError::NotLoaded(name.to_string()));
        }

        world.loaded = false;
        world.touch();
        if let Some(ref store) = self.store {
            store.upsert(world).await?;
        }

        info!(world = %name, "Unloaded world");
        Ok(())
    }

    /// Remove a world from the registry entirely
    pub async fn remove_world(&self, name: &str) -> Result<(), WorldError> {
        let mut worlds = self.worlds.write().await;
        if worlds.remove(name).is_none() {
            return Err(WorldError::NotFound(name.to_string()));
        }

        if let Some(ref store) = self.store {
            store.delete(name).await?;
        }

        info!(world = %name, "Removed world");
        Ok(())
    }

    /// Move a world's spawn point
    pub async fn set_spawn(&self, name: &str, x: f64, y: f64, z: f64) -> Result<Location, WorldError> {
        let mut worlds = self.worlds.write().await;
        let world = worlds
            .get_mut(name)
            .ok_or_else(|| WorldError::NotFound(name.to_string()))?;

        world.spawn = Location::new(name, x, y, z);
        world.touch();
        if let Some(ref store) = self.store {
            store.upsert(world).await?;
        }

        Ok(world.spawn.clone())
    }
}
