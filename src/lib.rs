//! warpcore - multiworld teleport authorization and dispatch engine
//!
//! A host game server embeds [`Engine`], registers worlds and connected
//! players, and hands it teleport commands. The engine answers with
//! per-target outcome tickets and queued player notices; it never owns
//! sockets, terrain, or the game loop.

pub mod config;
pub mod destination;
pub mod init;
pub mod messaging;
pub mod permissions;
pub mod players;
pub mod safety;
pub mod teleport;
pub mod world;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

pub use config::EngineConfig;
pub use destination::{Destination, DestinationError, ResolvedDestination};
pub use messaging::{Notice, NoticeQueue, QueuedNotice};
pub use permissions::{Actor, PermissionChecker, PermissionResult, PermissionSet, Relation};
pub use players::PlayerRegistry;
pub use safety::SafetySearch;
pub use teleport::{
    DispatchOutcome, Dispatcher, Disposition, TeleportRequest, TeleportResult, TeleportTicket,
};
pub use world::{CreateWorldOptions, Environment, Location, World, WorldManager};

use world::store::WorldStore;

/// The warpcore engine instance
pub struct Engine {
    config: Arc<RwLock<EngineConfig>>,
    worlds: Arc<WorldManager>,
    players: Arc<PlayerRegistry>,
    safety: Arc<SafetySearch>,
    notices: Arc<NoticeQueue>,
    dispatcher: Dispatcher,
}

impl Engine {
    /// Create a new engine. Opens the world store when a database path
    /// is configured and restores the registry from it.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let store = match config.db_path.as_deref() {
            Some(path) => Some(WorldStore::open(Some(path)).await?),
            None => None,
        };

        let worlds = WorldManager::shared(store);
        let restored = worlds.load_all().await?;
        if restored > 0 {
            info!("Restored {} worlds from store", restored);
        }

        let players = PlayerRegistry::shared();
        let safety = SafetySearch::shared();
        let notices = NoticeQueue::shared();
        let config = Arc::new(RwLock::new(config));
        let dispatcher = Dispatcher::new(
            Arc::clone(&worlds),
            Arc::clone(&players),
            Arc::clone(&safety),
            Arc::clone(&notices),
            Arc::clone(&config),
        );

        Ok(Self {
            config,
            worlds,
            players,
            safety,
            notices,
            dispatcher,
        })
    }

    /// World registry handle
    pub fn worlds(&self) -> Arc<WorldManager> {
        self.worlds.clone()
    }

    /// Connected player registry handle
    pub fn players(&self) -> Arc<PlayerRegistry> {
        self.players.clone()
    }

    /// Hazard registry handle
    pub fn safety(&self) -> Arc<SafetySearch> {
        self.safety.clone()
    }

    /// Pending notice queue handle
    pub fn notices(&self) -> Arc<NoticeQueue> {
        self.notices.clone()
    }

    /// Dispatch a teleport request
    pub async fn dispatch(&self, request: TeleportRequest) -> DispatchOutcome {
        self.dispatcher.dispatch(request).await
    }

    /// Dry-run permission probe: would `actor` be allowed to teleport
    /// `target_id` to `raw_destination`? Resolves the destination but
    /// moves nobody and queues no notices.
    pub async fn check(
        &self,
        actor: &Actor,
        target_id: &str,
        raw_destination: &str,
    ) -> std::result::Result<PermissionResult, DestinationError> {
        let dest = destination::resolve(raw_destination, &self.worlds).await?;
        let finer = self.config.read().await.finer_teleport_permissions;
        let checker = PermissionChecker::new(finer);
        Ok(checker.can_teleport(actor, target_id, &dest))
    }

    /// Toggle finer (per-destination) permission granularity at runtime.
    /// In-flight dispatches keep the granularity they started with.
    pub async fn set_finer_teleport_permissions(&self, finer: bool) {
        self.config.write().await.finer_teleport_permissions = finer;
    }

    /// Current finer-permission setting
    pub async fn finer_teleport_permissions(&self) -> bool {
        self.config.read().await.finer_teleport_permissions
    }
}
