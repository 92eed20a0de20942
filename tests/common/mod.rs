//! Common test utilities - WarpTest harness for engine integration tests

use std::time::Duration;

use anyhow::Result;
use warpcore::{
    CreateWorldOptions, Engine, EngineConfig, Location, TeleportRequest, TeleportResult,
};

/// How long per-target tickets may take to settle in tests
pub const SETTLE: Duration = Duration::from_secs(2);

/// Test harness wrapping an engine with seeded worlds and players.
///
/// Worlds: `world` (spawn 0,64,0) and `otherworld` (spawn 8,70,8).
/// Players: Player1, Player2, Player3, all standing at `world` spawn.
pub struct WarpTest {
    pub engine: Engine,
}

impl WarpTest {
    /// Start an engine with the default configuration
    pub async fn start() -> Result<Self> {
        Self::with_config(EngineConfig::default()).await
    }

    /// Start an engine with a custom configuration
    pub async fn with_config(config: EngineConfig) -> Result<Self> {
        let engine = Engine::new(config).await?;

        engine
            .worlds()
            .create_world(CreateWorldOptions::world_name("world"))
            .await?;
        engine
            .worlds()
            .create_world(CreateWorldOptions::world_name("otherworld").spawn_at(8.0, 70.0, 8.0))
            .await?;

        for name in ["Player1", "Player2", "Player3"] {
            engine
                .players()
                .connect(name, Location::new("world", 0.0, 64.0, 0.0))
                .await;
        }

        Ok(Self { engine })
    }

    /// Where every player starts
    pub fn home(&self) -> Location {
        Location::new("world", 0.0, 64.0, 0.0)
    }

    /// Spawn of `otherworld`
    pub fn otherworld_spawn(&self) -> Location {
        Location::new("otherworld", 8.0, 70.0, 8.0)
    }

    /// Current position of a connected player
    pub async fn location(&self, player: &str) -> Location {
        self.engine
            .players()
            .location(player)
            .await
            .unwrap_or_else(|| panic!("{} is not connected", player))
    }

    /// Assert a player is still standing where they started
    pub async fn assert_unmoved(&self, player: &str) {
        assert_eq!(
            self.location(player).await,
            self.home(),
            "{} should not have moved",
            player
        );
    }

    /// Dispatch a request and settle every ticket
    pub async fn teleport(&self, request: TeleportRequest) -> Vec<(String, TeleportResult)> {
        self.engine.dispatch(request).await.settle(SETTLE).await
    }
}
