//! World persistence - SQLite-backed storage for the world registry

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{Location, World};

/// World storage with database backing
pub struct WorldStore {
    pool: SqlitePool,
}

impl WorldStore {
    /// Open a world store.
    /// If path is None, uses an in-memory database (for testing).
    pub async fn open(path: Option<&str>) -> Result<Self, sqlx::Error> {
        let conn_str = match path {
            Some(p) => format!("sqlite:{}?mode=rwc", p),
            None => "sqlite::memory:".to_string(),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        info!("Running world store migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS worlds (
                name TEXT PRIMARY KEY,
                environment TEXT NOT NULL DEFAULT 'normal',
                seed INTEGER NOT NULL,
                generate_structures INTEGER NOT NULL DEFAULT 1,
                spawn_x REAL NOT NULL,
                spawn_y REAL NOT NULL,
                spawn_z REAL NOT NULL,
                adjust_spawn INTEGER NOT NULL DEFAULT 1,
                loaded INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("World store migrations complete");
        Ok(())
    }

    /// Insert or replace a world record
    pub async fn upsert(&self, world: &World) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO worlds
                (name, environment, seed, generate_structures,
                 spawn_x, spawn_y, spawn_z, adjust_spawn, loaded,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&world.name)
        .bind(world.environment.to_string())
        .bind(world.seed)
        .bind(world.generate_structures)
        .bind(world.spawn.x)
        .bind(world.spawn.y)
        .bind(world.spawn.z)
        .bind(world.adjust_spawn)
        .bind(world.loaded)
        .bind(&world.created_at)
        .bind(&world.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a world by name
    pub async fn fetch(&self, name: &str) -> Result<Option<World>, sqlx::Error> {
        let row: Option<WorldRow> = sqlx::query_as(
            r#"
            SELECT name, environment, seed, generate_structures,
                   spawn_x, spawn_y, spawn_z, adjust_spawn, loaded,
                   created_at, updated_at
            FROM worlds WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.into_world()?)),
            None => Ok(None),
        }
    }

    /// Get all world records
    pub async fn fetch_all(&self) -> Result<Vec<World>, sqlx::Error> {
        let rows: Vec<WorldRow> = sqlx::query_as(
            r#"
            SELECT name, environment, seed, generate_structures,
                   spawn_x, spawn_y, spawn_z, adjust_spawn, loaded,
                   created_at, updated_at
            FROM worlds ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_world()).collect()
    }

    /// Delete a world record
    pub async fn delete(&self, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM worlds WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct WorldRow {
    name: String,
    environment: String,
    seed: i64,
    generate_structures: bool,
    spawn_x: f64,
    spawn_y: f64,
    spawn_z: f64,
    adjust_spawn: bool,
    loaded: bool,
    created_at: String,
    updated_at: String,
}

impl WorldRow {
    fn into_world(self) -> Result<World, sqlx::Error> {
        let environment = self
            .environment
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(World {
            spawn: Location::new(self.name.clone(), self.spawn_x, self.spawn_y, self.spawn_z),
            name: self.name,
            environment,
            seed: self.seed,
            generate_structures: self.generate_structures,
            adjust_spawn: self.adjust_spawn,
            loaded: self.loaded,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CreateWorldOptions, Environment, WorldManager};

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = WorldStore::open(None).await.unwrap();
        assert!(store.fetch("world").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_fetch() {
        let store = WorldStore::open(None).await.unwrap();
        let manager = WorldManager::new(None);
        let world = manager
            .create_world(
                CreateWorldOptions::world_name("hell")
                    .environment(Environment::Nether)
                    .seed(7)
                    .spawn_at(8.0, 70.0, 8.0),
            )
            .await
            .unwrap();

        store.upsert(&world).await.unwrap();

        let fetched = store.fetch("hell").await.unwrap().unwrap();
        assert_eq!(fetched.name, "hell");
        assert_eq!(fetched.environment, Environment::Nether);
        assert_eq!(fetched.seed, 7);
        assert_eq!(fetched.spawn, Location::new("hell", 8.0, 70.0, 8.0));
        assert!(fetched.loaded);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = WorldStore::open(None).await.unwrap();
        let manager = WorldManager::new(None);
        let mut world = manager
            .create_world(CreateWorldOptions::world_name("world"))
            .await
            .unwrap();

        store.upsert(&world).await.unwrap();

        world.loaded = false;
        store.upsert(&world).await.unwrap();

        let fetched = store.fetch("world").await.unwrap().unwrap();
        assert!(!fetched.loaded);

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_ordered() {
        let store = WorldStore::open(None).await.unwrap();
        let manager = WorldManager::new(None);
        for name in ["zeta", "alpha"] {
            let world = manager
                .create_world(CreateWorldOptions::world_name(name))
                .await
                .unwrap();
            store.upsert(&world).await.unwrap();
        }

        let all = store.fetch_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = WorldStore::open(None).await.unwrap();
        let manager = WorldManager::new(None);
        let world = manager
            .create_world(CreateWorldOptions::world_name("doomed"))
            .await
            .unwrap();
        store.upsert(&world).await.unwrap();

        assert!(store.delete("doomed").await.unwrap());
        assert!(!store.delete("doomed").await.unwrap());
        assert!(store.fetch("doomed").await.unwrap().is_none());
    }
}
