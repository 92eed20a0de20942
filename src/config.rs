//! Engine configuration
//!
//! Tunables for persistence, permission granularity, and the safe-spot
//! search. Values come from defaults, an optional TOML file, and
//! `WARPCORE_`-prefixed environment variables, in that order.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default horizontal search radius (blocks) for the safe-spot scan
pub const DEFAULT_SEARCH_RADIUS: i64 = 3;

/// Default vertical search range (blocks) for the safe-spot scan
pub const DEFAULT_SEARCH_HEIGHT: i64 = 3;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the world database file. `None` keeps everything in memory.
    pub db_path: Option<String>,
    /// When true, teleport permission nodes include the destination name
    /// (`...self.w.otherworld`); when false, the type-level node
    /// (`...self.w`) covers every destination of that type.
    #[serde(default = "default_finer")]
    pub finer_teleport_permissions: bool,
    /// Horizontal radius of the safe-spot search, in blocks
    #[serde(default = "default_radius")]
    pub safety_search_radius: i64,
    /// Vertical range of the safe-spot search, in blocks
    #[serde(default = "default_height")]
    pub safety_search_height: i64,
}

fn default_finer() -> bool {
    true
}

fn default_radius() -> i64 {
    DEFAULT_SEARCH_RADIUS
}

fn default_height() -> i64 {
    DEFAULT_SEARCH_HEIGHT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            finer_teleport_permissions: true,
            safety_search_radius: DEFAULT_SEARCH_RADIUS,
            safety_search_height: DEFAULT_SEARCH_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file overlaid with `WARPCORE_*`
    /// environment variables. Missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(
            EngineConfig::default(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WARPCORE_"))
        .extract()
    }

    /// Set the database path
    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Set finer teleport permission granularity
    pub fn with_finer_permissions(mut self, finer: bool) -> Self {
        self.finer_teleport_permissions = finer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.db_path.is_none());
        assert!(config.finer_teleport_permissions);
        assert_eq!(config.safety_search_radius, DEFAULT_SEARCH_RADIUS);
        assert_eq!(config.safety_search_height, DEFAULT_SEARCH_HEIGHT);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = EngineConfig::load("/nonexistent/warpcore.toml").unwrap();
        assert!(config.db_path.is_none());
        assert!(config.finer_teleport_permissions);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warpcore.toml");
        std::fs::write(
            &path,
            "db_path = \"/data/worlds.db\"\nfiner_teleport_permissions = false\nsafety_search_radius = 8\n",
        )
        .unwrap();

        let config = EngineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.db_path, Some("/data/worlds.db".to_string()));
        assert!(!config.finer_teleport_permissions);
        assert_eq!(config.safety_search_radius, 8);
        assert_eq!(config.safety_search_height, DEFAULT_SEARCH_HEIGHT);
    }

    #[test]
    fn test_with_builders() {
        let config = EngineConfig::default()
            .with_db_path("/data/worlds.db")
            .with_finer_permissions(false);
        assert_eq!(config.db_path, Some("/data/worlds.db".to_string()));
        assert!(!config.finer_teleport_permissions);
    }
}
