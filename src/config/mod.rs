//! # Configuration Management Module
//!
//! Questbot reads a single TOML file split into logical sections:
//!
//! - [`GameConfig`] - level cap, starting stat block, inventory size, catalog and RNG seed
//! - [`CooldownConfig`] - per-action cooldowns in seconds
//! - [`StorageConfig`] - sled location, store timeout and snapshot schedule
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! ```rust,no_run
//! use questbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("questbot.toml").await?;
//!     let config = Config::load("questbot.toml").await?;
//!     println!("Level cap: {}", config.game.max_level);
//!     Ok(())
//! }
//! ```
//!
//! ```toml
//! [game]
//! max_level = 100
//! inventory_capacity = 50
//!
//! [cooldowns]
//! adventure_secs = 300
//! work_secs = 3600
//!
//! [storage]
//! data_dir = "data"
//! snapshot_interval_minutes = 60
//! snapshot_retention_days = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::rpg::cooldown::MAX_COOLDOWN_SECS;
use crate::rpg::types::StartingStats;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub max_level: u32,
    pub starting_hp: u32,
    pub starting_attack: u32,
    pub starting_defense: u32,
    pub starting_coins: u64,
    pub inventory_capacity: usize,
    /// Optional JSON catalog replacing the built-in content.
    pub catalog_path: Option<String>,
    /// Seed for reproducible outcomes. Leave unset in production.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_level: 100,
            starting_hp: 100,
            starting_attack: 10,
            starting_defense: 5,
            starting_coins: 100,
            inventory_capacity: 50,
            catalog_path: None,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn starting_stats(&self) -> StartingStats {
        StartingStats {
            hp: self.starting_hp,
            attack: self.starting_attack,
            defense: self.starting_defense,
            coins: self.starting_coins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub adventure_secs: u64,
    pub dungeon_secs: u64,
    pub work_secs: u64,
    pub daily_secs: u64,
    pub heal_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            adventure_secs: 300,
            dungeon_secs: 600,
            work_secs: 3600,
            daily_secs: 86_400,
            heal_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Override for the sled directory; defaults to `<data_dir>/players`.
    pub db_path: Option<String>,
    /// Upper bound on a single store call before the action fails as unavailable.
    pub store_timeout_ms: u64,
    pub snapshots_enabled: bool,
    pub snapshot_interval_minutes: u64,
    pub snapshot_retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_path: None,
            store_timeout_ms: 5_000,
            snapshots_enabled: true,
            snapshot_interval_minutes: 60,
            snapshot_retention_days: 30,
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("players"),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.game.max_level == 0 {
            return Err(anyhow!("game.max_level must be at least 1"));
        }
        if self.game.starting_hp == 0 {
            return Err(anyhow!("game.starting_hp must be at least 1"));
        }
        if self.game.inventory_capacity == 0 {
            return Err(anyhow!("game.inventory_capacity must be at least 1"));
        }
        let cooldowns = &self.cooldowns;
        for (name, secs) in [
            ("adventure_secs", cooldowns.adventure_secs),
            ("dungeon_secs", cooldowns.dungeon_secs),
            ("work_secs", cooldowns.work_secs),
            ("daily_secs", cooldowns.daily_secs),
            ("heal_secs", cooldowns.heal_secs),
        ] {
            if secs > MAX_COOLDOWN_SECS {
                return Err(anyhow!(
                    "cooldowns.{} must be at most {} seconds",
                    name,
                    MAX_COOLDOWN_SECS
                ));
            }
        }
        if self.storage.store_timeout_ms == 0 {
            return Err(anyhow!("storage.store_timeout_ms must be greater than zero"));
        }
        if self.storage.snapshots_enabled && self.storage.snapshot_interval_minutes == 0 {
            return Err(anyhow!(
                "storage.snapshot_interval_minutes must be greater than zero when snapshots are enabled"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_classic_game() {
        let config = Config::default();
        assert_eq!(config.game.max_level, 100);
        assert_eq!(config.game.inventory_capacity, 50);
        assert_eq!(config.game.starting_stats(), StartingStats::default());
        assert_eq!(config.cooldowns.adventure_secs, 300);
        assert_eq!(config.cooldowns.daily_secs, 86_400);
        assert_eq!(config.storage.db_path(), PathBuf::from("data").join("players"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [game]
            max_level = 50

            [cooldowns]
            work_secs = 10
            "#,
        )
        .expect("parse");
        assert_eq!(config.game.max_level, 50);
        assert_eq!(config.game.starting_coins, 100);
        assert_eq!(config.cooldowns.work_secs, 10);
        assert_eq!(config.cooldowns.heal_secs, 1800);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn validation_rejects_unusable_values() {
        let mut config = Config::default();
        config.game.inventory_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.store_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cooldowns.daily_secs = u64::MAX;
        let err = config.validate().expect_err("huge cooldown");
        assert!(err.to_string().contains("daily_secs"));
    }

    #[tokio::test]
    async fn default_file_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("questbot.toml");
        let path = path.to_str().expect("utf8 path");
        Config::create_default(path).await.expect("write");
        let loaded = Config::load(path).await.expect("load");
        assert_eq!(loaded.cooldowns, CooldownConfig::default());
        assert_eq!(loaded.storage.snapshot_retention_days, 30);
    }
}
