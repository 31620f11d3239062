//! # Questbot - RPG Progression Engine for Chat Games
//!
//! Questbot is the game engine behind a chat-delivered text RPG. Players issue short
//! commands (`adventure`, `dungeon`, `work`, `buy`, ...) and the engine resolves each one
//! against persistent per-player state, rolls randomized outcomes through a hidden luck
//! layer, and hands back a typed result for the chat adapter to render.
//!
//! ## Features
//!
//! - **Progression**: Polynomial XP curve with multi-level jumps and randomized stat gains.
//! - **Encounters**: Weighted adventures with combat, and multi-floor dungeon runs.
//! - **Economy**: Shop, selling, consumables, weapon and armor slots, work shifts and daily rewards.
//! - **Luck**: Hidden time and identity based boosts, lucky streaks and ultra-rare events.
//! - **Persistence**: Sled-backed player records with periodic snapshots and retention.
//! - **Async Design**: Tokio with per-player serialization and bounded store calls.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use questbot::config::Config;
//! use questbot::rpg::{Catalog, GameEngine};
//! use questbot::storage::SledPlayerStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("questbot.toml").await?;
//!     let store = Arc::new(SledPlayerStore::open(config.storage.db_path())?);
//!     let engine = GameEngine::new(store, Catalog::standard(), &config);
//!
//!     engine.start("1234").await?;
//!     let result = engine.adventure("1234").await?;
//!     println!("{}", result.headline);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`rpg`] - Game rules, the engine façade and the command layer
//! - [`storage`] - Player persistence and snapshot scheduling
//! - [`config`] - Configuration management and validation
//! - [`validation`] - Player id and argument checks
//! - [`metrics`] - Process-wide action counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Chat adapter   │ ← ActionRequest in, Reply out
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   GameEngine    │ ← Locks, cooldowns, rules, achievements
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   PlayerStore   │ ← Sled or in-memory persistence
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod rpg;
pub mod storage;
pub mod validation;
