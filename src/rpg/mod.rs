//! Game rules and the engine that applies them.
//!
//! The rule modules (`progression`, `luck`, `economy`, `encounter`, `cooldown`,
//! `leaderboard`, `achievement`) are synchronous and operate on an in-memory
//! [`PlayerRecord`]. [`GameEngine`] wraps them with locking and persistence.

pub mod achievement;
pub mod catalog;
pub mod clock;
pub mod commands;
pub mod context;
pub mod cooldown;
pub mod economy;
pub mod encounter;
pub mod engine;
pub mod errors;
pub mod leaderboard;
pub mod locks;
pub mod luck;
pub mod progression;
pub mod types;

pub use catalog::{Catalog, CatalogError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{handle_request, ActionRequest, GameCommand, Reply};
pub use cooldown::ActionKind;
pub use engine::GameEngine;
pub use errors::GameError;
pub use leaderboard::{LeaderboardEntry, LeaderboardStat};
pub use luck::LuckStatus;
pub use types::{ActionResult, EquipSlot, PlayerProfile, PlayerRecord};
