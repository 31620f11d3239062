use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use crate::config::GameConfig;
use crate::rpg::catalog::Catalog;

/// Everything a rule needs besides the player record.
pub struct ActionContext<'a> {
    pub catalog: &'a Catalog,
    pub game: &'a GameConfig,
    pub now: DateTime<Utc>,
    pub rng: &'a mut StdRng,
}

impl<'a> ActionContext<'a> {
    pub fn new(catalog: &'a Catalog, game: &'a GameConfig, now: DateTime<Utc>, rng: &'a mut StdRng) -> Self {
        Self {
            catalog,
            game,
            now,
            rng,
        }
    }

    pub fn capacity(&self) -> usize {
        self.game.inventory_capacity
    }

    pub fn max_level(&self) -> u32 {
        self.game.max_level
    }
}
