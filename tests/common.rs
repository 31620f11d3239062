//! Shared fixtures for integration tests.
//! Engines here are seeded and driven by a manual clock so outcomes are reproducible.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use questbot::config::Config;
use questbot::rpg::{Catalog, GameEngine, ManualClock, PlayerRecord};
use questbot::storage::{MemoryPlayerStore, PlayerStore};

/// 2024-03-14 10:00 UTC: not midnight and not a prime-time hour.
pub fn fixed_start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn seeded_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.game.rng_seed = Some(seed);
    config
}

#[allow(dead_code)]
pub struct Harness {
    pub engine: GameEngine,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn PlayerStore>,
}

#[allow(dead_code)]
pub fn harness_with(store: Arc<dyn PlayerStore>, config: &Config) -> Harness {
    let clock = Arc::new(ManualClock::new(fixed_start()));
    let engine = GameEngine::new(Arc::clone(&store), Catalog::standard(), config)
        .with_clock(clock.clone());
    Harness {
        engine,
        clock,
        store,
    }
}

#[allow(dead_code)]
pub fn memory_harness(seed: u64) -> Harness {
    harness_with(Arc::new(MemoryPlayerStore::new()), &seeded_config(seed))
}

/// Overwrite a stored record after letting the test tweak it.
#[allow(dead_code)]
pub fn edit_record(store: &Arc<dyn PlayerStore>, player_id: &str, edit: impl FnOnce(&mut PlayerRecord)) {
    let mut record = store.get(player_id).expect("record exists");
    edit(&mut record);
    store.put(&record).expect("put edited record");
}
