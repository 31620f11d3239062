//! # Game Engine
//!
//! The façade every adapter talks to. One call resolves one player action:
//!
//! ```text
//! validate id -> lock player -> load -> cooldown gate -> rules (pure, in memory)
//!   -> stamp cooldown -> achievements -> single write -> unlock -> ActionResult
//! ```
//!
//! Rules never touch the store. The record is cloned before the rules run and
//! only the final copy is written, so any rejection leaves the stored record
//! byte-for-byte as it was. Store calls run on tokio's blocking pool under the
//! configured timeout.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, CooldownConfig, GameConfig};
use crate::logutil::escape_log;
use crate::metrics::{self, ActionOutcome};
use crate::rpg::achievement;
use crate::rpg::catalog::{Catalog, ShopSection};
use crate::rpg::clock::{Clock, SystemClock};
use crate::rpg::context::ActionContext;
use crate::rpg::cooldown::{self, ActionKind};
use crate::rpg::economy;
use crate::rpg::encounter;
use crate::rpg::errors::GameError;
use crate::rpg::leaderboard::{self, LeaderboardEntry, LeaderboardStat};
use crate::rpg::locks::{PlayerGuard, PlayerLocks};
use crate::rpg::luck::{self, LuckStatus};
use crate::rpg::types::{ActionResult, EquipSlot, PlayerProfile, PlayerRecord};
use crate::storage::{PlayerStore, SnapshotRecord, StoreError, StoreStats};
use crate::validation::{normalize_item_name, validate_player_id};

/// Shared handle to the game. Cloning is cheap and clones share locks, store and clock.
#[derive(Clone)]
pub struct GameEngine {
    store: Arc<dyn PlayerStore>,
    catalog: Arc<Catalog>,
    game: Arc<GameConfig>,
    cooldowns: CooldownConfig,
    store_timeout: Duration,
    clock: Arc<dyn Clock>,
    locks: PlayerLocks,
    seeded: Option<Arc<Mutex<StdRng>>>,
}

impl GameEngine {
    pub fn new(store: Arc<dyn PlayerStore>, catalog: Catalog, config: &Config) -> Self {
        let seeded = config
            .game
            .rng_seed
            .map(|seed| Arc::new(Mutex::new(StdRng::seed_from_u64(seed))));
        Self {
            store,
            catalog: Arc::new(catalog),
            game: Arc::new(config.game.clone()),
            cooldowns: config.cooldowns.clone(),
            store_timeout: config.storage.store_timeout(),
            clock: Arc::new(SystemClock),
            locks: PlayerLocks::new(),
            seeded,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.game
    }

    /// Number of players currently holding or waiting on a lock.
    pub fn active_locks(&self) -> usize {
        self.locks.tracked()
    }

    // ---- store plumbing ----

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PlayerStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));
        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(StoreError::Internal(format!("store task failed: {}", join))),
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        }
    }

    /// Waits at most the store timeout for the player's lock. A write that has
    /// not confirmed yet still holds it.
    async fn acquire(&self, player_id: &str) -> Result<PlayerGuard, GameError> {
        tokio::time::timeout(self.store_timeout, self.locks.lock(player_id))
            .await
            .map_err(|_| GameError::StoreUnavailable(StoreError::Timeout(self.store_timeout)))
    }

    async fn load(&self, player_id: &str) -> Result<PlayerRecord, GameError> {
        let id = player_id.to_string();
        match self.blocking(move |store| store.get(&id)).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(GameError::NotStarted),
            Err(e) => Err(GameError::StoreUnavailable(e)),
        }
    }

    /// Writes the record while still holding the player's lock. The guard moves
    /// into the blocking task, so a timed-out write keeps the player locked until
    /// it actually lands or fails. A timeout here is reported as
    /// [`StoreError::WriteUnconfirmed`] because the write may still be applied.
    async fn save(&self, record: PlayerRecord, guard: PlayerGuard) -> Result<(), GameError> {
        self.blocking(move |store| {
            let outcome = store.put(&record);
            drop(guard);
            outcome
        })
        .await
        .map_err(|e| match e {
            StoreError::Timeout(after) => StoreError::WriteUnconfirmed(after),
            other => other,
        })
        .map_err(GameError::StoreUnavailable)
    }

    fn action_rng(&self) -> StdRng {
        match &self.seeded {
            Some(master) => {
                let seed: u64 = master.lock().unwrap_or_else(PoisonError::into_inner).gen();
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        }
    }

    fn observe<T>(action: &str, outcome: &Result<T, GameError>, succeeded: impl Fn(&T) -> bool) {
        let kind = match outcome {
            Ok(value) if succeeded(value) => ActionOutcome::Success,
            Ok(_) => ActionOutcome::Rejected,
            Err(GameError::StoreUnavailable(_)) => ActionOutcome::StoreFailure,
            Err(_) => ActionOutcome::Rejected,
        };
        metrics::record_action(action, kind);
    }

    // ---- action pipeline ----

    async fn run_action<F>(
        &self,
        player_id: &str,
        label: &'static str,
        gate: Option<ActionKind>,
        op: F,
    ) -> Result<ActionResult, GameError>
    where
        F: FnOnce(&mut PlayerRecord, &mut ActionContext<'_>) -> Result<ActionResult, GameError> + Send,
    {
        metrics::record_action(label, ActionOutcome::Attempt);
        let outcome = self.resolve(player_id, label, gate, op).await;
        Self::observe(label, &outcome, |result| result.success);
        match &outcome {
            Ok(result) if result.success => {
                info!("{} {}: {}", escape_log(player_id), label, result.headline)
            }
            Ok(result) => debug!("{} {} had no effect: {}", escape_log(player_id), label, result.headline),
            Err(e) if e.is_retryable() || e.outcome_unknown() => warn!("{} {} failed: {}", escape_log(player_id), label, e),
            Err(e) => debug!("{} {} rejected: {}", escape_log(player_id), label, e),
        }
        outcome
    }

    async fn resolve<F>(
        &self,
        player_id: &str,
        label: &'static str,
        gate: Option<ActionKind>,
        op: F,
    ) -> Result<ActionResult, GameError>
    where
        F: FnOnce(&mut PlayerRecord, &mut ActionContext<'_>) -> Result<ActionResult, GameError> + Send,
    {
        validate_player_id(player_id)?;
        let guard = self.acquire(player_id).await?;
        let before = self.load(player_id).await?;
        let now = self.clock.now();
        if let Some(kind) = gate {
            cooldown::check(&before, kind, &self.cooldowns, now)?;
        }

        let mut record = before.clone();
        let mut rng = self.action_rng();
        let mut result = {
            let mut ctx = ActionContext::new(&self.catalog, &self.game, now, &mut rng);
            op(&mut record, &mut ctx)?
        };
        if !result.success {
            return Ok(result);
        }

        if let Some(kind) = gate {
            cooldown::stamp(&mut record, kind, now);
        }
        let award = achievement::award(&mut record, &self.catalog, &mut rng, self.game.max_level);
        if !award.unlocked.is_empty() {
            for name in &award.unlocked {
                result.line(format!("Achievement unlocked: {}!", name));
            }
            result.deltas.xp_gained += award.xp;
            result.merge_level_up(award.level_up);
            result.achievements_unlocked.extend(award.unlocked);
        }
        result.settle(&before, &record);
        record.touch(now);
        debug!("{} {} persisting", escape_log(player_id), label);
        self.save(record, guard).await?;
        Ok(result)
    }

    // ---- public operations ----

    /// Creates the player with the configured starting stat block.
    pub async fn start(&self, player_id: &str) -> Result<PlayerProfile, GameError> {
        metrics::record_action("start", ActionOutcome::Attempt);
        let outcome = self.create(player_id).await;
        Self::observe("start", &outcome, |_| true);
        if outcome.is_ok() {
            info!("new player started: {}", escape_log(player_id));
        }
        outcome
    }

    async fn create(&self, player_id: &str) -> Result<PlayerProfile, GameError> {
        validate_player_id(player_id)?;
        let guard = self.acquire(player_id).await?;
        let id = player_id.to_string();
        if self.blocking(move |store| store.contains(&id)).await? {
            return Err(GameError::AlreadyStarted);
        }
        let record = PlayerRecord::new(player_id, &self.game.starting_stats(), self.clock.now());
        let profile = PlayerProfile::from_record(&record, self.game.inventory_capacity);
        self.save(record, guard).await?;
        Ok(profile)
    }

    pub async fn profile(&self, player_id: &str) -> Result<PlayerProfile, GameError> {
        validate_player_id(player_id)?;
        let record = self.load(player_id).await?;
        Ok(PlayerProfile::from_record(&record, self.game.inventory_capacity))
    }

    /// Read-only look at the hidden luck state. Nothing is persisted.
    pub async fn luck_status(&self, player_id: &str) -> Result<LuckStatus, GameError> {
        validate_player_id(player_id)?;
        let record = self.load(player_id).await?;
        let mut rng = self.action_rng();
        Ok(luck::luck_status(&record, self.clock.now(), &mut rng))
    }

    pub async fn adventure(&self, player_id: &str) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "adventure", Some(ActionKind::Adventure), encounter::adventure)
            .await
    }

    pub async fn dungeon(&self, player_id: &str) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "dungeon", Some(ActionKind::Dungeon), encounter::dungeon)
            .await
    }

    pub async fn work(&self, player_id: &str) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "work", Some(ActionKind::Work), economy::work)
            .await
    }

    pub async fn daily(&self, player_id: &str) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "daily", Some(ActionKind::Daily), economy::daily)
            .await
    }

    pub async fn heal(&self, player_id: &str) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "heal", Some(ActionKind::Heal), |record, _| {
            economy::heal(record)
        })
        .await
    }

    pub async fn buy(&self, player_id: &str, item: &str) -> Result<ActionResult, GameError> {
        let name = normalize_item_name(item)?;
        self.run_action(player_id, "buy", None, move |record, ctx| {
            economy::buy(record, ctx, &name)
        })
        .await
    }

    pub async fn sell(&self, player_id: &str, item: &str) -> Result<ActionResult, GameError> {
        let name = normalize_item_name(item)?;
        self.run_action(player_id, "sell", None, move |record, ctx| {
            economy::sell(record, ctx, &name)
        })
        .await
    }

    pub async fn use_item(&self, player_id: &str, item: &str) -> Result<ActionResult, GameError> {
        let name = normalize_item_name(item)?;
        self.run_action(player_id, "use", None, move |record, ctx| {
            economy::use_item(record, ctx, &name)
        })
        .await
    }

    pub async fn unequip(&self, player_id: &str, slot: EquipSlot) -> Result<ActionResult, GameError> {
        self.run_action(player_id, "unequip", None, move |record, ctx| {
            economy::unequip(record, ctx, slot)
        })
        .await
    }

    pub fn shop(&self) -> Vec<ShopSection> {
        self.catalog.shop_sections()
    }

    /// Ranks every stored player. Takes no player locks.
    pub async fn leaderboard(
        &self,
        stat: LeaderboardStat,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, GameError> {
        let limit = leaderboard::validate_limit(limit)?;
        let entries = self
            .blocking(move |store| leaderboard::rank(store.scan(), stat, limit))
            .await?;
        Ok(entries)
    }

    pub async fn snapshot(&self, player_id: &str) -> Result<SnapshotRecord, GameError> {
        validate_player_id(player_id)?;
        let id = player_id.to_string();
        let now = self.clock.now();
        match self.blocking(move |store| store.snapshot(&id, now)).await {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::NotFound(_)) => Err(GameError::NotStarted),
            Err(e) => Err(GameError::StoreUnavailable(e)),
        }
    }

    pub async fn list_snapshots(&self, player_id: &str) -> Result<Vec<SnapshotRecord>, GameError> {
        validate_player_id(player_id)?;
        let id = player_id.to_string();
        Ok(self.blocking(move |store| store.list_snapshots(&id)).await?)
    }

    /// Snapshots every stored player, one store call per player. Returns how many were taken.
    pub async fn snapshot_all(&self) -> Result<usize, GameError> {
        let ids = self
            .blocking(|store| store.scan().map(|item| item.map(|(id, _)| id)).collect::<Result<Vec<_>, _>>())
            .await?;
        let mut taken = 0;
        for id in ids {
            match self.snapshot(&id).await {
                Ok(_) => taken += 1,
                Err(GameError::NotStarted) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(taken)
    }

    pub async fn purge_snapshots(&self, max_age: chrono::Duration) -> Result<usize, GameError> {
        let now = self.clock.now();
        Ok(self
            .blocking(move |store| store.purge_snapshots_older_than(max_age, now))
            .await?)
    }

    pub async fn stats(&self) -> Result<StoreStats, GameError> {
        Ok(self.blocking(|store| store.stats()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::clock::ManualClock;
    use crate::storage::MemoryPlayerStore;

    fn engine() -> (GameEngine, Arc<ManualClock>) {
        let mut config = Config::default();
        config.game.rng_seed = Some(42);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = GameEngine::new(Arc::new(MemoryPlayerStore::new()), Catalog::standard(), &config)
            .with_clock(clock.clone());
        (engine, clock)
    }

    #[tokio::test]
    async fn actions_require_start() {
        let (engine, _) = engine();
        assert!(matches!(engine.work("nobody").await, Err(GameError::NotStarted)));
        assert!(matches!(engine.profile("nobody").await, Err(GameError::NotStarted)));
    }

    #[tokio::test]
    async fn start_is_once_only() {
        let (engine, _) = engine();
        let profile = engine.start("p1").await.expect("start");
        assert_eq!(profile.level, 1);
        assert!(matches!(engine.start("p1").await, Err(GameError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected_before_the_store() {
        let (engine, _) = engine();
        assert!(matches!(engine.start("bad:id").await, Err(GameError::InvalidArgument(_))));
        assert!(matches!(engine.adventure("").await, Err(GameError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn work_stamps_cooldown_and_pays() {
        let (engine, clock) = engine();
        engine.start("w").await.expect("start");
        let result = engine.work("w").await.expect("work");
        assert!(result.success);
        assert!(result.deltas.coins > 0);

        match engine.work("w").await {
            Err(GameError::OnCooldown { action, remaining_secs }) => {
                assert_eq!(action, "work");
                assert_eq!(remaining_secs, 3600);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }

        clock.advance(chrono::Duration::seconds(3600));
        assert!(engine.work("w").await.is_ok());
        assert_eq!(engine.profile("w").await.expect("profile").counters.work_shifts, 2);
    }

    #[tokio::test]
    async fn no_effect_results_do_not_stamp() {
        let (engine, _) = engine();
        engine.start("h").await.expect("start");
        let result = engine.heal("h").await.expect("heal");
        assert!(!result.success);
        // Still usable because nothing was stamped.
        assert!(!engine.heal("h").await.expect("heal again").success);
    }

    #[tokio::test]
    async fn lock_table_is_empty_after_actions() {
        let (engine, _) = engine();
        engine.start("l").await.expect("start");
        engine.daily("l").await.expect("daily");
        assert_eq!(engine.active_locks(), 0);
    }
}
