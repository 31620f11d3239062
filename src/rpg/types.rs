use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rpg::progression::{xp_threshold, LevelUpSummary};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const SNAPSHOT_SCHEMA_VERSION: u8 = 1;

/// Equipment slots a player can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

impl EquipSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weapon" | "sword" => Some(EquipSlot::Weapon),
            "armor" | "armour" | "shield" => Some(EquipSlot::Armor),
            _ => None,
        }
    }
}

/// An equipped item together with the exact stat bonus it applied, so that
/// unequipping always subtracts what was added even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub name: String,
    pub bonus: u32,
}

/// Lifetime activity counters. Never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub adventures_completed: u64,
    pub dungeons_completed: u64,
    pub work_shifts: u64,
    pub monsters_defeated: u64,
    pub total_coins_earned: u64,
    pub total_xp_earned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RareEvent {
    TreasureChest,
    MysteriousMerchant,
    AncientRelic,
    DragonBlessing,
    TimeAnomaly,
}

impl RareEvent {
    pub fn key(&self) -> &'static str {
        match self {
            RareEvent::TreasureChest => "treasure_chest",
            RareEvent::MysteriousMerchant => "mysterious_merchant",
            RareEvent::AncientRelic => "ancient_relic",
            RareEvent::DragonBlessing => "dragon_blessing",
            RareEvent::TimeAnomaly => "time_anomaly",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RareEvent::TreasureChest => "Legendary Treasure Chest",
            RareEvent::MysteriousMerchant => "Mysterious Merchant",
            RareEvent::AncientRelic => "Ancient Relic",
            RareEvent::DragonBlessing => "Dragon's Blessing",
            RareEvent::TimeAnomaly => "Time Anomaly",
        }
    }
}

/// Hidden luck bookkeeping. Players only ever see the derived status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckState {
    pub base_luck: f64,
    pub lucky_streak: u32,
    pub rare_events_found: Vec<RareEvent>,
    pub last_luck_check: Option<DateTime<Utc>>,
    pub double_rewards_until: Option<DateTime<Utc>>,
}

impl Default for LuckState {
    fn default() -> Self {
        Self {
            base_luck: 1.0,
            lucky_streak: 0,
            rare_events_found: Vec::new(),
            last_luck_check: None,
            double_rewards_until: None,
        }
    }
}

/// Stat block handed to brand new players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub coins: u64,
}

impl Default for StartingStats {
    fn default() -> Self {
        Self {
            hp: 100,
            attack: 10,
            defense: 5,
            coins: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: String,
    pub level: u32,
    pub xp: u64,
    pub xp_threshold: u64,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub coins: u64,
    pub inventory: Vec<String>,
    pub equipped: BTreeMap<EquipSlot, EquippedItem>,
    /// Ordered so the encoded record is byte-stable.
    pub cooldowns: BTreeMap<String, DateTime<Utc>>,
    pub counters: Counters,
    pub luck: LuckState,
    pub daily_streak: u32,
    pub achievements: Vec<String>,
    pub titles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(player_id: &str, stats: &StartingStats, now: DateTime<Utc>) -> Self {
        Self {
            player_id: player_id.to_string(),
            level: 1,
            xp: 0,
            xp_threshold: xp_threshold(1),
            hp: stats.hp,
            max_hp: stats.hp,
            attack: stats.attack,
            defense: stats.defense,
            coins: stats.coins,
            inventory: Vec::new(),
            equipped: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            counters: Counters::default(),
            luck: LuckState::default(),
            daily_streak: 0,
            achievements: Vec::new(),
            titles: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Position of the first inventory entry matching `name`, ignoring case.
    pub fn find_item(&self, name: &str) -> Option<usize> {
        let needle = name.trim();
        self.inventory
            .iter()
            .position(|held| held.eq_ignore_ascii_case(needle))
    }

    pub fn item_count(&self, name: &str) -> usize {
        self.inventory
            .iter()
            .filter(|held| held.eq_ignore_ascii_case(name))
            .count()
    }

    /// Appends `name` if there is room. Returns false when the bag is full.
    pub fn try_add_item(&mut self, name: &str, capacity: usize) -> bool {
        if self.inventory.len() >= capacity {
            return false;
        }
        self.inventory.push(name.to_string());
        true
    }

    /// Adds earned coins and the matching lifetime counter.
    pub fn credit_coins(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
        self.counters.total_coins_earned = self.counters.total_coins_earned.saturating_add(amount);
    }

    /// Adds raw xp. Callers run the level-up pass afterwards.
    pub fn grant_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_add(amount);
        self.counters.total_xp_earned = self.counters.total_xp_earned.saturating_add(amount);
    }

    /// Applies combat or trap damage without ever dropping a living player to zero.
    /// Returns the hp actually lost.
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        if self.hp == 0 {
            return 0;
        }
        let after = self.hp.saturating_sub(damage).max(1);
        let lost = self.hp - after;
        self.hp = after;
        lost
    }

    /// Restores up to `amount` hp. Returns the hp actually gained.
    pub fn restore_hp(&mut self, amount: u32) -> u32 {
        let after = self.hp.saturating_add(amount).min(self.max_hp);
        let gained = after - self.hp.min(after);
        self.hp = after;
        gained
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.titles.iter().any(|t| t == title)
    }
}

/// Read-only view of a player for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub level: u32,
    pub xp: u64,
    pub xp_threshold: u64,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub coins: u64,
    pub inventory: Vec<InventoryLine>,
    pub inventory_used: usize,
    pub inventory_capacity: usize,
    pub equipped: BTreeMap<String, String>,
    pub counters: Counters,
    pub daily_streak: u32,
    pub achievements: Vec<String>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLine {
    pub name: String,
    pub count: usize,
}

impl PlayerProfile {
    pub fn from_record(record: &PlayerRecord, inventory_capacity: usize) -> Self {
        let mut inventory: Vec<InventoryLine> = Vec::new();
        for item in &record.inventory {
            match inventory.iter_mut().find(|line| &line.name == item) {
                Some(line) => line.count += 1,
                None => inventory.push(InventoryLine {
                    name: item.clone(),
                    count: 1,
                }),
            }
        }
        let equipped = record
            .equipped
            .iter()
            .map(|(slot, item)| (slot.as_str().to_string(), item.name.clone()))
            .collect();
        Self {
            player_id: record.player_id.clone(),
            level: record.level,
            xp: record.xp,
            xp_threshold: record.xp_threshold,
            hp: record.hp,
            max_hp: record.max_hp,
            attack: record.attack,
            defense: record.defense,
            coins: record.coins,
            inventory,
            inventory_used: record.inventory.len(),
            inventory_capacity,
            equipped,
            counters: record.counters.clone(),
            daily_streak: record.daily_streak,
            achievements: record.achievements.clone(),
            titles: record.titles.clone(),
        }
    }
}

/// Net effect of an action, filled partly by the rules and partly by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deltas {
    pub coins: i64,
    pub hp: i64,
    pub xp_gained: u64,
    pub items_gained: Vec<String>,
    pub items_lost: Vec<String>,
    /// Reward items that did not fit in the inventory.
    pub items_left_behind: Vec<String>,
}

/// Outcome of the luck roll attached to an action, if one was made.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LuckReport {
    pub success: bool,
    pub multiplier: f64,
    pub effective_chance: f64,
    pub lucky_streak: u32,
    pub conditions: Vec<String>,
}

/// Typed result for the chat adapter. `success == false` means nothing was persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub action: String,
    pub success: bool,
    pub headline: String,
    pub narrative: Vec<String>,
    pub deltas: Deltas,
    pub level_up: Option<LevelUpSummary>,
    pub rare_event: Option<RareEvent>,
    pub luck: Option<LuckReport>,
    pub achievements_unlocked: Vec<String>,
}

impl ActionResult {
    pub fn success(action: &str, headline: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: true,
            headline: headline.into(),
            narrative: Vec::new(),
            deltas: Deltas::default(),
            level_up: None,
            rare_event: None,
            luck: None,
            achievements_unlocked: Vec::new(),
        }
    }

    /// A no-op outcome that must not be persisted.
    pub fn no_effect(action: &str, headline: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(action, headline)
        }
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.narrative.push(text.into());
    }

    /// Folds an extra level-up pass into the summary already carried by the result.
    pub fn merge_level_up(&mut self, extra: LevelUpSummary) {
        if extra.levels_gained == 0 {
            return;
        }
        self.level_up = Some(match self.level_up.take() {
            Some(first) => first.merge(extra),
            None => extra,
        });
    }

    /// Records coin and hp movement between the loaded and the final record.
    pub fn settle(&mut self, before: &PlayerRecord, after: &PlayerRecord) {
        self.deltas.coins = after.coins as i64 - before.coins as i64;
        self.deltas.hp = after.hp as i64 - before.hp as i64;
    }
}
