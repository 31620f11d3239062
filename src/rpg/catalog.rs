//! Static game content: items, monsters, encounter tables, jobs and achievements.
//!
//! The built-in content lives in [`Catalog::standard`]. Operators can ship their
//! own content as JSON with the same shape; it is validated and indexed once at
//! load time so the rules never have to interpret untyped data.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Inclusive integer range used for every randomized reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: u64,
    pub max: u64,
}

impl Span {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// What happens when a consumable is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Restore `amount` hp plus a uniform jitter in `[jitter_min, jitter_max]`.
    Heal {
        amount: u32,
        jitter_min: i32,
        jitter_max: i32,
    },
    /// Permanent flat stat increase.
    Boost { attack: u32, defense: u32, max_hp: u32 },
    /// Permanent increase of one randomly chosen stat.
    RandomBoost { min: u32, max: u32 },
    GrantXp { min: u64, max: u64 },
    Luck { amount: f64 },
    /// Has flavour but no mechanical use.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Weapon { attack: u32 },
    Armor { defense: u32 },
    Consumable { effect: Effect },
    /// Loot that can only be sold.
    Trinket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default)]
    pub price: Option<u64>,
    pub rarity: Rarity,
    #[serde(default)]
    pub in_shop: bool,
    #[serde(default)]
    pub description: String,
}

impl ItemDef {
    /// Shop section heading for this item.
    pub fn category(&self) -> &'static str {
        match &self.kind {
            ItemKind::Weapon { .. } => "Weapons",
            ItemKind::Armor { .. } => "Armor",
            ItemKind::Consumable {
                effect: Effect::Heal { .. } | Effect::Boost { .. } | Effect::Inert,
            } => "Consumables",
            ItemKind::Consumable { .. } | ItemKind::Trinket => "Misc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDef {
    pub name: String,
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub xp: u64,
    pub coins: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterTier {
    Common,
    Uncommon,
    Rare,
    Boss,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTable {
    pub common: Vec<MonsterDef>,
    pub uncommon: Vec<MonsterDef>,
    pub rare: Vec<MonsterDef>,
    pub boss: Vec<MonsterDef>,
}

impl MonsterTable {
    pub fn tier(&self, tier: MonsterTier) -> &[MonsterDef] {
        match tier {
            MonsterTier::Common => &self.common,
            MonsterTier::Uncommon => &self.uncommon,
            MonsterTier::Rare => &self.rare,
            MonsterTier::Boss => &self.boss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Treasure,
    Monster,
    Merchant,
    Mystery,
    RareFind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureOutcomeDef {
    pub kind: OutcomeKind,
    pub weight: u32,
    pub coins: Span,
    pub xp: Span,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorKind {
    Enemy,
    Trap,
    Treasure,
    Boss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDef {
    pub kind: FloorKind,
    pub weight: u32,
    /// Only eligible on the last floor of a run.
    #[serde(default)]
    pub final_only: bool,
    /// Overrides of the per-floor base rewards.
    #[serde(default)]
    pub coins: Option<Span>,
    #[serde(default)]
    pub xp: Option<Span>,
    #[serde(default)]
    pub damage: Option<Span>,
    #[serde(default)]
    pub item_chance: f64,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonRules {
    pub min_level: u32,
    pub min_hp: u32,
    pub floors: Span,
    pub base_coins: Span,
    pub base_xp: Span,
    /// Enemy floors deeper than this pull from the uncommon tier.
    pub elite_after_floor: u32,
    pub level_bonus_percent: u64,
    pub floor_types: Vec<FloorDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkJob {
    pub name: String,
    pub coins: Span,
    pub xp: Span,
    pub description: String,
}

/// Longest daily streak window a catalog may configure: one year.
pub const MAX_STREAK_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRules {
    pub base: u64,
    pub per_level: u64,
    pub bonus_chance: f64,
    pub bonus: Span,
    /// Milestones as `(streak_day, coins)`.
    pub streak_bonuses: Vec<(u32, u64)>,
    pub streak_window_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementRequirement {
    AdventuresCompleted,
    DungeonsCompleted,
    Coins,
    Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requirement: AchievementRequirement,
    pub threshold: u64,
    pub reward_coins: u64,
    pub reward_xp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RareRewardTable {
    pub merchant_items: Vec<String>,
    pub relic_items: Vec<String>,
}

/// Everything the rules need that is not per-player state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub items: Vec<ItemDef>,
    pub monsters: MonsterTable,
    pub adventure_outcomes: Vec<AdventureOutcomeDef>,
    pub adventure_locations: Vec<String>,
    pub rare_find_items: Vec<String>,
    pub dungeon_types: Vec<String>,
    pub dungeon: DungeonRules,
    pub jobs: Vec<WorkJob>,
    pub daily: DailyRules,
    pub achievements: Vec<AchievementDef>,
    pub rare_rewards: RareRewardTable,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Shop section as shown to players.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopSection {
    pub category: &'static str,
    pub items: Vec<ShopEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopEntry {
    pub name: String,
    pub price: u64,
    pub rarity: Rarity,
    pub description: String,
}

/// Weighted choice that treats an all-zero table as "nothing to pick".
pub fn pick_weighted<'a, T, R, F>(entries: &'a [T], rng: &mut R, weight: F) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> u32,
{
    entries.choose_weighted(rng, weight).ok()
}

impl Catalog {
    /// Load a catalog from a JSON file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(contents)?;
        catalog.finalize()
    }

    /// Build the name index and reject content the rules could not use.
    pub fn finalize(mut self) -> Result<Self, CatalogError> {
        self.index.clear();
        for (pos, item) in self.items.iter().enumerate() {
            let key = item.name.to_ascii_lowercase();
            if self.index.insert(key, pos).is_some() {
                return Err(CatalogError::Invalid(format!("duplicate item {}", item.name)));
            }
            if item.in_shop && item.price.is_none() {
                return Err(CatalogError::Invalid(format!(
                    "shop item {} has no price",
                    item.name
                )));
            }
            if let ItemKind::Consumable {
                effect: Effect::RandomBoost { min, max },
            } = &item.kind
            {
                if min > max {
                    return Err(CatalogError::Invalid(format!("bad boost range on {}", item.name)));
                }
            }
            if let ItemKind::Consumable {
                effect: Effect::GrantXp { min, max },
            } = &item.kind
            {
                if min > max {
                    return Err(CatalogError::Invalid(format!("bad xp range on {}", item.name)));
                }
            }
        }

        let outcome_weight: u32 = self.adventure_outcomes.iter().map(|o| o.weight).sum();
        if outcome_weight == 0 {
            return Err(CatalogError::Invalid("adventure outcomes have no weight".into()));
        }
        if self.adventure_locations.is_empty() || self.dungeon_types.is_empty() {
            return Err(CatalogError::Invalid("locations and dungeon types must not be empty".into()));
        }
        if self.jobs.is_empty() {
            return Err(CatalogError::Invalid("at least one job is required".into()));
        }
        if self.monsters.common.is_empty()
            || self.monsters.uncommon.is_empty()
            || self.monsters.rare.is_empty()
        {
            return Err(CatalogError::Invalid("monster tiers must not be empty".into()));
        }
        let regular_floor_weight: u32 = self
            .dungeon
            .floor_types
            .iter()
            .filter(|f| !f.final_only)
            .map(|f| f.weight)
            .sum();
        if regular_floor_weight == 0 {
            return Err(CatalogError::Invalid("dungeon floors have no weight".into()));
        }
        if !(1..=MAX_STREAK_WINDOW_HOURS).contains(&self.daily.streak_window_hours) {
            return Err(CatalogError::Invalid(format!(
                "daily.streak_window_hours must be between 1 and {}",
                MAX_STREAK_WINDOW_HOURS
            )));
        }
        if self.dungeon.floors.min == 0 {
            return Err(CatalogError::Invalid("dungeons need at least one floor".into()));
        }

        let mut spans: Vec<(String, Span)> = vec![
            ("dungeon.floors".into(), self.dungeon.floors),
            ("dungeon.base_coins".into(), self.dungeon.base_coins),
            ("dungeon.base_xp".into(), self.dungeon.base_xp),
            ("daily.bonus".into(), self.daily.bonus),
        ];
        for outcome in &self.adventure_outcomes {
            spans.push((format!("{:?}.coins", outcome.kind), outcome.coins));
            spans.push((format!("{:?}.xp", outcome.kind), outcome.xp));
        }
        for job in &self.jobs {
            spans.push((format!("{}.coins", job.name), job.coins));
            spans.push((format!("{}.xp", job.name), job.xp));
        }
        for floor in &self.dungeon.floor_types {
            for span in [floor.coins, floor.xp, floor.damage].into_iter().flatten() {
                spans.push((format!("{:?} floor", floor.kind), span));
            }
            if !(0.0..=1.0).contains(&floor.item_chance) {
                return Err(CatalogError::Invalid(format!(
                    "{:?} floor item chance out of range",
                    floor.kind
                )));
            }
        }
        if let Some((label, _)) = spans.iter().find(|(_, span)| span.min > span.max) {
            return Err(CatalogError::Invalid(format!("{} has min > max", label)));
        }
        Ok(self)
    }

    /// Case-insensitive lookup over every known item.
    pub fn item(&self, name: &str) -> Option<&ItemDef> {
        self.index
            .get(&name.trim().to_ascii_lowercase())
            .and_then(|pos| self.items.get(*pos))
    }

    /// Case-insensitive lookup restricted to items the shop sells.
    pub fn shop_item(&self, name: &str) -> Option<&ItemDef> {
        self.item(name).filter(|item| item.in_shop)
    }

    pub fn shop_sections(&self) -> Vec<ShopSection> {
        let mut sections: Vec<ShopSection> = Vec::new();
        for item in self.items.iter().filter(|item| item.in_shop) {
            let Some(price) = item.price else { continue };
            let entry = ShopEntry {
                name: item.name.clone(),
                price,
                rarity: item.rarity,
                description: item.description.clone(),
            };
            match sections.iter_mut().find(|s| s.category == item.category()) {
                Some(section) => section.items.push(entry),
                None => sections.push(ShopSection {
                    category: item.category(),
                    items: vec![entry],
                }),
            }
        }
        sections
    }

    pub fn random_monster<R: Rng + ?Sized>(&self, tier: MonsterTier, rng: &mut R) -> Option<&MonsterDef> {
        self.monsters.tier(tier).choose(rng)
    }

    /// The built-in content set.
    pub fn standard() -> Self {
        let catalog = Catalog {
            items: standard_items(),
            monsters: standard_monsters(),
            adventure_outcomes: vec![
                outcome(OutcomeKind::Treasure, 30, (20, 80), (10, 30), "You discovered a hidden treasure chest!"),
                outcome(OutcomeKind::Monster, 25, (30, 100), (20, 40), "A wild monster blocks your path."),
                outcome(OutcomeKind::Merchant, 20, (15, 50), (8, 25), "You helped a travelling merchant and were rewarded."),
                outcome(OutcomeKind::Mystery, 15, (40, 120), (15, 35), "You solved an ancient riddle."),
                outcome(OutcomeKind::RareFind, 10, (60, 150), (25, 50), "Something glints in the undergrowth..."),
            ],
            adventure_locations: strings(&[
                "Whispering Woods",
                "Crystal Caves",
                "Misty Mountains",
                "Haunted Ruins",
                "Forgotten Temple",
                "Dragon's Lair",
                "Enchanted Forest",
                "Dark Swamp",
                "Golden Fields",
                "Frozen Tundra",
                "Sunken City",
                "Floating Islands",
                "Volcanic Crater",
                "Ancient Library",
                "Cursed Graveyard",
            ]),
            rare_find_items: strings(&[
                "Ancient Coin",
                "Magic Crystal",
                "Enchanted Gem",
                "Rare Herb",
                "Mystical Orb",
            ]),
            dungeon_types: strings(&[
                "Ancient Tomb",
                "Abandoned Mine",
                "Cursed Castle",
                "Underground Labyrinth",
                "Wizard's Tower",
                "Demon's Fortress",
                "Crystal Caverns",
                "Shadow Realm",
                "Fire Temple",
                "Ice Palace",
                "Sunken Ruins",
                "Sky Citadel",
                "Bone Catacombs",
                "Elemental Sanctuary",
                "Time Vortex",
            ]),
            dungeon: DungeonRules {
                min_level: 3,
                min_hp: 50,
                floors: Span::new(3, 7),
                base_coins: Span::new(30, 80),
                base_xp: Span::new(20, 50),
                elite_after_floor: 3,
                level_bonus_percent: 15,
                floor_types: vec![
                    FloorDef {
                        kind: FloorKind::Enemy,
                        weight: 40,
                        final_only: false,
                        coins: None,
                        xp: None,
                        damage: Some(Span::new(10, 25)),
                        item_chance: 0.0,
                        items: Vec::new(),
                    },
                    FloorDef {
                        kind: FloorKind::Trap,
                        weight: 20,
                        final_only: false,
                        coins: Some(Span::new(10, 40)),
                        xp: None,
                        damage: Some(Span::new(15, 30)),
                        item_chance: 0.0,
                        items: Vec::new(),
                    },
                    FloorDef {
                        kind: FloorKind::Treasure,
                        weight: 30,
                        final_only: false,
                        coins: Some(Span::new(50, 120)),
                        xp: None,
                        damage: None,
                        item_chance: 0.3,
                        items: strings(&["Magic Scroll", "Gold Ring", "Precious Stone", "Ancient Artifact"]),
                    },
                    FloorDef {
                        kind: FloorKind::Boss,
                        weight: 10,
                        final_only: true,
                        coins: Some(Span::new(100, 300)),
                        xp: Some(Span::new(50, 100)),
                        damage: Some(Span::new(20, 40)),
                        item_chance: 1.0,
                        items: strings(&["Legendary Sword", "Dragon Scale Armor", "Crown of Power", "Mystic Staff"]),
                    },
                ],
            },
            jobs: vec![
                job("Blacksmith", (80, 150), (5, 15), "You forged weapons at the smithy."),
                job("Merchant", (60, 120), (3, 10), "You traded goods in the market."),
                job("Guard", (70, 140), (4, 12), "You stood watch over the city gates."),
                job("Farmer", (50, 100), (2, 8), "You tended the fields from dawn to dusk."),
                job("Miner", (90, 180), (6, 18), "You dug for ore deep underground."),
                job("Fisher", (40, 90), (2, 7), "You cast your nets at the harbour."),
                job("Hunter", (85, 160), (5, 16), "You tracked game through the wilds."),
            ],
            daily: DailyRules {
                base: 200,
                per_level: 50,
                bonus_chance: 0.2,
                bonus: Span::new(100, 500),
                streak_bonuses: vec![(7, 500), (30, 2000), (365, 10_000)],
                streak_window_hours: 48,
            },
            achievements: vec![
                achievement("first_steps", "First Steps", "Complete your first adventure", AchievementRequirement::AdventuresCompleted, 1, 100, 50),
                achievement("adventurer", "Adventurer", "Complete 50 adventures", AchievementRequirement::AdventuresCompleted, 50, 1000, 500),
                achievement("dungeon_delver", "Dungeon Delver", "Complete 10 dungeons", AchievementRequirement::DungeonsCompleted, 10, 2000, 1000),
                achievement("wealthy", "Wealthy", "Accumulate 10,000 coins", AchievementRequirement::Coins, 10_000, 5000, 2000),
                achievement("max_level", "Legend", "Reach the maximum level", AchievementRequirement::Level, 100, 50_000, 0),
            ],
            rare_rewards: RareRewardTable {
                merchant_items: strings(&["Phoenix Feather", "Dragon Scale", "Moonstone", "Star Fragment", "Void Crystal"]),
                relic_items: strings(&["Excalibur", "Mjolnir", "Aegis Shield", "Ring of Power", "Crown of Kings"]),
            },
            index: HashMap::new(),
        };
        // The built-in tables are covered by tests; an empty index only disables lookups.
        match catalog.clone().finalize() {
            Ok(ready) => ready,
            Err(err) => {
                log::error!("built-in catalog failed validation: {}", err);
                catalog
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn outcome(kind: OutcomeKind, weight: u32, coins: (u64, u64), xp: (u64, u64), description: &str) -> AdventureOutcomeDef {
    AdventureOutcomeDef {
        kind,
        weight,
        coins: Span::new(coins.0, coins.1),
        xp: Span::new(xp.0, xp.1),
        description: description.to_string(),
    }
}

fn job(name: &str, coins: (u64, u64), xp: (u64, u64), description: &str) -> WorkJob {
    WorkJob {
        name: name.to_string(),
        coins: Span::new(coins.0, coins.1),
        xp: Span::new(xp.0, xp.1),
        description: description.to_string(),
    }
}

fn achievement(
    id: &str,
    name: &str,
    description: &str,
    requirement: AchievementRequirement,
    threshold: u64,
    reward_coins: u64,
    reward_xp: u64,
) -> AchievementDef {
    AchievementDef {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        requirement,
        threshold,
        reward_coins,
        reward_xp,
    }
}

fn monster(name: &str, hp: u32, attack: u32, defense: u32, xp: u64, coins: u64) -> MonsterDef {
    MonsterDef {
        name: name.to_string(),
        hp,
        attack,
        defense,
        xp,
        coins,
    }
}

fn standard_monsters() -> MonsterTable {
    MonsterTable {
        common: vec![
            monster("Goblin", 30, 8, 2, 15, 20),
            monster("Skeleton", 25, 10, 3, 18, 25),
            monster("Wolf", 35, 12, 1, 20, 18),
            monster("Bandit", 40, 15, 4, 25, 35),
        ],
        uncommon: vec![
            monster("Orc", 60, 18, 6, 40, 60),
            monster("Troll", 80, 22, 8, 50, 80),
            monster("Dark Mage", 45, 25, 5, 45, 70),
        ],
        rare: vec![
            monster("Minotaur", 120, 30, 12, 80, 150),
            monster("Wyvern", 100, 35, 10, 90, 200),
            monster("Lich", 90, 40, 15, 100, 250),
        ],
        boss: vec![
            monster("Ancient Dragon", 200, 50, 20, 200, 500),
            monster("Demon Lord", 250, 60, 25, 300, 750),
            monster("Shadow King", 180, 55, 18, 250, 600),
        ],
    }
}

struct ItemSeed<'a> {
    name: &'a str,
    kind: ItemKind,
    price: Option<u64>,
    rarity: Rarity,
    in_shop: bool,
    description: &'a str,
}

impl From<ItemSeed<'_>> for ItemDef {
    fn from(seed: ItemSeed<'_>) -> Self {
        ItemDef {
            name: seed.name.to_string(),
            kind: seed.kind,
            price: seed.price,
            rarity: seed.rarity,
            in_shop: seed.in_shop,
            description: seed.description.to_string(),
        }
    }
}

fn trinket(name: &str, price: Option<u64>, rarity: Rarity, description: &str) -> ItemDef {
    ItemSeed {
        name,
        kind: ItemKind::Trinket,
        price,
        rarity,
        in_shop: false,
        description,
    }
    .into()
}

fn standard_items() -> Vec<ItemDef> {
    use Rarity::*;
    let weapon = |attack| ItemKind::Weapon { attack };
    let armor = |defense| ItemKind::Armor { defense };
    let consumable = |effect| ItemKind::Consumable { effect };

    let mut items: Vec<ItemDef> = vec![
        ItemSeed { name: "Wooden Sword", kind: weapon(3), price: Some(100), rarity: Common, in_shop: true, description: "A basic wooden sword for beginners." }.into(),
        ItemSeed { name: "Iron Sword", kind: weapon(8), price: Some(500), rarity: Uncommon, in_shop: true, description: "A sturdy iron sword with good balance." }.into(),
        ItemSeed { name: "Steel Sword", kind: weapon(15), price: Some(1500), rarity: Rare, in_shop: true, description: "A sharp steel sword favored by warriors." }.into(),
        ItemSeed { name: "Enchanted Blade", kind: weapon(25), price: Some(5000), rarity: Epic, in_shop: false, description: "A magically enhanced blade that glows with power." }.into(),
        ItemSeed { name: "Legendary Sword", kind: weapon(40), price: Some(15_000), rarity: Legendary, in_shop: false, description: "A legendary weapon of immense power." }.into(),
        ItemSeed { name: "Leather Armor", kind: armor(3), price: Some(150), rarity: Common, in_shop: true, description: "Basic leather armor for protection." }.into(),
        ItemSeed { name: "Iron Shield", kind: armor(6), price: Some(600), rarity: Uncommon, in_shop: true, description: "A solid iron shield for blocking attacks." }.into(),
        ItemSeed { name: "Steel Armor", kind: armor(12), price: Some(2000), rarity: Rare, in_shop: true, description: "Heavy steel armor for maximum protection." }.into(),
        ItemSeed { name: "Enchanted Mail", kind: armor(20), price: Some(6000), rarity: Epic, in_shop: false, description: "Magically protected mail armor." }.into(),
        ItemSeed { name: "Dragon Scale Armor", kind: armor(35), price: Some(20_000), rarity: Legendary, in_shop: false, description: "Armor made from ancient dragon scales." }.into(),
        ItemSeed {
            name: "Health Potion",
            kind: consumable(Effect::Heal { amount: 50, jitter_min: -5, jitter_max: 10 }),
            price: Some(25),
            rarity: Common,
            in_shop: true,
            description: "Restores 50 HP when consumed.",
        }
        .into(),
        ItemSeed {
            name: "Greater Health Potion",
            kind: consumable(Effect::Heal { amount: 100, jitter_min: -5, jitter_max: 10 }),
            price: Some(75),
            rarity: Uncommon,
            in_shop: true,
            description: "Restores 100 HP when consumed.",
        }
        .into(),
        ItemSeed { name: "Mana Potion", kind: consumable(Effect::Inert), price: Some(40), rarity: Common, in_shop: true, description: "Restores magical energy." }.into(),
        ItemSeed {
            name: "Strength Potion",
            kind: consumable(Effect::Boost { attack: 2, defense: 0, max_hp: 0 }),
            price: Some(100),
            rarity: Uncommon,
            in_shop: true,
            description: "Permanently sharpens your attack.",
        }
        .into(),
        ItemSeed {
            name: "Elixir of Power",
            kind: consumable(Effect::Boost { attack: 2, defense: 2, max_hp: 10 }),
            price: Some(500),
            rarity: Rare,
            in_shop: false,
            description: "Boosts all stats.",
        }
        .into(),
        ItemSeed {
            name: "Magic Ring",
            kind: consumable(Effect::RandomBoost { min: 2, max: 5 }),
            price: Some(1000),
            rarity: Rare,
            in_shop: false,
            description: "A magical ring that permanently increases stats.",
        }
        .into(),
        ItemSeed {
            name: "Lucky Charm",
            kind: consumable(Effect::Luck { amount: 0.1 }),
            price: Some(250),
            rarity: Uncommon,
            in_shop: true,
            description: "Increases luck in adventures.",
        }
        .into(),
        ItemSeed {
            name: "Ancient Scroll",
            kind: consumable(Effect::GrantXp { min: 50, max: 150 }),
            price: Some(300),
            rarity: Uncommon,
            in_shop: true,
            description: "Provides bonus XP when used.",
        }
        .into(),
        ItemSeed {
            name: "Magic Scroll",
            kind: consumable(Effect::GrantXp { min: 10, max: 40 }),
            price: None,
            rarity: Uncommon,
            in_shop: false,
            description: "Faded runes that still teach a little.",
        }
        .into(),
    ];

    items.extend([
        trinket("Ancient Coin", None, Uncommon, "Worn currency from a lost kingdom."),
        trinket("Magic Crystal", None, Uncommon, "Hums faintly when held."),
        trinket("Enchanted Gem", None, Rare, "A gem with a light of its own."),
        trinket("Rare Herb", None, Uncommon, "Prized by alchemists."),
        trinket("Mystical Orb", None, Rare, "Clouds swirl inside it."),
        trinket("Gold Ring", None, Uncommon, "Plain but heavy gold."),
        trinket("Precious Stone", None, Uncommon, "A cut stone of fine quality."),
        trinket("Ancient Artifact", None, Rare, "Its purpose is long forgotten."),
        trinket("Crown of Power", None, Epic, "Worn by a fallen dungeon lord."),
        trinket("Mystic Staff", None, Epic, "Crackles with old magic."),
        trinket("Phoenix Feather", None, Legendary, "Warm to the touch, forever."),
        trinket("Dragon Scale", None, Legendary, "Harder than any steel."),
        trinket("Moonstone", None, Legendary, "Glows brighter under the full moon."),
        trinket("Star Fragment", None, Legendary, "A shard of a fallen star."),
        trinket("Void Crystal", None, Legendary, "Light bends around it."),
        trinket("Excalibur", None, Legendary, "The sword of kings."),
        trinket("Mjolnir", None, Legendary, "Only the worthy may lift it."),
        trinket("Aegis Shield", None, Legendary, "The shield of the gods."),
        trinket("Ring of Power", None, Legendary, "One ring among many."),
        trinket("Crown of Kings", None, Legendary, "Every monarch desired it."),
    ]);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn standard_catalog_is_valid_and_indexed() {
        let catalog = Catalog::standard();
        assert!(catalog.item("health potion").is_some());
        assert!(catalog.item("  IRON SWORD ").is_some());
        assert!(catalog.item("Pebble").is_none());
        assert_eq!(
            catalog.adventure_outcomes.iter().map(|o| o.weight).sum::<u32>(),
            100
        );
    }

    #[test]
    fn shop_only_lists_shop_items() {
        let catalog = Catalog::standard();
        assert!(catalog.shop_item("Steel Sword").is_some());
        assert!(catalog.shop_item("Legendary Sword").is_none());
        let sections = catalog.shop_sections();
        let names: Vec<&str> = sections.iter().map(|s| s.category).collect();
        assert_eq!(names, vec!["Weapons", "Armor", "Consumables", "Misc"]);
        let total: usize = sections.iter().map(|s| s.items.len()).sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn every_reward_item_is_known() {
        let catalog = Catalog::standard();
        let mut names: Vec<&String> = catalog.rare_find_items.iter().collect();
        names.extend(catalog.rare_rewards.merchant_items.iter());
        names.extend(catalog.rare_rewards.relic_items.iter());
        for floor in &catalog.dungeon.floor_types {
            names.extend(floor.items.iter());
        }
        for name in names {
            assert!(catalog.item(name).is_some(), "{} missing from catalog", name);
        }
    }

    #[test]
    fn json_round_trip_rebuilds_the_index() {
        let json = serde_json::to_string(&Catalog::standard()).expect("serialize");
        let catalog = Catalog::from_json_str(&json).expect("parse");
        assert_eq!(
            catalog.item("Magic Ring").map(|i| i.kind.clone()),
            Some(ItemKind::Consumable {
                effect: Effect::RandomBoost { min: 2, max: 5 }
            })
        );
    }

    #[test]
    fn invalid_catalogs_are_rejected() {
        let mut catalog = Catalog::standard();
        catalog.items.push(catalog.items[0].clone());
        assert!(matches!(catalog.finalize(), Err(CatalogError::Invalid(_))));

        let mut catalog = Catalog::standard();
        for outcome in catalog.adventure_outcomes.iter_mut() {
            outcome.weight = 0;
        }
        assert!(catalog.finalize().is_err());

        let mut catalog = Catalog::standard();
        catalog.jobs[0].coins = Span::new(10, 5);
        assert!(catalog.finalize().is_err());

        let mut catalog = Catalog::standard();
        catalog.daily.streak_window_hours = i64::MAX;
        assert!(matches!(catalog.finalize(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn span_roll_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let span = Span::new(3, 7);
        for _ in 0..500 {
            assert!(span.contains(span.roll(&mut rng)));
        }
        assert_eq!(Span::new(9, 9).roll(&mut rng), 9);
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(2);
        let entries = [("a", 0u32), ("b", 5u32)];
        for _ in 0..50 {
            let picked = pick_weighted(&entries, &mut rng, |e| e.1).expect("pick");
            assert_eq!(picked.0, "b");
        }
        let empty: [(&str, u32); 1] = [("z", 0)];
        assert!(pick_weighted(&empty, &mut rng, |e| e.1).is_none());
    }
}
