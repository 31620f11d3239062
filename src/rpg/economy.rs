//! Coins, shop, inventory, equipment and the steady income actions.

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::rpg::catalog::{Effect, ItemKind, MAX_STREAK_WINDOW_HOURS};
use crate::rpg::context::ActionContext;
use crate::rpg::errors::GameError;
use crate::rpg::luck::rewards_doubled;
use crate::rpg::progression::apply_level_up;
use crate::rpg::types::{ActionResult, EquipSlot, EquippedItem, PlayerRecord};

/// Share of the catalog price paid back when selling, in percent.
pub const SELL_PERCENT: u64 = 60;
const UNKNOWN_SELL_RANGE: (u64, u64) = (10, 50);

fn require_name(name: &str) -> Result<&str, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidArgument("an item name is required".into()));
    }
    Ok(trimmed)
}

pub fn buy(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>, name: &str) -> Result<ActionResult, GameError> {
    let name = require_name(name)?;
    let item = ctx
        .catalog
        .shop_item(name)
        .ok_or_else(|| GameError::ItemNotFound(name.to_string()))?;
    let price = item
        .price
        .ok_or_else(|| GameError::ItemNotFound(name.to_string()))?;
    if record.coins < price {
        return Err(GameError::InsufficientFunds {
            needed: price,
            available: record.coins,
        });
    }
    let capacity = ctx.capacity();
    if record.inventory.len() >= capacity {
        return Err(GameError::InventoryFull { capacity });
    }

    record.coins -= price;
    record.inventory.push(item.name.clone());

    let mut result = ActionResult::success("buy", format!("Purchased {}", item.name));
    result.line(format!("Paid {} coins. {} coins left.", price, record.coins));
    result.deltas.items_gained.push(item.name.clone());
    Ok(result)
}

pub fn sell(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>, name: &str) -> Result<ActionResult, GameError> {
    let name = require_name(name)?;
    let pos = record
        .find_item(name)
        .ok_or_else(|| GameError::ItemNotFound(name.to_string()))?;

    let price = match ctx.catalog.item(&record.inventory[pos]).and_then(|item| item.price) {
        Some(price) => price * SELL_PERCENT / 100,
        None => ctx.rng.gen_range(UNKNOWN_SELL_RANGE.0..=UNKNOWN_SELL_RANGE.1),
    };
    let sold = record.inventory.remove(pos);
    record.coins = record.coins.saturating_add(price);

    let mut result = ActionResult::success("sell", format!("Sold {} for {} coins", sold, price));
    result.line(format!("You now have {} coins.", record.coins));
    result.deltas.items_lost.push(sold);
    Ok(result)
}

/// Moves the inventory entry at `pos` into `slot`, returning any previous item to the bag.
fn equip(record: &mut PlayerRecord, pos: usize, slot: EquipSlot, bonus: u32) -> ActionResult {
    let name = record.inventory.remove(pos);
    let mut result = ActionResult::success("use", format!("Equipped {}", name));

    if let Some(previous) = record.equipped.remove(&slot) {
        remove_bonus(record, slot, previous.bonus);
        result.line(format!("Unequipped {}.", previous.name));
        result.deltas.items_gained.push(previous.name.clone());
        record.inventory.push(previous.name);
    }
    match slot {
        EquipSlot::Weapon => {
            record.attack = record.attack.saturating_add(bonus);
            result.line(format!("+{} attack (now {}).", bonus, record.attack));
        }
        EquipSlot::Armor => {
            record.defense = record.defense.saturating_add(bonus);
            result.line(format!("+{} defense (now {}).", bonus, record.defense));
        }
    }
    result.deltas.items_lost.push(name.clone());
    record.equipped.insert(slot, EquippedItem { name, bonus });
    result
}

fn remove_bonus(record: &mut PlayerRecord, slot: EquipSlot, bonus: u32) {
    match slot {
        EquipSlot::Weapon => record.attack = record.attack.saturating_sub(bonus),
        EquipSlot::Armor => record.defense = record.defense.saturating_sub(bonus),
    }
}

fn raise_max_hp(record: &mut PlayerRecord, amount: u32) {
    record.max_hp = record.max_hp.saturating_add(amount);
    record.hp = record.hp.saturating_add(amount).min(record.max_hp);
}

pub fn use_item(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>, name: &str) -> Result<ActionResult, GameError> {
    let name = require_name(name)?;
    let pos = record
        .find_item(name)
        .ok_or_else(|| GameError::ItemNotFound(name.to_string()))?;
    let held = record.inventory[pos].clone();

    let Some(def) = ctx.catalog.item(&held) else {
        return Ok(ActionResult::no_effect(
            "use",
            format!("You can't figure out how to use the {}", held),
        ));
    };

    let effect = match &def.kind {
        ItemKind::Weapon { attack } => return Ok(equip(record, pos, EquipSlot::Weapon, *attack)),
        ItemKind::Armor { defense } => return Ok(equip(record, pos, EquipSlot::Armor, *defense)),
        ItemKind::Trinket => {
            return Ok(ActionResult::no_effect(
                "use",
                format!("The {} has no use. Try selling it.", held),
            ))
        }
        ItemKind::Consumable { effect } => effect.clone(),
    };

    let mut result = ActionResult::success("use", format!("Used {}", held));
    match effect {
        Effect::Heal {
            amount,
            jitter_min,
            jitter_max,
        } => {
            if record.hp >= record.max_hp {
                return Ok(ActionResult::no_effect("use", "You're already at full health"));
            }
            let jitter = if jitter_min <= jitter_max {
                ctx.rng.gen_range(jitter_min..=jitter_max)
            } else {
                0
            };
            let heal = (i64::from(amount) + i64::from(jitter)).clamp(1, i64::from(u32::MAX)) as u32;
            let gained = record.restore_hp(heal);
            result.line(format!("Restored {} HP ({}/{}).", gained, record.hp, record.max_hp));
        }
        Effect::Boost {
            attack,
            defense,
            max_hp,
        } => {
            record.attack = record.attack.saturating_add(attack);
            record.defense = record.defense.saturating_add(defense);
            raise_max_hp(record, max_hp);
            for (label, amount) in [("attack", attack), ("defense", defense), ("max HP", max_hp)] {
                if amount > 0 {
                    result.line(format!("+{} {}", amount, label));
                }
            }
        }
        Effect::RandomBoost { min, max } => {
            let amount = ctx.rng.gen_range(min..=max.max(min));
            let stat = ["attack", "defense", "max HP"].choose(ctx.rng).copied().unwrap_or("attack");
            match stat {
                "defense" => record.defense = record.defense.saturating_add(amount),
                "max HP" => raise_max_hp(record, amount),
                _ => record.attack = record.attack.saturating_add(amount),
            }
            result.line(format!("The {} glows: +{} {}", held, amount, stat));
        }
        Effect::GrantXp { min, max } => {
            let xp = ctx.rng.gen_range(min..=max.max(min));
            record.grant_xp(xp);
            result.deltas.xp_gained += xp;
            result.line(format!("You study the {} and gain {} XP.", held, xp));
            let summary = apply_level_up(record, ctx.rng, ctx.game.max_level);
            result.merge_level_up(summary);
        }
        Effect::Luck { amount } => {
            record.luck.base_luck = (record.luck.base_luck + amount).max(0.0);
            result.line("You feel a little luckier.");
        }
        Effect::Inert => {
            return Ok(ActionResult::no_effect(
                "use",
                format!("Nothing happens when you use the {}", held),
            ));
        }
    }

    record.inventory.remove(pos);
    result.deltas.items_lost.push(held);
    Ok(result)
}

pub fn unequip(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>, slot: EquipSlot) -> Result<ActionResult, GameError> {
    let Some(item) = record.equipped.get(&slot).cloned() else {
        return Err(GameError::InvalidArgument(format!(
            "nothing is equipped in the {} slot",
            slot.as_str()
        )));
    };
    let capacity = ctx.capacity();
    if record.inventory.len() >= capacity {
        return Err(GameError::InventoryFull { capacity });
    }
    record.equipped.remove(&slot);
    remove_bonus(record, slot, item.bonus);
    record.inventory.push(item.name.clone());

    let mut result = ActionResult::success("unequip", format!("Unequipped {}", item.name));
    result.line(format!("Attack {}, defense {}.", record.attack, record.defense));
    result.deltas.items_gained.push(item.name);
    Ok(result)
}

pub fn work(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>) -> Result<ActionResult, GameError> {
    let job = ctx
        .catalog
        .jobs
        .choose(ctx.rng)
        .ok_or_else(|| GameError::InvalidArgument("no jobs are available".into()))?;

    let base = job.coins.roll(ctx.rng);
    let mut coins = base + base * u64::from(record.level) / 10;
    let mut xp = job.xp.roll(ctx.rng);
    let doubled = rewards_doubled(record, ctx.now);
    if doubled {
        coins *= 2;
        xp *= 2;
    }

    record.credit_coins(coins);
    record.grant_xp(xp);
    record.counters.work_shifts += 1;

    let mut result = ActionResult::success("work", format!("You worked as a {}", job.name));
    result.line(job.description.clone());
    result.line(format!("Earned {} coins and {} XP.", coins, xp));
    if doubled {
        result.line("The time anomaly doubled your pay.");
    }
    result.deltas.xp_gained = xp;
    let summary = apply_level_up(record, ctx.rng, ctx.game.max_level);
    result.merge_level_up(summary);
    Ok(result)
}

pub fn daily(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>) -> Result<ActionResult, GameError> {
    let rules = &ctx.catalog.daily;
    let window = Duration::hours(rules.streak_window_hours.clamp(1, MAX_STREAK_WINDOW_HOURS));
    let streak = match record.cooldowns.get("daily") {
        Some(last) if ctx.now - *last <= window => record.daily_streak.saturating_add(1),
        _ => 1,
    };

    let level_bonus = rules.per_level * u64::from(record.level);
    let mut total = rules.base + level_bonus;
    let mut result = ActionResult::success("daily", "Daily reward claimed");
    result.line(format!("Base reward {} + level bonus {}.", rules.base, level_bonus));

    if ctx.rng.gen::<f64>() < rules.bonus_chance {
        let bonus = rules.bonus.roll(ctx.rng);
        total += bonus;
        result.line(format!("Lucky bonus: +{} coins!", bonus));
    }
    if let Some((days, bonus)) = rules.streak_bonuses.iter().find(|(days, _)| *days == streak) {
        total += bonus;
        result.line(format!("{}-day streak bonus: +{} coins!", days, bonus));
    }

    record.credit_coins(total);
    record.daily_streak = streak;
    result.line(format!("Received {} coins. Streak: {} day(s).", total, streak));
    Ok(result)
}

pub fn heal(record: &mut PlayerRecord) -> Result<ActionResult, GameError> {
    if record.hp >= record.max_hp {
        return Ok(ActionResult::no_effect("heal", "You're already at full health"));
    }
    let restored = record.restore_hp(record.max_hp);
    let mut result = ActionResult::success("heal", "Healing complete");
    result.line(format!("Restored {} HP ({}/{}).", restored, record.hp, record.max_hp));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rpg::catalog::Catalog;
    use crate::rpg::types::StartingStats;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        catalog: Catalog,
        game: GameConfig,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: Catalog::standard(),
                game: GameConfig::default(),
                rng: StdRng::seed_from_u64(21),
            }
        }

        fn ctx(&mut self) -> ActionContext<'_> {
            ActionContext::new(&self.catalog, &self.game, Utc::now(), &mut self.rng)
        }
    }

    fn player() -> PlayerRecord {
        PlayerRecord::new("1", &StartingStats::default(), Utc::now())
    }

    #[test]
    fn buy_is_case_insensitive_and_debits() {
        let mut fx = Fixture::new();
        let mut record = player();
        let result = buy(&mut record, &mut fx.ctx(), "health potion").expect("buy");
        assert!(result.success);
        assert_eq!(record.coins, 75);
        assert_eq!(record.inventory, vec!["Health Potion".to_string()]);
    }

    #[test]
    fn buy_rejections_leave_record_untouched() {
        let mut fx = Fixture::new();
        let mut record = player();
        let before = record.clone();
        assert!(matches!(
            buy(&mut record, &mut fx.ctx(), "Steel Sword"),
            Err(GameError::InsufficientFunds {
                needed: 1500,
                available: 100
            })
        ));
        assert!(matches!(
            buy(&mut record, &mut fx.ctx(), "Legendary Sword"),
            Err(GameError::ItemNotFound(_))
        ));
        assert!(matches!(buy(&mut record, &mut fx.ctx(), "  "), Err(GameError::InvalidArgument(_))));
        assert_eq!(record, before);

        fx.game.inventory_capacity = 0;
        assert!(matches!(
            buy(&mut record, &mut fx.ctx(), "Health Potion"),
            Err(GameError::InventoryFull { capacity: 0 })
        ));
        assert_eq!(record, before);
    }

    #[test]
    fn sell_pays_sixty_percent_or_a_small_random_price() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.inventory = vec!["Iron Sword".into(), "Gold Ring".into()];
        sell(&mut record, &mut fx.ctx(), "iron sword").expect("sell");
        assert_eq!(record.coins, 400);
        sell(&mut record, &mut fx.ctx(), "Gold Ring").expect("sell");
        assert!((410..=450).contains(&record.coins));
        assert!(record.inventory.is_empty());
        assert!(matches!(sell(&mut record, &mut fx.ctx(), "Gold Ring"), Err(GameError::ItemNotFound(_))));
    }

    #[test]
    fn equipping_swaps_and_subtracts_exact_bonus() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.inventory = vec!["Wooden Sword".into(), "Iron Sword".into()];
        use_item(&mut record, &mut fx.ctx(), "Wooden Sword").expect("equip");
        assert_eq!(record.attack, 13);
        assert_eq!(record.inventory, vec!["Iron Sword".to_string()]);

        let result = use_item(&mut record, &mut fx.ctx(), "Iron Sword").expect("swap");
        assert_eq!(record.attack, 18);
        assert_eq!(record.inventory, vec!["Wooden Sword".to_string()]);
        assert_eq!(record.equipped[&EquipSlot::Weapon].name, "Iron Sword");
        assert_eq!(result.deltas.items_gained, vec!["Wooden Sword".to_string()]);

        unequip(&mut record, &mut fx.ctx(), EquipSlot::Weapon).expect("unequip");
        assert_eq!(record.attack, 10);
        assert!(record.equipped.is_empty());
        assert!(matches!(
            unequip(&mut record, &mut fx.ctx(), EquipSlot::Weapon),
            Err(GameError::InvalidArgument(_))
        ));
    }

    #[test]
    fn potion_at_full_health_is_not_consumed() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.inventory = vec!["Health Potion".into()];
        let result = use_item(&mut record, &mut fx.ctx(), "Health Potion").expect("use");
        assert!(!result.success);
        assert_eq!(record.inventory.len(), 1);

        record.hp = 20;
        let result = use_item(&mut record, &mut fx.ctx(), "Health Potion").expect("use");
        assert!(result.success);
        assert!((65..=80).contains(&record.hp));
        assert!(record.inventory.is_empty());
    }

    #[test]
    fn unknown_and_inert_items_are_no_ops() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.inventory = vec!["Pebble".into(), "Mana Potion".into(), "Gold Ring".into()];
        let before = record.clone();
        for name in ["pebble", "Mana Potion", "Gold Ring"] {
            let result = use_item(&mut record, &mut fx.ctx(), name).expect("use");
            assert!(!result.success, "{} should be a no-op", name);
        }
        assert_eq!(record, before);
        assert!(matches!(use_item(&mut record, &mut fx.ctx(), "Dragon"), Err(GameError::ItemNotFound(_))));
    }

    #[test]
    fn scrolls_grant_xp_and_can_level() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.xp = 90;
        record.inventory = vec!["Ancient Scroll".into()];
        let result = use_item(&mut record, &mut fx.ctx(), "ancient scroll").expect("use");
        assert!(result.success);
        assert_eq!(record.level, 2);
        assert!(result.level_up.is_some());
        assert!(record.xp < record.xp_threshold);
        assert!(record.inventory.is_empty());
    }

    #[test]
    fn work_pays_with_level_bonus() {
        let mut fx = Fixture::new();
        let mut record = player();
        record.level = 10;
        record.xp_threshold = crate::rpg::progression::xp_threshold(10);
        let result = work(&mut record, &mut fx.ctx()).expect("work");
        let earned = record.coins - 100;
        assert!((80..=360).contains(&earned), "earned {}", earned);
        assert_eq!(record.counters.work_shifts, 1);
        assert_eq!(record.counters.total_coins_earned, earned);
        assert!(result.deltas.xp_gained >= 2);
    }

    #[test]
    fn daily_streak_grows_inside_window_and_resets_after() {
        let mut fx = Fixture::new();
        let mut record = player();
        let now = Utc::now();
        record.cooldowns.insert("daily".into(), now - Duration::hours(30));
        record.daily_streak = 6;
        let mut ctx = ActionContext::new(&fx.catalog, &fx.game, now, &mut fx.rng);
        let result = daily(&mut record, &mut ctx).expect("daily");
        assert_eq!(record.daily_streak, 7);
        assert!(record.coins >= 100 + 250 + 500);
        assert!(result.narrative.iter().any(|l| l.contains("7-day streak")));

        record.cooldowns.insert("daily".into(), now - Duration::hours(72));
        daily(&mut record, &mut ctx).expect("daily");
        assert_eq!(record.daily_streak, 1);
    }

    #[test]
    fn oversized_streak_window_is_clamped() {
        let mut fx = Fixture::new();
        fx.catalog.daily.streak_window_hours = i64::MAX;
        let mut record = player();
        let now = Utc::now();
        record.cooldowns.insert("daily".into(), now - Duration::days(30));
        record.daily_streak = 2;
        let mut ctx = ActionContext::new(&fx.catalog, &fx.game, now, &mut fx.rng);
        daily(&mut record, &mut ctx).expect("daily");
        assert_eq!(record.daily_streak, 3);
    }

    #[test]
    fn heal_restores_fully_or_reports_no_effect() {
        let mut record = player();
        assert!(!heal(&mut record).expect("heal").success);
        record.hp = 1;
        assert!(heal(&mut record).expect("heal").success);
        assert_eq!(record.hp, record.max_hp);
    }
}
