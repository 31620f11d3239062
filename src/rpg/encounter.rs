//! Procedural adventures and multi-floor dungeon runs.
//!
//! Both actions check eligibility first and return an error without touching the
//! record when the player may not go. Once past that point every reward, item and
//! point of damage lands on the record in one go so the engine persists the run
//! as a unit.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::rpg::catalog::{pick_weighted, FloorKind, MonsterDef, MonsterTier, OutcomeKind};
use crate::rpg::context::ActionContext;
use crate::rpg::errors::GameError;
use crate::rpg::luck::{apply_rare_event_reward, check_rare_event, rare_event_reward, rewards_doubled, roll_with_luck};
use crate::rpg::progression::apply_level_up;
use crate::rpg::types::{ActionResult, PlayerRecord};

/// Base chance for the luck roll attached to every adventure.
pub const ADVENTURE_LUCK_CHANCE: f64 = 0.7;

/// Result of a single combat exchange during an adventure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    pub won: bool,
    pub player_damage: u32,
    pub damage_taken: u32,
}

/// One swing each. The player wins if their hit alone would drop the monster.
pub fn resolve_combat<R: Rng + ?Sized>(attack: u32, defense: u32, monster: &MonsterDef, rng: &mut R) -> CombatOutcome {
    let player_damage = attack.saturating_add(rng.gen_range(1..=10));
    let swing = i64::from(monster.attack) - i64::from(defense) + rng.gen_range(-2..=2);
    let monster_damage = swing.max(1) as u32;
    if player_damage >= monster.hp {
        return CombatOutcome {
            won: true,
            player_damage,
            damage_taken: 0,
        };
    }
    CombatOutcome {
        won: false,
        player_damage,
        damage_taken: rng.gen_range(monster_damage / 2..=monster_damage),
    }
}

fn place_items(record: &mut PlayerRecord, items: Vec<String>, capacity: usize, result: &mut ActionResult) {
    for item in items {
        if record.try_add_item(&item, capacity) {
            result.deltas.items_gained.push(item);
        } else {
            result.line(format!("Your bag is full, so the {} was left behind.", item));
            result.deltas.items_left_behind.push(item);
        }
    }
}

pub fn adventure(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>) -> Result<ActionResult, GameError> {
    if record.hp == 0 {
        return Err(GameError::InsufficientHealth {
            required: 1,
            current: record.hp,
        });
    }

    let catalog = ctx.catalog;
    let capacity = ctx.capacity();
    let rare = check_rare_event(record, ctx.now, ctx.rng);

    let outcome = pick_weighted(&catalog.adventure_outcomes, ctx.rng, |o| o.weight)
        .ok_or_else(|| GameError::InvalidArgument("no adventure outcomes configured".into()))?;
    let location = catalog
        .adventure_locations
        .choose(ctx.rng)
        .map(String::as_str)
        .unwrap_or("the wilds");

    let mut coins = outcome.coins.roll(ctx.rng);
    let mut xp = outcome.xp.roll(ctx.rng);
    coins += coins * u64::from(record.level) / 10;

    let luck = roll_with_luck(record, ADVENTURE_LUCK_CHANCE, ctx.now, ctx.rng);
    if luck.success {
        coins += coins / 5;
        xp += xp / 10;
    }

    let mut result = ActionResult::success("adventure", format!("Adventure in {}", location));
    let mut found = Vec::new();

    match outcome.kind {
        OutcomeKind::Monster => {
            let monster = catalog
                .random_monster(MonsterTier::Common, ctx.rng)
                .ok_or_else(|| GameError::InvalidArgument("no common monsters configured".into()))?;
            let fight = resolve_combat(record.attack, record.defense, monster, ctx.rng);
            if fight.won {
                record.counters.monsters_defeated += 1;
                result.line(format!("In the {} you encountered a {} and defeated it!", location, monster.name));
            } else {
                let lost = record.take_damage(fight.damage_taken);
                coins /= 2;
                xp /= 2;
                result.line(format!(
                    "In the {} you fought a {} but took {} damage and had to retreat.",
                    location, monster.name, lost
                ));
            }
        }
        OutcomeKind::RareFind => {
            if let Some(item) = catalog.rare_find_items.choose(ctx.rng) {
                found.push(item.clone());
                result.line(format!("In the {} you made a rare discovery: {}!", location, item));
            }
        }
        OutcomeKind::Treasure | OutcomeKind::Merchant | OutcomeKind::Mystery => {
            result.line(format!("{} You explored the {}.", outcome.description, location));
        }
    }

    if rewards_doubled(record, ctx.now) {
        coins *= 2;
        xp *= 2;
        result.line("Time bends around you and your rewards are doubled.");
    }

    record.credit_coins(coins);
    record.grant_xp(xp);
    record.counters.adventures_completed += 1;
    result.deltas.xp_gained += xp;
    result.line(format!("Gained {} coins and {} XP.", coins, xp));
    if luck.success {
        result.line("Fortune smiled on you: bonus coins and XP!");
    }
    result.luck = Some(luck.report());
    place_items(record, found, capacity, &mut result);

    if let Some(hit) = rare {
        let reward = rare_event_reward(hit.event, record.level, catalog, ctx.rng);
        let applied = apply_rare_event_reward(record, &reward, ctx.now, capacity);
        result.rare_event = Some(hit.event);
        if hit.first_time {
            result.line(format!("Rare event discovered: {}!", hit.event.title()));
        }
        result.narrative.extend(applied.lines);
        result.deltas.xp_gained += applied.xp_gained;
        result.deltas.items_gained.extend(applied.item_gained);
        result.deltas.items_left_behind.extend(applied.item_left_behind);
    }

    let summary = apply_level_up(record, ctx.rng, ctx.game.max_level);
    result.merge_level_up(summary);
    Ok(result)
}

pub fn dungeon(record: &mut PlayerRecord, ctx: &mut ActionContext<'_>) -> Result<ActionResult, GameError> {
    let catalog = ctx.catalog;
    let rules = &catalog.dungeon;
    if record.level < rules.min_level {
        return Err(GameError::InsufficientLevel {
            required: rules.min_level,
            current: record.level,
        });
    }
    if record.hp < rules.min_hp {
        return Err(GameError::InsufficientHealth {
            required: rules.min_hp,
            current: record.hp,
        });
    }

    let name = catalog
        .dungeon_types
        .choose(ctx.rng)
        .map(String::as_str)
        .unwrap_or("Dungeon");
    let floors = rules.floors.roll(ctx.rng).max(1);
    let mut result = ActionResult::success("dungeon", format!("{} ({} floors)", name, floors));

    let mut total_coins = 0u64;
    let mut total_xp = 0u64;
    let mut total_damage = 0u32;
    let mut found = Vec::new();

    for floor in 1..=floors {
        let last = floor == floors;
        let def = pick_weighted(&rules.floor_types, ctx.rng, |f| {
            if f.final_only && !last {
                0
            } else {
                f.weight
            }
        })
        .ok_or_else(|| GameError::InvalidArgument("no dungeon floors configured".into()))?;

        let coins = def.coins.unwrap_or(rules.base_coins).roll(ctx.rng);
        let xp = def.xp.unwrap_or(rules.base_xp).roll(ctx.rng);
        let damage = def.damage.map(|d| d.roll(ctx.rng)).unwrap_or(0);
        let damage = u32::try_from(damage).unwrap_or(u32::MAX);

        let label = match def.kind {
            FloorKind::Enemy => {
                let tier = if u64::from(rules.elite_after_floor) < floor {
                    MonsterTier::Uncommon
                } else {
                    MonsterTier::Common
                };
                record.counters.monsters_defeated += 1;
                let foe = catalog
                    .random_monster(tier, ctx.rng)
                    .map(|m| m.name.as_str())
                    .unwrap_or("monster");
                format!("defeated a {}", foe)
            }
            FloorKind::Trap => "triggered a trap".to_string(),
            FloorKind::Treasure => "found treasure".to_string(),
            FloorKind::Boss => {
                record.counters.monsters_defeated += 1;
                let boss = catalog
                    .random_monster(MonsterTier::Rare, ctx.rng)
                    .map(|m| m.name.as_str())
                    .unwrap_or("boss");
                format!("defeated the boss {}", boss)
            }
        };

        let mut line = format!("Floor {}: {}. +{} coins, +{} XP", floor, label, coins, xp);
        if damage > 0 {
            line.push_str(&format!(", -{} HP", damage));
        }
        if def.item_chance > 0.0 && ctx.rng.gen::<f64>() < def.item_chance {
            if let Some(item) = def.items.choose(ctx.rng) {
                line.push_str(&format!(", found {}", item));
                found.push(item.clone());
            }
        }
        result.line(line);

        total_coins += coins;
        total_xp += xp;
        total_damage = total_damage.saturating_add(damage);
    }

    let level_bonus = total_coins * rules.level_bonus_percent * u64::from(record.level) / 100;
    total_coins += level_bonus;
    if rewards_doubled(record, ctx.now) {
        total_coins *= 2;
        total_xp *= 2;
        result.line("Time bends around you and your rewards are doubled.");
    }

    record.credit_coins(total_coins);
    record.grant_xp(total_xp);
    let lost = record.take_damage(total_damage);
    record.counters.dungeons_completed += 1;
    result.deltas.xp_gained = total_xp;
    result.line(format!(
        "Cleared! {} coins (level bonus {}), {} XP, {} HP lost.",
        total_coins, level_bonus, total_xp, lost
    ));
    place_items(record, found, ctx.capacity(), &mut result);

    let summary = apply_level_up(record, ctx.rng, ctx.game.max_level);
    result.merge_level_up(summary);
    Ok(result)
}
