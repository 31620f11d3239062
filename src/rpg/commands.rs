//! Command layer between a chat adapter and the [`GameEngine`].
//!
//! Adapters hand over an [`ActionRequest`] (`player_id`, action name, raw args)
//! and get back a typed [`Reply`] they can render however the platform likes.
//! [`Reply::render_text`] is the plain-text rendering used by the CLI and REPL.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::rpg::catalog::ShopSection;
use crate::rpg::engine::GameEngine;
use crate::rpg::errors::GameError;
use crate::rpg::leaderboard::{LeaderboardEntry, LeaderboardStat, DEFAULT_LIMIT};
use crate::rpg::luck::LuckStatus;
use crate::rpg::types::{ActionResult, EquipSlot, PlayerProfile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub player_id: String,
    pub action: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ActionRequest {
    pub fn new(player_id: impl Into<String>, action: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            player_id: player_id.into(),
            action: action.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Start,                  // START - create the character
    Profile,                // PROFILE / P / INV - stats and inventory
    Adventure,              // ADVENTURE / ADV
    Dungeon,                // DUNGEON / DG
    Work,                   // WORK
    Daily,                  // DAILY
    Heal,                   // HEAL
    Shop,                   // SHOP - list what can be bought
    Buy(String),            // BUY item
    Sell(String),           // SELL item
    Use(String),            // USE item (also equips weapons and armor)
    Unequip(EquipSlot),     // UNEQUIP weapon|armor
    Luck,                   // LUCK - hidden luck readout
    Leaderboard(LeaderboardStat, usize), // LB [stat] [limit]
}

impl GameCommand {
    pub fn parse(action: &str, args: &[String]) -> Result<Self, GameError> {
        let verb = action.trim().to_ascii_uppercase();
        let rest = args.join(" ");
        let rest = rest.trim();
        let command = match verb.as_str() {
            "START" | "BEGIN" => GameCommand::Start,
            "PROFILE" | "P" | "STATS" | "INV" | "INVENTORY" => GameCommand::Profile,
            "ADVENTURE" | "ADV" => GameCommand::Adventure,
            "DUNGEON" | "DG" => GameCommand::Dungeon,
            "WORK" | "JOB" => GameCommand::Work,
            "DAILY" => GameCommand::Daily,
            "HEAL" | "REST" => GameCommand::Heal,
            "SHOP" | "STORE" => GameCommand::Shop,
            "BUY" => GameCommand::Buy(required(rest, "buy <item>")?),
            "SELL" => GameCommand::Sell(required(rest, "sell <item>")?),
            "USE" | "EQUIP" => GameCommand::Use(required(rest, "use <item>")?),
            "UNEQUIP" => {
                let slot = EquipSlot::parse(rest).ok_or_else(|| {
                    GameError::InvalidArgument("usage: unequip weapon|armor".to_string())
                })?;
                GameCommand::Unequip(slot)
            }
            "LUCK" => GameCommand::Luck,
            "LEADERBOARD" | "LB" | "TOP" => {
                let stat = match args.first() {
                    Some(raw) => LeaderboardStat::parse(raw)?,
                    None => LeaderboardStat::Level,
                };
                let limit = match args.get(1) {
                    Some(raw) => raw.parse::<usize>().map_err(|_| {
                        GameError::InvalidArgument(format!("limit must be a number, got '{}'", raw))
                    })?,
                    None => DEFAULT_LIMIT,
                };
                GameCommand::Leaderboard(stat, limit)
            }
            _ => {
                return Err(GameError::InvalidArgument(format!(
                    "unknown action '{}'",
                    action.trim()
                )))
            }
        };
        Ok(command)
    }
}

fn required(rest: &str, usage: &str) -> Result<String, GameError> {
    if rest.is_empty() {
        Err(GameError::InvalidArgument(format!("usage: {}", usage)))
    } else {
        Ok(rest.to_string())
    }
}

/// Typed outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Profile(PlayerProfile),
    Action(ActionResult),
    Shop { sections: Vec<ShopSection> },
    Luck(LuckStatus),
    Leaderboard {
        stat: LeaderboardStat,
        entries: Vec<LeaderboardEntry>,
    },
}

pub async fn handle_request(engine: &GameEngine, request: &ActionRequest) -> Result<Reply, GameError> {
    let command = GameCommand::parse(&request.action, &request.args)?;
    let id = request.player_id.as_str();
    let reply = match command {
        GameCommand::Start => Reply::Profile(engine.start(id).await?),
        GameCommand::Profile => Reply::Profile(engine.profile(id).await?),
        GameCommand::Adventure => Reply::Action(engine.adventure(id).await?),
        GameCommand::Dungeon => Reply::Action(engine.dungeon(id).await?),
        GameCommand::Work => Reply::Action(engine.work(id).await?),
        GameCommand::Daily => Reply::Action(engine.daily(id).await?),
        GameCommand::Heal => Reply::Action(engine.heal(id).await?),
        GameCommand::Shop => Reply::Shop {
            sections: engine.shop(),
        },
        GameCommand::Buy(item) => Reply::Action(engine.buy(id, &item).await?),
        GameCommand::Sell(item) => Reply::Action(engine.sell(id, &item).await?),
        GameCommand::Use(item) => Reply::Action(engine.use_item(id, &item).await?),
        GameCommand::Unequip(slot) => Reply::Action(engine.unequip(id, slot).await?),
        GameCommand::Luck => Reply::Luck(engine.luck_status(id).await?),
        GameCommand::Leaderboard(stat, limit) => Reply::Leaderboard {
            stat,
            entries: engine.leaderboard(stat, limit).await?,
        },
    };
    Ok(reply)
}

impl Reply {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match self {
            Reply::Profile(p) => {
                let _ = writeln!(out, "== {} ==", p.player_id);
                let _ = writeln!(out, "Level {}  XP {}/{}", p.level, p.xp, p.xp_threshold);
                let _ = writeln!(out, "HP {}/{}  ATK {}  DEF {}", p.hp, p.max_hp, p.attack, p.defense);
                let _ = writeln!(out, "Coins {}", p.coins);
                for (slot, name) in &p.equipped {
                    let _ = writeln!(out, "{}: {}", slot, name);
                }
                let _ = writeln!(out, "Inventory {}/{}", p.inventory_used, p.inventory_capacity);
                for line in &p.inventory {
                    if line.count > 1 {
                        let _ = writeln!(out, "  {} x{}", line.name, line.count);
                    } else {
                        let _ = writeln!(out, "  {}", line.name);
                    }
                }
                if !p.titles.is_empty() {
                    let _ = writeln!(out, "Titles: {}", p.titles.join(", "));
                }
            }
            Reply::Action(r) => {
                let _ = writeln!(out, "{}", r.headline);
                for line in &r.narrative {
                    let _ = writeln!(out, "  {}", line);
                }
                if r.success {
                    let _ = writeln!(
                        out,
                        "Coins {:+}  HP {:+}  XP +{}",
                        r.deltas.coins, r.deltas.hp, r.deltas.xp_gained
                    );
                }
                if !r.deltas.items_gained.is_empty() {
                    let _ = writeln!(out, "Found: {}", r.deltas.items_gained.join(", "));
                }
                if !r.deltas.items_left_behind.is_empty() {
                    let _ = writeln!(
                        out,
                        "Inventory full, left behind: {}",
                        r.deltas.items_left_behind.join(", ")
                    );
                }
                if let Some(level) = &r.level_up {
                    let _ = writeln!(
                        out,
                        "LEVEL UP! Now level {} (+{} HP, +{} ATK, +{} DEF)",
                        level.new_level, level.hp_gained, level.attack_gained, level.defense_gained
                    );
                }
            }
            Reply::Shop { sections } => {
                for section in sections {
                    let _ = writeln!(out, "-- {} --", section.category);
                    for item in &section.items {
                        let _ = writeln!(out, "  {} - {} coins ({:?})", item.name, item.price, item.rarity);
                    }
                }
            }
            Reply::Luck(status) => {
                let _ = writeln!(out, "Luck: {:?} ({:.2}x)", status.tier, status.multiplier);
                for condition in &status.conditions {
                    let _ = writeln!(out, "  {}", condition);
                }
                let _ = writeln!(out, "Lucky streak: {}", status.lucky_streak);
                if !status.rare_events_found.is_empty() {
                    let _ = writeln!(out, "Rare events: {}", status.rare_events_found.join(", "));
                }
            }
            Reply::Leaderboard { stat, entries } => {
                let _ = writeln!(out, "Top players by {}", stat.as_str());
                if entries.is_empty() {
                    let _ = writeln!(out, "  (nobody yet)");
                }
                for entry in entries {
                    let _ = writeln!(
                        out,
                        "{:>3}. {} - {} (lvl {})",
                        entry.rank, entry.player_id, entry.value, entry.level
                    );
                }
            }
        }
        out
    }
}

/// One-line message for a refused or failed request.
pub fn render_error(err: &GameError) -> String {
    if err.outcome_unknown() {
        format!(
            "Your progress may or may not have been saved; check your profile before trying again. ({})",
            err
        )
    } else if err.is_retryable() {
        format!("Something went wrong saving your progress, please try again. ({})", err)
    } else {
        format!("Can't do that: {}", err)
    }
}
