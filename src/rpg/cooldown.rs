use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CooldownConfig;
use crate::rpg::errors::GameError;
use crate::rpg::types::PlayerRecord;

/// Longest interval accepted from configuration: ten years.
pub const MAX_COOLDOWN_SECS: u64 = 10 * 365 * 86_400;

/// Actions that are rate limited per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Adventure,
    Dungeon,
    Work,
    Daily,
    Heal,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Adventure,
        ActionKind::Dungeon,
        ActionKind::Work,
        ActionKind::Daily,
        ActionKind::Heal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Adventure => "adventure",
            ActionKind::Dungeon => "dungeon",
            ActionKind::Work => "work",
            ActionKind::Daily => "daily",
            ActionKind::Heal => "heal",
        }
    }

    pub fn interval(&self, config: &CooldownConfig) -> Duration {
        let secs = match self {
            ActionKind::Adventure => config.adventure_secs,
            ActionKind::Dungeon => config.dungeon_secs,
            ActionKind::Work => config.work_secs,
            ActionKind::Daily => config.daily_secs,
            ActionKind::Heal => config.heal_secs,
        };
        // chrono panics above i64::MAX / 1000 seconds
        Duration::seconds(secs.min(MAX_COOLDOWN_SECS) as i64)
    }
}

/// Time left before `action` may run again, or `None` when it is ready.
/// A stamp from the future counts as a full interval.
pub fn remaining(
    record: &PlayerRecord,
    action: ActionKind,
    config: &CooldownConfig,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let last = record.cooldowns.get(action.as_str())?;
    let interval = action.interval(config);
    let elapsed = (now - *last).max(Duration::zero());
    if elapsed >= interval {
        None
    } else {
        Some(interval - elapsed)
    }
}

pub fn check(
    record: &PlayerRecord,
    action: ActionKind,
    config: &CooldownConfig,
    now: DateTime<Utc>,
) -> Result<(), GameError> {
    match remaining(record, action, config, now) {
        None => Ok(()),
        Some(left) => {
            let millis = left.num_milliseconds().max(0) as u64;
            Err(GameError::OnCooldown {
                action: action.as_str().to_string(),
                remaining_secs: millis.div_ceil(1000).max(1),
            })
        }
    }
}

/// Records a successful use. Never moves an existing stamp backwards.
pub fn stamp(record: &mut PlayerRecord, action: ActionKind, now: DateTime<Utc>) {
    let entry = record
        .cooldowns
        .entry(action.as_str().to_string())
        .or_insert(now);
    if now > *entry {
        *entry = now;
    }
}
