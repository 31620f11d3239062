use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::rpg::errors::GameError;
use crate::rpg::types::PlayerRecord;

pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardStat {
    Level,
    Coins,
    Xp,
    Adventures,
    Dungeons,
    Work,
    Monsters,
    DailyStreak,
}

impl LeaderboardStat {
    pub const ALL: [LeaderboardStat; 8] = [
        LeaderboardStat::Level,
        LeaderboardStat::Coins,
        LeaderboardStat::Xp,
        LeaderboardStat::Adventures,
        LeaderboardStat::Dungeons,
        LeaderboardStat::Work,
        LeaderboardStat::Monsters,
        LeaderboardStat::DailyStreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardStat::Level => "level",
            LeaderboardStat::Coins => "coins",
            LeaderboardStat::Xp => "xp",
            LeaderboardStat::Adventures => "adventures",
            LeaderboardStat::Dungeons => "dungeons",
            LeaderboardStat::Work => "work",
            LeaderboardStat::Monsters => "monsters",
            LeaderboardStat::DailyStreak => "daily_streak",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let stat = match raw.trim().to_ascii_lowercase().as_str() {
            "level" | "lvl" => LeaderboardStat::Level,
            "coins" | "money" => LeaderboardStat::Coins,
            "xp" | "experience" => LeaderboardStat::Xp,
            "adventures" | "adventure_count" => LeaderboardStat::Adventures,
            "dungeons" | "dungeon_count" => LeaderboardStat::Dungeons,
            "work" | "work_count" => LeaderboardStat::Work,
            "monsters" | "kills" => LeaderboardStat::Monsters,
            "daily_streak" | "streak" => LeaderboardStat::DailyStreak,
            other => {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                return Err(GameError::InvalidArgument(format!(
                    "unknown stat '{}'; valid options: {}",
                    other,
                    valid.join(", ")
                )));
            }
        };
        Ok(stat)
    }

    /// The stat value for a record, or `None` when the record has never produced it.
    pub fn value(&self, record: &PlayerRecord) -> Option<u64> {
        let counters = &record.counters;
        match self {
            LeaderboardStat::Level => Some(u64::from(record.level)),
            LeaderboardStat::Coins => Some(record.coins),
            LeaderboardStat::Xp => Some(counters.total_xp_earned),
            LeaderboardStat::Adventures => Some(counters.adventures_completed),
            LeaderboardStat::Dungeons => Some(counters.dungeons_completed),
            LeaderboardStat::Work => Some(counters.work_shifts),
            LeaderboardStat::Monsters => Some(counters.monsters_defeated),
            LeaderboardStat::DailyStreak => record
                .cooldowns
                .contains_key("daily")
                .then_some(u64::from(record.daily_streak)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: String,
    pub value: u64,
    pub level: u32,
}

pub fn validate_limit(limit: usize) -> Result<usize, GameError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(GameError::InvalidArgument(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )))
    }
}

/// Ranks records by `stat`, highest first. Ties keep scan order.
///
/// Works on a streaming scan so the store never has to materialize every record,
/// only the `(id, value, level)` triples of players that have the stat.
pub fn rank<I, E>(records: I, stat: LeaderboardStat, limit: usize) -> Result<Vec<LeaderboardEntry>, E>
where
    I: IntoIterator<Item = Result<(String, PlayerRecord), E>>,
{
    let mut rows: Vec<(String, u64, u32)> = Vec::new();
    for item in records {
        let (player_id, record) = item?;
        if let Some(value) = stat.value(&record) {
            rows.push((player_id, value, record.level));
        }
    }
    rows.sort_by_key(|row| Reverse(row.1));
    Ok(rows
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(pos, (player_id, value, level))| LeaderboardEntry {
            rank: pos + 1,
            player_id,
            value,
            level,
        })
        .collect())
}
