//! Experience curve and level-up resolution.
//!
//! The threshold for leaving level `L` is `floor(100 * L^1.5)` (100 at level 1).
//! It is computed as an integer square root of `10_000 * L^3` so the curve is
//! exact for every level instead of depending on floating point rounding.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rpg::types::PlayerRecord;

pub const BASE_XP_THRESHOLD: u64 = 100;

const HP_GAIN: (u32, u32) = (15, 25);
const ATTACK_GAIN: (u32, u32) = (2, 5);
const DEFENSE_GAIN: (u32, u32) = (1, 3);

/// Stat movement produced by one or more level-up passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpSummary {
    pub levels_gained: u32,
    pub new_level: u32,
    pub hp_gained: u32,
    pub attack_gained: u32,
    pub defense_gained: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
}

impl LevelUpSummary {
    pub fn merge(self, later: LevelUpSummary) -> LevelUpSummary {
        LevelUpSummary {
            levels_gained: self.levels_gained + later.levels_gained,
            new_level: later.new_level,
            hp_gained: self.hp_gained + later.hp_gained,
            attack_gained: self.attack_gained + later.attack_gained,
            defense_gained: self.defense_gained + later.defense_gained,
            max_hp: later.max_hp,
            attack: later.attack,
            defense: later.defense,
        }
    }
}

fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.saturating_mul(root) > n {
        root -= 1;
    }
    while (root + 1).saturating_mul(root + 1) <= n {
        root += 1;
    }
    root
}

/// XP required to advance past `level`.
pub fn xp_threshold(level: u32) -> u64 {
    if level <= 1 {
        return BASE_XP_THRESHOLD;
    }
    let l = level as u64;
    isqrt(10_000u64.saturating_mul(l.saturating_mul(l).saturating_mul(l)))
}

/// Highest level in `[1, max_level]` whose threshold does not exceed `xp`.
pub fn level_for_xp(xp: u64, max_level: u32) -> u32 {
    let max_level = max_level.max(1);
    if xp < BASE_XP_THRESHOLD {
        return 1;
    }
    let (mut lo, mut hi) = (1u32, max_level);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if xp_threshold(mid) <= xp {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Converts banked xp into levels. Leaves the record untouched when no level is gained,
/// so calling it twice in a row is the same as calling it once.
pub fn apply_level_up<R: Rng + ?Sized>(
    record: &mut PlayerRecord,
    rng: &mut R,
    max_level: u32,
) -> LevelUpSummary {
    let max_level = max_level.max(1);
    let mut summary = LevelUpSummary {
        new_level: record.level,
        max_hp: record.max_hp,
        attack: record.attack,
        defense: record.defense,
        ..LevelUpSummary::default()
    };

    let threshold = xp_threshold(record.level);
    if record.xp_threshold != threshold {
        record.xp_threshold = threshold;
    }

    while record.level < max_level && record.xp >= record.xp_threshold {
        record.xp -= record.xp_threshold;
        record.level += 1;

        let hp_gain = rng.gen_range(HP_GAIN.0..=HP_GAIN.1);
        let attack_gain = rng.gen_range(ATTACK_GAIN.0..=ATTACK_GAIN.1);
        let defense_gain = rng.gen_range(DEFENSE_GAIN.0..=DEFENSE_GAIN.1);
        record.max_hp = record.max_hp.saturating_add(hp_gain);
        record.attack = record.attack.saturating_add(attack_gain);
        record.defense = record.defense.saturating_add(defense_gain);
        record.hp = record.max_hp;
        record.xp_threshold = xp_threshold(record.level);

        summary.levels_gained += 1;
        summary.hp_gained += hp_gain;
        summary.attack_gained += attack_gain;
        summary.defense_gained += defense_gain;
    }

    // Capped players keep progress up to the edge of the next level.
    if record.level >= max_level && record.xp >= record.xp_threshold {
        record.xp = record.xp_threshold.saturating_sub(1);
    }

    summary.new_level = record.level;
    summary.max_hp = record.max_hp;
    summary.attack = record.attack;
    summary.defense = record.defense;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::types::StartingStats;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn threshold_curve_matches_known_values() {
        assert_eq!(xp_threshold(0), 100);
        assert_eq!(xp_threshold(1), 100);
        assert_eq!(xp_threshold(2), 282);
        assert_eq!(xp_threshold(3), 519);
        assert_eq!(xp_threshold(4), 800);
        assert_eq!(xp_threshold(9), 2700);
        assert_eq!(xp_threshold(100), 100_000);
    }

    #[test]
    fn threshold_is_strictly_increasing_from_level_one() {
        for level in 1..200 {
            assert!(xp_threshold(level + 1) > xp_threshold(level), "level {}", level);
        }
    }

    #[test]
    fn level_for_xp_inverts_the_curve() {
        assert_eq!(level_for_xp(0, 100), 1);
        assert_eq!(level_for_xp(99, 100), 1);
        assert_eq!(level_for_xp(282, 100), 2);
        assert_eq!(level_for_xp(518, 100), 2);
        assert_eq!(level_for_xp(519, 100), 3);
        assert_eq!(level_for_xp(u64::MAX, 100), 100);
    }

    #[test]
    fn single_level_up_restores_hp_and_grows_stats() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut record = PlayerRecord::new("p", &StartingStats::default(), Utc::now());
        record.hp = 40;
        record.xp = 150;
        let summary = apply_level_up(&mut record, &mut rng, 100);
        assert_eq!(summary.levels_gained, 1);
        assert_eq!(record.level, 2);
        assert_eq!(record.xp, 50);
        assert_eq!(record.xp_threshold, 282);
        assert!((115..=125).contains(&record.max_hp));
        assert!((12..=15).contains(&record.attack));
        assert!((6..=8).contains(&record.defense));
        assert_eq!(record.hp, record.max_hp);
    }

    #[test]
    fn multi_level_jump_resolves_in_one_call() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut record = PlayerRecord::new("p", &StartingStats::default(), Utc::now());
        record.xp = 100 + 282 + 519 + 10;
        let summary = apply_level_up(&mut record, &mut rng, 100);
        assert_eq!(summary.levels_gained, 3);
        assert_eq!(record.level, 4);
        assert_eq!(record.xp, 10);
    }

    #[test]
    fn no_level_means_no_change_and_second_call_is_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut record = PlayerRecord::new("p", &StartingStats::default(), Utc::now());
        record.xp = 99;
        let before = record.clone();
        assert_eq!(apply_level_up(&mut record, &mut rng, 100).levels_gained, 0);
        assert_eq!(record, before);

        record.xp = 5_000;
        apply_level_up(&mut record, &mut rng, 100);
        let settled = record.clone();
        assert_eq!(apply_level_up(&mut record, &mut rng, 100).levels_gained, 0);
        assert_eq!(record, settled);
    }

    #[test]
    fn max_level_clamps_excess_xp() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut record = PlayerRecord::new("p", &StartingStats::default(), Utc::now());
        record.xp = u64::MAX / 2;
        apply_level_up(&mut record, &mut rng, 5);
        assert_eq!(record.level, 5);
        assert_eq!(record.xp, xp_threshold(5) - 1);
        assert!(record.xp < record.xp_threshold);
    }
}
