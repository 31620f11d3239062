use rand::Rng;

use crate::logutil::escape_log;
use crate::rpg::catalog::{AchievementDef, AchievementRequirement, Catalog};
use crate::rpg::progression::{apply_level_up, LevelUpSummary};
use crate::rpg::types::PlayerRecord;

/// Achievements unlocked by one check, with the level-up their rewards caused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementAward {
    pub unlocked: Vec<String>,
    pub coins: u64,
    pub xp: u64,
    pub level_up: LevelUpSummary,
}

fn progress(record: &PlayerRecord, requirement: AchievementRequirement) -> u64 {
    match requirement {
        AchievementRequirement::AdventuresCompleted => record.counters.adventures_completed,
        AchievementRequirement::DungeonsCompleted => record.counters.dungeons_completed,
        AchievementRequirement::Coins => record.coins,
        AchievementRequirement::Level => u64::from(record.level),
    }
}

fn unlock_log_line(player_id: &str, achievement_id: &str) -> String {
    format!(
        "achievement unlocked: {} -> {}",
        escape_log(player_id),
        escape_log(achievement_id)
    )
}

pub fn is_met(record: &PlayerRecord, def: &AchievementDef) -> bool {
    progress(record, def.requirement) >= def.threshold
}

/// Unlocks every newly met achievement, pays its reward and resolves levels.
/// Each achievement is only ever awarded once per player.
pub fn award<R: Rng + ?Sized>(
    record: &mut PlayerRecord,
    catalog: &Catalog,
    rng: &mut R,
    max_level: u32,
) -> AchievementAward {
    let mut award = AchievementAward::default();
    for def in &catalog.achievements {
        if record.achievements.iter().any(|id| id == &def.id) || !is_met(record, def) {
            continue;
        }
        record.achievements.push(def.id.clone());
        record.credit_coins(def.reward_coins);
        record.grant_xp(def.reward_xp);
        award.coins += def.reward_coins;
        award.xp += def.reward_xp;
        award.unlocked.push(def.name.clone());
        log::info!("{}", unlock_log_line(&record.player_id, &def.id));
    }
    if !award.unlocked.is_empty() {
        award.level_up = apply_level_up(record, rng, max_level);
    }
    award
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::types::StartingStats;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_adventure_unlocks_first_steps_once() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(8);
        let mut record = PlayerRecord::new("1", &StartingStats::default(), Utc::now());
        assert!(award(&mut record, &catalog, &mut rng, 100).unlocked.is_empty());

        record.counters.adventures_completed = 1;
        let first = award(&mut record, &catalog, &mut rng, 100);
        assert_eq!(first.unlocked, vec!["First Steps".to_string()]);
        assert_eq!(record.coins, 200);
        assert_eq!(record.xp, 50);

        let second = award(&mut record, &catalog, &mut rng, 100);
        assert!(second.unlocked.is_empty());
        assert_eq!(record.coins, 200);
    }

    #[test]
    fn unlock_log_line_stays_on_one_line() {
        let line = unlock_log_line("evil\nINFO forged entry", "first_steps");
        assert!(!line.contains('\n'));
        assert_eq!(line, "achievement unlocked: evil\\nINFO forged entry -> first_steps");
    }

    #[test]
    fn xp_rewards_resolve_levels() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(9);
        let mut record = PlayerRecord::new("1", &StartingStats::default(), Utc::now());
        record.counters.dungeons_completed = 10;
        let award = award(&mut record, &catalog, &mut rng, 100);
        assert_eq!(award.unlocked, vec!["Dungeon Delver".to_string()]);
        assert!(award.level_up.levels_gained >= 1);
        assert!(record.xp < record.xp_threshold);
    }
}
