use chrono::Utc;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use questbot::rpg::progression::{apply_level_up, level_for_xp, xp_threshold};
use questbot::rpg::types::StartingStats;
use questbot::rpg::PlayerRecord;

proptest! {
    #[test]
    fn thresholds_strictly_increase(level in 1u32..5_000) {
        prop_assert!(xp_threshold(level + 1) > xp_threshold(level));
    }

    #[test]
    fn level_up_restores_the_xp_invariant(
        start_level in 1u32..60,
        xp in 0u64..2_000_000,
        seed in any::<u64>(),
        max_level in 1u32..120,
    ) {
        let start_level = start_level.min(max_level);
        let mut record = PlayerRecord::new("prop", &StartingStats::default(), Utc::now());
        record.level = start_level;
        record.xp_threshold = xp_threshold(start_level);
        record.xp = xp;
        let before = record.clone();
        let mut rng = StdRng::seed_from_u64(seed);

        let summary = apply_level_up(&mut record, &mut rng, max_level);

        prop_assert!(record.xp < record.xp_threshold);
        prop_assert!(record.level <= max_level);
        prop_assert_eq!(record.level, start_level + summary.levels_gained);
        prop_assert_eq!(record.xp_threshold, xp_threshold(record.level));
        prop_assert!(record.hp <= record.max_hp);
        if summary.levels_gained == 0 && xp < before.xp_threshold {
            prop_assert_eq!(&record, &before);
        } else if summary.levels_gained > 0 {
            prop_assert_eq!(record.hp, record.max_hp);
            prop_assert!(record.attack >= before.attack + 2 * summary.levels_gained);
            prop_assert!(record.defense >= before.defense + summary.levels_gained);
        }

        // A second pass has nothing left to do.
        let again = apply_level_up(&mut record, &mut rng, max_level);
        prop_assert_eq!(again.levels_gained, 0);
    }

    #[test]
    fn level_lookup_matches_thresholds(xp in 0u64..50_000_000, max_level in 1u32..200) {
        let level = level_for_xp(xp, max_level);
        prop_assert!(level >= 1 && level <= max_level);
        if xp >= xp_threshold(1) {
            prop_assert!(xp_threshold(level) <= xp);
        }
        if level < max_level {
            prop_assert!(xp < xp_threshold(level + 1));
        }
    }
}

#[test]
fn known_curve_points() {
    assert_eq!(xp_threshold(1), 100);
    assert_eq!(xp_threshold(2), 282);
    assert_eq!(xp_threshold(3), 519);
    assert_eq!(xp_threshold(4), 800);
    assert_eq!(xp_threshold(9), 2700);
    assert_eq!(xp_threshold(100), 100_000);
}
