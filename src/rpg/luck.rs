//! Hidden luck: time and identity based conditions, streaks and rare events.
//!
//! Everything here takes the record, the clock reading and the RNG explicitly so
//! the action that triggered the roll persists the luck state together with its
//! own rewards in a single write.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::rpg::catalog::{Catalog, Span};
use crate::rpg::types::{LuckReport, PlayerRecord, RareEvent};

pub const MAX_EFFECTIVE_CHANCE: f64 = 0.95;
pub const LUCKY_STREAK_THRESHOLD: u32 = 3;

const FULL_MOON_CHANCE: f64 = 0.03;
const MIDNIGHT_HOUR: u32 = 0;
const PRIME_HOURS: [u32; 5] = [7, 11, 13, 17, 19];
const LUCKY_NUMBERS: [u32; 5] = [7, 13, 21, 42, 777];

/// Rare events in evaluation order with their base chance. The first hit wins.
pub const RARE_EVENT_TABLE: [(RareEvent, f64); 5] = [
    (RareEvent::TreasureChest, 0.001),
    (RareEvent::MysteriousMerchant, 0.0005),
    (RareEvent::AncientRelic, 0.0001),
    (RareEvent::DragonBlessing, 0.000_05),
    (RareEvent::TimeAnomaly, 0.000_01),
];

const TREASURE_COINS: Span = Span::new(500, 2000);
const TREASURE_XP: Span = Span::new(100, 500);
const RELIC_ATTACK: u32 = 50;
const RELIC_DEFENSE: u32 = 50;
const RELIC_MAX_HP: u32 = 100;
const DRAGON_LUCK_BOOST: f64 = 0.25;
pub const DRAGON_TITLE: &str = "Dragon-Blessed";
const TIME_ANOMALY_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenCondition {
    FullMoon,
    MidnightBlessing,
    PrimeTime,
    LuckyNumber,
    LuckyStreak,
}

impl HiddenCondition {
    pub fn boost(&self) -> f64 {
        match self {
            HiddenCondition::FullMoon => 0.3,
            HiddenCondition::MidnightBlessing => 0.4,
            HiddenCondition::PrimeTime => 0.2,
            HiddenCondition::LuckyNumber => 0.6,
            HiddenCondition::LuckyStreak => 0.5,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HiddenCondition::FullMoon => "Full Moon Blessing - the moon's power guides your fortune",
            HiddenCondition::MidnightBlessing => "Midnight Blessing - dark magic enhances your luck",
            HiddenCondition::PrimeTime => "Prime Time - the numbers align in your favor",
            HiddenCondition::LuckyNumber => "Lucky Numbers - your destiny is written in digits",
            HiddenCondition::LuckyStreak => "Lucky Streak - fortune favors the bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LuckTier {
    Cursed,
    Unlucky,
    Normal,
    Lucky,
    Blessed,
    Divine,
}

impl LuckTier {
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier >= 2.0 {
            LuckTier::Divine
        } else if multiplier >= 1.5 {
            LuckTier::Blessed
        } else if multiplier >= 1.25 {
            LuckTier::Lucky
        } else if multiplier <= 0.5 {
            LuckTier::Cursed
        } else if multiplier <= 0.75 {
            LuckTier::Unlucky
        } else {
            LuckTier::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LuckRoll {
    pub success: bool,
    pub multiplier: f64,
    pub conditions: Vec<HiddenCondition>,
    pub effective_chance: f64,
    pub sample: f64,
    pub lucky_streak: u32,
}

impl LuckRoll {
    pub fn report(&self) -> LuckReport {
        LuckReport {
            success: self.success,
            multiplier: self.multiplier,
            effective_chance: self.effective_chance,
            lucky_streak: self.lucky_streak,
            conditions: self
                .conditions
                .iter()
                .map(|c| c.description().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RareEventHit {
    pub event: RareEvent,
    pub multiplier: f64,
    pub first_time: bool,
}

/// Concrete payout for a rare event, decided before it is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RareEventReward {
    Treasure { coins: u64, xp: u64 },
    SpecialItem { item: String },
    LegendaryRelic { item: String, attack: u32, defense: u32, max_hp: u32 },
    DragonBlessing { luck_boost: f64, title: String },
    TimeAnomaly { hours: i64 },
}

/// What applying a rare event reward changed, for the action result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RareEventOutcome {
    pub lines: Vec<String>,
    pub xp_gained: u64,
    pub item_gained: Option<String>,
    pub item_left_behind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LuckStatus {
    pub multiplier: f64,
    pub tier: LuckTier,
    pub conditions: Vec<String>,
    pub lucky_streak: u32,
    pub rare_events_found: Vec<String>,
    pub double_rewards_until: Option<DateTime<Utc>>,
}

/// Sum of the decimal digits appearing in a player id. Non-digits are ignored.
pub fn digit_sum(player_id: &str) -> u32 {
    player_id.chars().filter_map(|c| c.to_digit(10)).sum()
}

/// Conditions active for this evaluation. The full moon is an independent draw every time.
pub fn active_conditions<R: Rng + ?Sized>(
    record: &PlayerRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<HiddenCondition> {
    let mut active = Vec::new();
    if rng.gen::<f64>() < FULL_MOON_CHANCE {
        active.push(HiddenCondition::FullMoon);
    }
    let hour = now.hour();
    if hour == MIDNIGHT_HOUR {
        active.push(HiddenCondition::MidnightBlessing);
    }
    if PRIME_HOURS.contains(&hour) {
        active.push(HiddenCondition::PrimeTime);
    }
    if LUCKY_NUMBERS.contains(&digit_sum(&record.player_id)) {
        active.push(HiddenCondition::LuckyNumber);
    }
    if record.luck.lucky_streak >= LUCKY_STREAK_THRESHOLD {
        active.push(HiddenCondition::LuckyStreak);
    }
    active
}

/// Base luck plus every active boost. Not clamped.
pub fn compute_multiplier<R: Rng + ?Sized>(
    record: &PlayerRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (f64, Vec<HiddenCondition>) {
    let conditions = active_conditions(record, now, rng);
    let multiplier = record.luck.base_luck.max(0.0) + conditions.iter().map(|c| c.boost()).sum::<f64>();
    (multiplier, conditions)
}

/// `base * multiplier` clamped into `[0, MAX_EFFECTIVE_CHANCE]`. NaN counts as zero.
pub fn effective_chance(base_chance: f64, multiplier: f64) -> f64 {
    let raw = base_chance * multiplier;
    if raw.is_nan() || raw <= 0.0 {
        0.0
    } else {
        raw.min(MAX_EFFECTIVE_CHANCE)
    }
}

pub fn roll_with_luck<R: Rng + ?Sized>(
    record: &mut PlayerRecord,
    base_chance: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> LuckRoll {
    let (multiplier, conditions) = compute_multiplier(record, now, rng);
    let effective = effective_chance(base_chance, multiplier);
    let sample: f64 = rng.gen();
    // A zero chance must never succeed even on a zero sample.
    let success = effective > 0.0 && sample <= effective;

    let luck = &mut record.luck;
    luck.lucky_streak = if success {
        luck.lucky_streak.saturating_add(1)
    } else {
        luck.lucky_streak.saturating_sub(1)
    };
    luck.last_luck_check = Some(now);

    LuckRoll {
        success,
        multiplier,
        conditions,
        effective_chance: effective,
        sample,
        lucky_streak: luck.lucky_streak,
    }
}

/// Walks the rare event table once. Records a first discovery on the player.
pub fn check_rare_event<R: Rng + ?Sized>(
    record: &mut PlayerRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<RareEventHit> {
    let (multiplier, _) = compute_multiplier(record, now, rng);
    for (event, base) in RARE_EVENT_TABLE {
        let chance = effective_chance(base, multiplier);
        let sample: f64 = rng.gen();
        if chance > 0.0 && sample <= chance {
            let first_time = !record.luck.rare_events_found.contains(&event);
            if first_time {
                record.luck.rare_events_found.push(event);
            }
            return Some(RareEventHit {
                event,
                multiplier,
                first_time,
            });
        }
    }
    None
}

pub fn rare_event_reward<R: Rng + ?Sized>(
    event: RareEvent,
    level: u32,
    catalog: &Catalog,
    rng: &mut R,
) -> RareEventReward {
    match event {
        RareEvent::TreasureChest => RareEventReward::Treasure {
            coins: TREASURE_COINS.roll(rng) * u64::from((level / 5).max(1)),
            xp: TREASURE_XP.roll(rng) * u64::from((level / 3).max(1)),
        },
        RareEvent::MysteriousMerchant => RareEventReward::SpecialItem {
            item: choose_name(&catalog.rare_rewards.merchant_items, rng, "Moonstone"),
        },
        RareEvent::AncientRelic => RareEventReward::LegendaryRelic {
            item: choose_name(&catalog.rare_rewards.relic_items, rng, "Excalibur"),
            attack: RELIC_ATTACK,
            defense: RELIC_DEFENSE,
            max_hp: RELIC_MAX_HP,
        },
        RareEvent::DragonBlessing => RareEventReward::DragonBlessing {
            luck_boost: DRAGON_LUCK_BOOST,
            title: DRAGON_TITLE.to_string(),
        },
        RareEvent::TimeAnomaly => RareEventReward::TimeAnomaly {
            hours: TIME_ANOMALY_HOURS,
        },
    }
}

fn choose_name<R: Rng + ?Sized>(pool: &[String], rng: &mut R, fallback: &str) -> String {
    pool.choose(rng)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Applies a reward to the record. Callers run the level-up pass afterwards.
pub fn apply_rare_event_reward(
    record: &mut PlayerRecord,
    reward: &RareEventReward,
    now: DateTime<Utc>,
    inventory_capacity: usize,
) -> RareEventOutcome {
    let mut outcome = RareEventOutcome::default();
    match reward {
        RareEventReward::Treasure { coins, xp } => {
            record.credit_coins(*coins);
            record.grant_xp(*xp);
            outcome.xp_gained = *xp;
            outcome
                .lines
                .push(format!("Treasure chest! +{} coins, +{} XP", coins, xp));
        }
        RareEventReward::SpecialItem { item } => {
            outcome.lines.push(format!("A mysterious merchant offers you a rare {}", item));
            give_item(record, item, inventory_capacity, &mut outcome);
        }
        RareEventReward::LegendaryRelic {
            item,
            attack,
            defense,
            max_hp,
        } => {
            record.attack = record.attack.saturating_add(*attack);
            record.defense = record.defense.saturating_add(*defense);
            record.max_hp = record.max_hp.saturating_add(*max_hp);
            record.hp = record.hp.saturating_add(*max_hp).min(record.max_hp);
            outcome.lines.push(format!(
                "Ancient relic! The legendary {} grants +{} attack, +{} defense, +{} max HP",
                item, attack, defense, max_hp
            ));
            give_item(record, item, inventory_capacity, &mut outcome);
        }
        RareEventReward::DragonBlessing { luck_boost, title } => {
            record.luck.base_luck += luck_boost;
            if !record.has_title(title) {
                record.titles.push(title.clone());
            }
            outcome
                .lines
                .push(format!("Dragon's blessing! You are now {}", title));
        }
        RareEventReward::TimeAnomaly { hours } => {
            let until = now + Duration::hours(*hours);
            let current = record.luck.double_rewards_until.unwrap_or(until);
            record.luck.double_rewards_until = Some(current.max(until));
            outcome
                .lines
                .push(format!("Time anomaly! Rewards are doubled for {} hours", hours));
        }
    }
    outcome
}

fn give_item(record: &mut PlayerRecord, item: &str, capacity: usize, outcome: &mut RareEventOutcome) {
    if record.try_add_item(item, capacity) {
        outcome.item_gained = Some(item.to_string());
    } else {
        outcome.item_left_behind = Some(item.to_string());
        outcome
            .lines
            .push(format!("Your bag is full, so the {} was left behind", item));
    }
}

/// Whether a time anomaly is still doubling rewards.
pub fn rewards_doubled(record: &PlayerRecord, now: DateTime<Utc>) -> bool {
    record
        .luck
        .double_rewards_until
        .map(|until| now < until)
        .unwrap_or(false)
}

/// Read-only view of the hidden state for the `luck` command.
pub fn luck_status<R: Rng + ?Sized>(record: &PlayerRecord, now: DateTime<Utc>, rng: &mut R) -> LuckStatus {
    let (multiplier, conditions) = compute_multiplier(record, now, rng);
    LuckStatus {
        multiplier,
        tier: LuckTier::from_multiplier(multiplier),
        conditions: conditions
            .iter()
            .map(|c| c.description().to_string())
            .collect(),
        lucky_streak: record.luck.lucky_streak,
        rare_events_found: record
            .luck
            .rare_events_found
            .iter()
            .map(|e| e.title().to_string())
            .collect(),
        double_rewards_until: record.luck.double_rewards_until.filter(|until| now < *until),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::types::StartingStats;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, hour, 30, 0).single().expect("valid time")
    }

    fn player(id: &str) -> PlayerRecord {
        PlayerRecord::new(id, &StartingStats::default(), at_hour(9))
    }

    // Always yields values close to 1.0, so no full moon and every roll fails.
    fn high_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn digit_sum_ignores_non_digits() {
        assert_eq!(digit_sum("a1b2c4"), 7);
        assert_eq!(digit_sum("player"), 0);
        assert_eq!(digit_sum("94"), 13);
    }

    #[test]
    fn conditions_follow_hour_and_identity() {
        let mut rng = high_rng();
        assert!(active_conditions(&player("1"), at_hour(9), &mut rng).is_empty());
        assert_eq!(
            active_conditions(&player("1"), at_hour(0), &mut rng),
            vec![HiddenCondition::MidnightBlessing]
        );
        assert_eq!(
            active_conditions(&player("1"), at_hour(13), &mut rng),
            vec![HiddenCondition::PrimeTime]
        );
        assert_eq!(
            active_conditions(&player("43"), at_hour(9), &mut rng),
            vec![HiddenCondition::LuckyNumber]
        );
        let mut streaky = player("1");
        streaky.luck.lucky_streak = 3;
        assert_eq!(
            active_conditions(&streaky, at_hour(9), &mut rng),
            vec![HiddenCondition::LuckyStreak]
        );
    }

    #[test]
    fn multiplier_adds_boosts_to_base() {
        let mut rng = high_rng();
        let mut record = player("16");
        record.luck.base_luck = 1.25;
        let (multiplier, conditions) = compute_multiplier(&record, at_hour(0), &mut rng);
        assert_eq!(
            conditions,
            vec![HiddenCondition::MidnightBlessing, HiddenCondition::LuckyNumber]
        );
        assert!((multiplier - 2.25).abs() < 1e-9);
    }

    #[test]
    fn effective_chance_is_clamped() {
        assert_eq!(effective_chance(0.7, 3.0), MAX_EFFECTIVE_CHANCE);
        assert_eq!(effective_chance(-0.5, 1.0), 0.0);
        assert_eq!(effective_chance(f64::NAN, 1.0), 0.0);
        assert!((effective_chance(0.5, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn failed_roll_lowers_streak_and_stamps_check() {
        let mut rng = high_rng();
        let mut record = player("1");
        record.luck.lucky_streak = 1;
        let roll = roll_with_luck(&mut record, 0.5, at_hour(9), &mut rng);
        assert!(!roll.success);
        assert_eq!(roll.lucky_streak, 0);
        assert_eq!(record.luck.lucky_streak, 0);
        assert_eq!(record.luck.last_luck_check, Some(at_hour(9)));
        let again = roll_with_luck(&mut record, 0.5, at_hour(9), &mut rng);
        assert_eq!(again.lucky_streak, 0);
    }

    #[test]
    fn zero_chance_never_succeeds_and_certain_chance_mostly_does() {
        let mut rng = StepRng::new(0, 0);
        let mut record = player("1");
        assert!(!roll_with_luck(&mut record, 0.0, at_hour(9), &mut rng).success);

        let mut rng = StdRng::seed_from_u64(99);
        let mut record = player("1");
        let mut hits = 0;
        for _ in 0..200 {
            if roll_with_luck(&mut record, 1.0, at_hour(9), &mut rng).success {
                hits += 1;
            }
        }
        assert!(hits > 150, "expected most rolls to succeed, got {}", hits);
    }

    #[test]
    fn rare_event_first_discovery_is_recorded_once() {
        // StepRng(0, 0) yields 0.0 for every float: the first table entry always hits.
        let mut rng = StepRng::new(0, 0);
        let mut record = player("1");
        let hit = check_rare_event(&mut record, at_hour(9), &mut rng).expect("hit");
        assert_eq!(hit.event, RareEvent::TreasureChest);
        assert!(hit.first_time);
        let again = check_rare_event(&mut record, at_hour(9), &mut rng).expect("hit");
        assert!(!again.first_time);
        assert_eq!(record.luck.rare_events_found, vec![RareEvent::TreasureChest]);

        let mut rng = high_rng();
        assert!(check_rare_event(&mut record, at_hour(9), &mut rng).is_none());
    }

    #[test]
    fn treasure_reward_scales_with_level() {
        let catalog = Catalog::standard();
        let mut rng = StdRng::seed_from_u64(4);
        match rare_event_reward(RareEvent::TreasureChest, 15, &catalog, &mut rng) {
            RareEventReward::Treasure { coins, xp } => {
                assert!((1500..=6000).contains(&coins));
                assert!((500..=2500).contains(&xp));
            }
            other => panic!("unexpected reward {:?}", other),
        }
    }

    #[test]
    fn relic_and_blessing_are_permanent() {
        let mut record = player("1");
        let relic = RareEventReward::LegendaryRelic {
            item: "Mjolnir".into(),
            attack: 50,
            defense: 50,
            max_hp: 100,
        };
        let outcome = apply_rare_event_reward(&mut record, &relic, at_hour(9), 50);
        assert_eq!((record.attack, record.defense, record.max_hp), (60, 55, 200));
        assert_eq!(outcome.item_gained.as_deref(), Some("Mjolnir"));

        let blessing = RareEventReward::DragonBlessing {
            luck_boost: 0.25,
            title: DRAGON_TITLE.into(),
        };
        apply_rare_event_reward(&mut record, &blessing, at_hour(9), 50);
        apply_rare_event_reward(&mut record, &blessing, at_hour(9), 50);
        assert!((record.luck.base_luck - 1.5).abs() < 1e-9);
        assert_eq!(record.titles, vec![DRAGON_TITLE.to_string()]);
    }

    #[test]
    fn time_anomaly_doubles_for_a_day() {
        let mut record = player("1");
        let start = at_hour(9);
        apply_rare_event_reward(&mut record, &RareEventReward::TimeAnomaly { hours: 24 }, start, 50);
        assert!(rewards_doubled(&record, start + Duration::hours(23)));
        assert!(!rewards_doubled(&record, start + Duration::hours(24)));
    }

    #[test]
    fn full_bag_leaves_special_item_behind() {
        let mut record = player("1");
        let outcome = apply_rare_event_reward(
            &mut record,
            &RareEventReward::SpecialItem {
                item: "Moonstone".into(),
            },
            at_hour(9),
            0,
        );
        assert!(record.inventory.is_empty());
        assert_eq!(outcome.item_left_behind.as_deref(), Some("Moonstone"));
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(LuckTier::from_multiplier(2.0), LuckTier::Divine);
        assert_eq!(LuckTier::from_multiplier(1.6), LuckTier::Blessed);
        assert_eq!(LuckTier::from_multiplier(1.3), LuckTier::Lucky);
        assert_eq!(LuckTier::from_multiplier(1.0), LuckTier::Normal);
        assert_eq!(LuckTier::from_multiplier(0.7), LuckTier::Unlucky);
        assert_eq!(LuckTier::from_multiplier(0.4), LuckTier::Cursed);
    }
}
