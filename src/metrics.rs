//! Process-wide action counters.
//! Cheap enough to call on every request; exposed by `questbot status` and the REPL.
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock, PoisonError};

static ACTION_COUNTERS: OnceLock<Mutex<BTreeMap<String, ActionCounter>>> = OnceLock::new();

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActionCounter {
    pub attempts: u64,
    pub successes: u64,
    /// Eligibility or argument failures, plus no-op outcomes.
    pub rejections: u64,
    pub store_failures: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Attempt,
    Success,
    Rejected,
    StoreFailure,
}

fn counter_lock() -> &'static Mutex<BTreeMap<String, ActionCounter>> {
    ACTION_COUNTERS.get_or_init(|| Mutex::new(BTreeMap::new()))
}

pub fn record_action(action: &str, outcome: ActionOutcome) -> ActionCounter {
    let mut guard = counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let counter = guard.entry(action.to_string()).or_default();
    match outcome {
        ActionOutcome::Attempt => counter.attempts = counter.attempts.saturating_add(1),
        ActionOutcome::Success => counter.successes = counter.successes.saturating_add(1),
        ActionOutcome::Rejected => counter.rejections = counter.rejections.saturating_add(1),
        ActionOutcome::StoreFailure => {
            counter.store_failures = counter.store_failures.saturating_add(1)
        }
    }
    *counter
}

/// Copy of every counter, ordered by action name.
pub fn action_counters_snapshot() -> Vec<(String, ActionCounter)> {
    let guard = counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    guard
        .iter()
        .map(|(name, counter)| (name.clone(), *counter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_action() {
        let key = "metrics-test-action";
        record_action(key, ActionOutcome::Attempt);
        record_action(key, ActionOutcome::Attempt);
        record_action(key, ActionOutcome::Success);
        let last = record_action(key, ActionOutcome::Rejected);
        assert_eq!(last.attempts, 2);
        assert_eq!(last.successes, 1);
        assert_eq!(last.rejections, 1);
        assert_eq!(last.store_failures, 0);

        let snapshot = action_counters_snapshot();
        let (_, counter) = snapshot
            .iter()
            .find(|(name, _)| name == key)
            .expect("counter present");
        assert_eq!(*counter, last);
    }
}
