use std::sync::Arc;

use questbot::storage::MemoryPlayerStore;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actions_for_one_player_never_lose_an_update() {
    let mut config = common::seeded_config(30);
    config.cooldowns.work_secs = 0;
    let h = common::harness_with(Arc::new(MemoryPlayerStore::new()), &config);
    h.engine.start("busy").await.expect("start");

    let first = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.work("busy").await })
    };
    let second = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.work("busy").await })
    };
    let r1 = first.await.expect("join").expect("work 1");
    let r2 = second.await.expect("join").expect("work 2");

    let record = h.store.get("busy").expect("get");
    assert_eq!(record.coins as i64, 100 + r1.deltas.coins + r2.deltas.coins);
    assert_eq!(record.counters.work_shifts, 2);
    assert_eq!(h.engine.active_locks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_players_progress_independently() {
    let h = common::memory_harness(31);
    let ids: Vec<String> = (0..16).map(|i| format!("player{}", i)).collect();
    for id in &ids {
        h.engine.start(id).await.expect("start");
    }

    let mut tasks = Vec::new();
    for id in ids.clone() {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(async move { engine.daily(&id).await }));
    }
    for task in tasks {
        assert!(task.await.expect("join").expect("daily").success);
    }
    for id in &ids {
        let record = h.store.get(id).expect("get");
        assert_eq!(record.daily_streak, 1);
        assert!(record.coins >= 350);
    }
}
