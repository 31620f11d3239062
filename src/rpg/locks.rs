//! Per-player serialization.
//!
//! Every mutating action for a player runs while holding that player's async
//! mutex, so two concurrent actions can never read the same record and both
//! write back. Distinct players never contend. Entries are dropped from the
//! table as soon as nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct LockTable {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    fn entry(&self, player_id: &str) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(player_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    fn prune(&self, player_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = entries
            .get(player_id)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if idle {
            entries.remove(player_id);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Shared table of per-player locks. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct PlayerLocks {
    table: Arc<LockTable>,
}

/// Held for the duration of one action. Dropping it releases the player.
#[derive(Debug)]
pub struct PlayerGuard {
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
    player_id: String,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, player_id: &str) -> PlayerGuard {
        let lock = self.table.entry(player_id);
        let guard = lock.lock_owned().await;
        PlayerGuard {
            guard: Some(guard),
            table: Arc::clone(&self.table),
            player_id: player_id.to_string(),
        }
    }

    /// Number of players with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.table.len()
    }
}

impl PlayerGuard {
    pub fn player_id(&self) -> &str {
        &self.player_id
    }
}

impl Drop for PlayerGuard {
    fn drop(&mut self) {
        // Release first so the table sees only the map's own reference.
        drop(self.guard.take());
        self.table.prune(&self.player_id);
    }
}
