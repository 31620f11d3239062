use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::rpg::types::{PlayerRecord, SNAPSHOT_SCHEMA_VERSION};
use crate::storage::{
    purge_cutoff, snapshot_nanos, PlayerScan, PlayerStore, SnapshotRecord, StoreError, StoreStats,
};

/// In-process store. Nothing survives the process; handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPlayerStore {
    players: RwLock<BTreeMap<String, PlayerRecord>>,
    snapshots: RwLock<BTreeMap<(String, i64), SnapshotRecord>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Internal("player map lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Internal("player map lock poisoned".to_string()))
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn get(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        read(&self.players)?
            .get(player_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("player: {}", player_id)))
    }

    fn put(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        write(&self.players)?.insert(record.player_id.clone(), record.clone());
        Ok(())
    }

    fn contains(&self, player_id: &str) -> Result<bool, StoreError> {
        Ok(read(&self.players)?.contains_key(player_id))
    }

    fn snapshot(&self, player_id: &str, now: DateTime<Utc>) -> Result<SnapshotRecord, StoreError> {
        let record = self.get(player_id)?;
        let snapshot = SnapshotRecord {
            player_id: player_id.to_string(),
            taken_at: now,
            record,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
        };
        write(&self.snapshots)?.insert(
            (player_id.to_string(), snapshot_nanos(now)),
            snapshot.clone(),
        );
        Ok(snapshot)
    }

    fn list_snapshots(&self, player_id: &str) -> Result<Vec<SnapshotRecord>, StoreError> {
        Ok(read(&self.snapshots)?
            .iter()
            .filter(|((owner, _), _)| owner == player_id)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    fn purge_snapshots_older_than(
        &self,
        max_age: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let Some(cutoff) = purge_cutoff(max_age, now) else {
            return Ok(0);
        };
        let mut snapshots = write(&self.snapshots)?;
        let before = snapshots.len();
        snapshots.retain(|(_, taken), _| *taken >= cutoff);
        Ok(before - snapshots.len())
    }

    fn scan(&self) -> PlayerScan<'_> {
        // Copy out so the read lock is not held while callers consume the stream.
        match read(&self.players) {
            Ok(players) => {
                let rows: Vec<_> = players
                    .iter()
                    .map(|(id, record)| Ok((id.clone(), record.clone())))
                    .collect();
                Box::new(rows.into_iter())
            }
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            players: read(&self.players)?.len(),
            snapshots: read(&self.snapshots)?.len(),
        })
    }
}
