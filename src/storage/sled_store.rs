use std::path::Path;

use chrono::{DateTime, Utc};
use sled::IVec;

use crate::rpg::types::{PlayerRecord, PLAYER_SCHEMA_VERSION, SNAPSHOT_SCHEMA_VERSION};
use crate::storage::{
    purge_cutoff, snapshot_nanos, PlayerScan, PlayerStore, SnapshotRecord, StoreError, StoreStats,
};

const TREE_PLAYERS: &str = "players";
const TREE_SNAPSHOTS: &str = "snapshots";
const PLAYER_PREFIX: &str = "players:";
const SNAPSHOT_PREFIX: &str = "snapshots:";

/// Sled-backed player store. Records are bincode encoded and every write is flushed.
pub struct SledPlayerStore {
    _db: sled::Db,
    players: sled::Tree,
    snapshots: sled::Tree,
}

impl SledPlayerStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        let snapshots = db.open_tree(TREE_SNAPSHOTS)?;
        Ok(Self {
            _db: db,
            players,
            snapshots,
        })
    }

    fn player_key(player_id: &str) -> Vec<u8> {
        format!("{}{}", PLAYER_PREFIX, player_id).into_bytes()
    }

    fn snapshot_prefix(player_id: &str) -> Vec<u8> {
        format!("{}{}:", SNAPSHOT_PREFIX, player_id).into_bytes()
    }

    fn snapshot_key(player_id: &str, taken_at: DateTime<Utc>) -> Vec<u8> {
        format!(
            "{}{}:{:020}",
            SNAPSHOT_PREFIX,
            player_id,
            snapshot_nanos(taken_at)
        )
        .into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn decode_player(bytes: IVec) -> Result<PlayerRecord, StoreError> {
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn decode_snapshot(bytes: IVec) -> Result<SnapshotRecord, StoreError> {
        let snapshot: SnapshotRecord = Self::deserialize(bytes)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "snapshot",
                expected: SNAPSHOT_SCHEMA_VERSION,
                found: snapshot.schema_version,
            });
        }
        Ok(snapshot)
    }
}

impl PlayerStore for SledPlayerStore {
    fn get(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        let key = Self::player_key(player_id);
        let Some(bytes) = self.players.get(&key)? else {
            return Err(StoreError::NotFound(format!("player: {}", player_id)));
        };
        Self::decode_player(bytes)
    }

    fn put(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let key = Self::player_key(&record.player_id);
        let bytes = Self::serialize(record)?;
        self.players.insert(key, bytes)?;
        self.players.flush()?;
        Ok(())
    }

    fn contains(&self, player_id: &str) -> Result<bool, StoreError> {
        Ok(self.players.contains_key(Self::player_key(player_id))?)
    }

    fn snapshot(&self, player_id: &str, now: DateTime<Utc>) -> Result<SnapshotRecord, StoreError> {
        let record = self.get(player_id)?;
        let snapshot = SnapshotRecord {
            player_id: player_id.to_string(),
            taken_at: now,
            record,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
        };
        let bytes = Self::serialize(&snapshot)?;
        self.snapshots
            .insert(Self::snapshot_key(player_id, now), bytes)?;
        self.snapshots.flush()?;
        Ok(snapshot)
    }

    fn list_snapshots(&self, player_id: &str) -> Result<Vec<SnapshotRecord>, StoreError> {
        let mut out = Vec::new();
        for entry in self.snapshots.scan_prefix(Self::snapshot_prefix(player_id)) {
            let (_, bytes) = entry?;
            out.push(Self::decode_snapshot(bytes)?);
        }
        Ok(out)
    }

    fn purge_snapshots_older_than(
        &self,
        max_age: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let Some(cutoff) = purge_cutoff(max_age, now) else {
            return Ok(0);
        };
        let mut stale = Vec::new();
        for entry in self.snapshots.scan_prefix(SNAPSHOT_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            let nanos = text
                .rsplit_once(':')
                .and_then(|(_, tail)| tail.parse::<i64>().ok());
            match nanos {
                Some(taken) if taken < cutoff => stale.push(key),
                Some(_) => {}
                None => log::warn!("skipping malformed snapshot key {}", text),
            }
        }
        for key in &stale {
            self.snapshots.remove(key)?;
        }
        if !stale.is_empty() {
            self.snapshots.flush()?;
        }
        Ok(stale.len())
    }

    fn scan(&self) -> PlayerScan<'_> {
        Box::new(
            self.players
                .scan_prefix(PLAYER_PREFIX.as_bytes())
                .map(|entry| -> Result<(String, PlayerRecord), StoreError> {
                    let (key, bytes) = entry?;
                    let text = String::from_utf8_lossy(&key);
                    let player_id = text
                        .strip_prefix(PLAYER_PREFIX)
                        .unwrap_or(&text)
                        .to_string();
                    Ok((player_id, Self::decode_player(bytes)?))
                }),
        )
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            players: self.players.len(),
            snapshots: self.snapshots.len(),
        })
    }
}
