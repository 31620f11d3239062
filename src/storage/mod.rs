//! # Storage Module - Player Persistence Layer
//!
//! Player records are owned by a [`PlayerStore`]. The store is a plain key/value
//! contract: it loads and saves whole records, takes point-in-time snapshots and
//! streams every record for leaderboards. It knows nothing about game rules.
//!
//! ## Implementations
//!
//! - [`SledPlayerStore`] - embedded sled database, bincode records, schema checks
//! - [`MemoryPlayerStore`] - in-process maps for tests and throwaway sessions
//!
//! ## Layout
//!
//! ```text
//! players    tree: players:<player_id>              -> PlayerRecord
//! snapshots  tree: snapshots:<player_id>:<nanos>    -> SnapshotRecord
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use questbot::storage::{PlayerStore, SledPlayerStore};
//!
//! fn main() -> Result<(), questbot::storage::StoreError> {
//!     let store = SledPlayerStore::open("./data/players")?;
//!     let stats = store.stats()?;
//!     println!("{} players, {} snapshots", stats.players, stats.snapshots);
//!     Ok(())
//! }
//! ```
//!
//! All calls are blocking. The game engine runs them on tokio's blocking pool
//! with a timeout so a slow disk turns into a retryable error instead of a hang.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rpg::types::PlayerRecord;

pub mod memory;
pub mod sled_store;
pub mod snapshot_scheduler;

pub use memory::MemoryPlayerStore;
pub use sled_store::SledPlayerStore;
pub use snapshot_scheduler::{SnapshotScheduler, SnapshotSchedulerConfig};

/// Errors raised by player persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// The call did not finish within the configured store timeout.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// A write was handed to the store but did not confirm in time. It may
    /// still be applied, so the caller must not assume either outcome.
    #[error("write not confirmed within {0:?}; it may still be applied")]
    WriteUnconfirmed(Duration),

    /// Internal error (task join errors, poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Immutable copy of a player record at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub player_id: String,
    pub taken_at: DateTime<Utc>,
    pub record: PlayerRecord,
    pub schema_version: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub players: usize,
    pub snapshots: usize,
}

/// Lazily evaluated stream of `(player_id, record)` pairs.
pub type PlayerScan<'a> = Box<dyn Iterator<Item = Result<(String, PlayerRecord), StoreError>> + 'a>;

/// Persistence contract for player records.
pub trait PlayerStore: Send + Sync {
    /// Fetch a record. Absent players yield [`StoreError::NotFound`].
    fn get(&self, player_id: &str) -> Result<PlayerRecord, StoreError>;

    /// Insert or replace a record.
    fn put(&self, record: &PlayerRecord) -> Result<(), StoreError>;

    fn contains(&self, player_id: &str) -> Result<bool, StoreError>;

    /// Copy the current record into the snapshot space stamped with `now`.
    fn snapshot(&self, player_id: &str, now: DateTime<Utc>) -> Result<SnapshotRecord, StoreError>;

    /// Snapshots for one player, oldest first.
    fn list_snapshots(&self, player_id: &str) -> Result<Vec<SnapshotRecord>, StoreError>;

    /// Delete every snapshot taken before `now - max_age`. Returns how many were removed.
    fn purge_snapshots_older_than(
        &self,
        max_age: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Stream all live records.
    fn scan(&self) -> PlayerScan<'_>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}

/// Timestamp used in snapshot keys. Falls back to microsecond precision outside
/// the range nanoseconds can represent.
pub(crate) fn snapshot_nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt()
        .unwrap_or_else(|| at.timestamp_micros().saturating_mul(1000))
}

/// Key timestamp below which snapshots are stale, or `None` when the cutoff
/// falls before the representable calendar and nothing can be stale.
pub(crate) fn purge_cutoff(max_age: chrono::Duration, now: DateTime<Utc>) -> Option<i64> {
    now.checked_sub_signed(max_age).map(snapshot_nanos)
}
