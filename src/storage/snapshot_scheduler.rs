//! Periodic player snapshots.
//!
//! The scheduler is clock driven: callers poll [`SnapshotScheduler::check_and_snapshot`]
//! (the REPL does so from a tokio interval) and a run happens once the configured
//! interval has elapsed since the previous one. Each run copies every live record
//! into the snapshot space and then applies the retention sweep.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::StorageConfig;
use crate::rpg::engine::GameEngine;
use crate::rpg::errors::GameError;

/// Snapshot scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSchedulerConfig {
    /// Whether periodic snapshots are enabled
    pub enabled: bool,
    /// Minutes between runs
    pub interval_minutes: u64,
    /// Snapshots older than this many days are purged after each run
    pub retention_days: u32,
}

impl Default for SnapshotSchedulerConfig {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

impl From<&StorageConfig> for SnapshotSchedulerConfig {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            enabled: storage.snapshots_enabled,
            interval_minutes: storage.snapshot_interval_minutes,
            retention_days: storage.snapshot_retention_days,
        }
    }
}

impl SnapshotSchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::minutes(self.interval_minutes.min(u64::from(u32::MAX)) as i64)
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }
}

/// What a single run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotRun {
    pub at: DateTime<Utc>,
    pub snapshotted: usize,
    pub purged: usize,
}

#[derive(Debug, Clone)]
pub struct SnapshotSchedulerStatus {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub retention_days: u32,
    pub last_run: Option<SnapshotRun>,
    pub runs: u64,
}

pub struct SnapshotScheduler {
    config: SnapshotSchedulerConfig,
    last_run: Option<SnapshotRun>,
    runs: u64,
}

impl SnapshotScheduler {
    pub fn new(config: SnapshotSchedulerConfig) -> Self {
        Self {
            config,
            last_run: None,
            runs: 0,
        }
    }

    pub fn config(&self) -> &SnapshotSchedulerConfig {
        &self.config
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
        info!("Automatic snapshots enabled");
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
        info!("Automatic snapshots disabled");
    }

    /// True when enabled and the interval has elapsed since the last run.
    /// A scheduler that has never run is due immediately.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.config.enabled || self.config.interval_minutes == 0 {
            return false;
        }
        match &self.last_run {
            None => true,
            Some(run) => now - run.at >= self.config.interval(),
        }
    }

    /// Run a snapshot pass if one is due.
    ///
    /// # Returns
    /// - `Ok(Some(run))` if snapshots were taken
    /// - `Ok(None)` if nothing was due
    /// - `Err(e)` if the store failed mid-run; the run is not recorded so the next poll retries
    pub async fn check_and_snapshot(
        &mut self,
        engine: &GameEngine,
        now: DateTime<Utc>,
    ) -> Result<Option<SnapshotRun>, GameError> {
        if !self.is_due(now) {
            return Ok(None);
        }
        let run = Self::run_once(engine, self.config.retention(), now).await?;
        self.last_run = Some(run);
        self.runs += 1;
        Ok(Some(run))
    }

    /// Snapshot every player, then purge snapshots older than `retention`.
    pub async fn run_once(
        engine: &GameEngine,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> Result<SnapshotRun, GameError> {
        info!("Taking scheduled player snapshots");
        let snapshotted = engine.snapshot_all().await?;
        let purged = engine.purge_snapshots(retention).await?;
        if purged > 0 {
            info!("Retention sweep removed {} old snapshot(s)", purged);
        }
        info!("Snapshotted {} player(s)", snapshotted);
        Ok(SnapshotRun {
            at: now,
            snapshotted,
            purged,
        })
    }

    pub fn status(&self) -> SnapshotSchedulerStatus {
        SnapshotSchedulerStatus {
            enabled: self.config.enabled,
            interval_minutes: self.config.interval_minutes,
            retention_days: self.config.retention_days,
            last_run: self.last_run,
            runs: self.runs,
        }
    }

    /// Poll in the background until the returned handle is aborted.
    pub fn spawn(mut self, engine: GameEngine, poll: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            loop {
                ticker.tick().await;
                let now = engine.now();
                match self.check_and_snapshot(&engine, now).await {
                    Ok(Some(run)) => debug!("snapshot run finished: {:?}", run),
                    Ok(None) => {}
                    Err(e) => warn!("Scheduled snapshot failed: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(interval_minutes: u64) -> SnapshotScheduler {
        SnapshotScheduler::new(SnapshotSchedulerConfig {
            enabled: true,
            interval_minutes,
            retention_days: 30,
        })
    }

    #[test]
    fn fresh_scheduler_is_due() {
        assert!(scheduler(60).is_due(Utc::now()));
    }

    #[test]
    fn interval_gates_later_runs() {
        let mut s = scheduler(60);
        let start = Utc::now();
        s.last_run = Some(SnapshotRun {
            at: start,
            snapshotted: 0,
            purged: 0,
        });
        assert!(!s.is_due(start + Duration::minutes(59)));
        assert!(s.is_due(start + Duration::minutes(60)));
    }

    #[test]
    fn disabled_scheduler_never_runs() {
        let mut s = scheduler(60);
        s.disable();
        assert!(!s.is_due(Utc::now()));
        s.enable();
        assert!(s.config().enabled);
        assert_eq!(s.status().runs, 0);
    }

    #[test]
    fn config_follows_storage_section() {
        let storage = StorageConfig {
            snapshot_interval_minutes: 15,
            snapshot_retention_days: 7,
            ..StorageConfig::default()
        };
        let config = SnapshotSchedulerConfig::from(&storage);
        assert_eq!(config.interval(), Duration::minutes(15));
        assert_eq!(config.retention(), Duration::days(7));
    }
}
