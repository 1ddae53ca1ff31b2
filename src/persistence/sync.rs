//! Debounced remote sync
//!
//! Local saves happen immediately; the remote copy is written once changes
//! have settled for `SYNC_DEBOUNCE_SECS`. A failed remote write only flips
//! the status to `Error`; the game keeps running on local state.

use super::snapshot::{SessionSnapshot, SnapshotStore, merge};
use crate::consts::SYNC_DEBOUNCE_SECS;
use crate::platform::KeyValueStore;
use crate::sim::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// A write is waiting for the debounce window to close
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

#[derive(Debug)]
pub struct DebouncedSync<S> {
    remote: SnapshotStore<S>,
    scheduler: Scheduler<()>,
    timer: Option<TimerHandle>,
    pending: Option<SessionSnapshot>,
    status: SyncStatus,
}

impl<S: KeyValueStore> DebouncedSync<S> {
    pub fn new(remote: S) -> Self {
        Self {
            remote: SnapshotStore::new(remote),
            scheduler: Scheduler::new(),
            timer: None,
            pending: None,
            status: SyncStatus::Idle,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn remote(&self) -> &SnapshotStore<S> {
        &self.remote
    }

    /// Queue `snapshot` for writing, restarting the debounce window
    pub fn request(&mut self, snapshot: SessionSnapshot) {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
        self.pending = Some(snapshot);
        self.timer = Some(self.scheduler.schedule(SYNC_DEBOUNCE_SECS, ()));
        self.status = SyncStatus::Syncing;
    }

    /// Advance the debounce clock, writing once the window closes
    pub fn tick(&mut self, dt: f32) {
        if !self.scheduler.advance(dt).is_empty() {
            self.timer = None;
            self.flush();
        }
    }

    /// Write the pending snapshot now
    pub fn flush(&mut self) -> SyncStatus {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
        let Some(snapshot) = self.pending.take() else {
            return self.status;
        };

        self.status = match self.remote.save(&snapshot) {
            Ok(()) => {
                log::debug!("Remote sync complete");
                SyncStatus::Synced
            }
            Err(e) => {
                log::error!("Remote sync failed: {}", e);
                SyncStatus::Error
            }
        };
        self.status
    }

    /// Forget a queued write without sending it
    pub fn cancel_pending(&mut self) {
        self.scheduler.cancel_all();
        self.timer = None;
        if self.pending.take().is_some() {
            self.status = SyncStatus::Idle;
        }
    }

    /// Pull the remote snapshot, merge it into `local` and push the result.
    ///
    /// The merged snapshot is returned even when the push fails.
    pub fn reconcile(&mut self, local: &SessionSnapshot) -> SessionSnapshot {
        let merged = match self.remote.load() {
            Some(remote) => {
                log::info!(
                    "Merging remote progress ({} stars) with local ({} stars)",
                    remote.profile.total_stars,
                    local.profile.total_stars
                );
                merge(local, &remote)
            }
            None => local.clone(),
        };

        self.cancel_pending();
        self.status = match self.remote.save(&merged) {
            Ok(()) => SyncStatus::Synced,
            Err(e) => {
                log::error!("Remote sync failed: {}", e);
                SyncStatus::Error
            }
        };
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::BrokenStore;
    use crate::platform::MemoryStore;
    use crate::rewards::Profile;

    fn snapshot_with_stars(stars: u32) -> SessionSnapshot {
        SessionSnapshot {
            profile: Profile {
                total_stars: stars,
                ..Profile::default()
            },
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn test_status_names() {
        let names: Vec<_> = [
            SyncStatus::Idle,
            SyncStatus::Syncing,
            SyncStatus::Synced,
            SyncStatus::Error,
        ]
        .iter()
        .map(SyncStatus::as_str)
        .collect();
        assert_eq!(names, vec!["idle", "syncing", "synced", "error"]);
    }

    #[test]
    fn test_writes_after_quiet_period() {
        let mut sync = DebouncedSync::new(MemoryStore::new());
        sync.request(snapshot_with_stars(1));
        sync.tick(1.0);
        sync.request(snapshot_with_stars(2));
        sync.tick(1.5);
        assert_eq!(sync.status(), SyncStatus::Syncing);
        assert!(sync.remote().load().is_none());

        sync.tick(0.6);
        assert_eq!(sync.status(), SyncStatus::Synced);
        assert!(!sync.has_pending());
        assert_eq!(sync.remote().load().unwrap().profile.total_stars, 2);
    }

    #[test]
    fn test_flush_and_cancel() {
        let mut sync = DebouncedSync::new(MemoryStore::new());
        sync.request(snapshot_with_stars(3));
        assert_eq!(sync.flush(), SyncStatus::Synced);

        sync.request(snapshot_with_stars(4));
        sync.cancel_pending();
        assert_eq!(sync.status(), SyncStatus::Idle);
        sync.tick(10.0);
        assert_eq!(sync.remote().load().unwrap().profile.total_stars, 3);
    }

    #[test]
    fn test_failure_sets_error() {
        let mut sync = DebouncedSync::new(BrokenStore);
        sync.request(snapshot_with_stars(1));
        sync.tick(SYNC_DEBOUNCE_SECS);
        assert_eq!(sync.status(), SyncStatus::Error);
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_reconcile_merges_and_pushes() {
        let mut remote = SnapshotStore::new(MemoryStore::new());
        remote.save(&snapshot_with_stars(30)).unwrap();
        let mut sync = DebouncedSync {
            remote,
            scheduler: Scheduler::new(),
            timer: None,
            pending: None,
            status: SyncStatus::Idle,
        };

        let merged = sync.reconcile(&snapshot_with_stars(10));
        assert_eq!(merged.profile.total_stars, 30);
        assert_eq!(sync.status(), SyncStatus::Synced);
        assert_eq!(sync.remote().load().unwrap().profile.total_stars, 30);
    }

    #[test]
    fn test_reconcile_offline_keeps_local() {
        let mut sync = DebouncedSync::new(BrokenStore);
        let merged = sync.reconcile(&snapshot_with_stars(10));
        assert_eq!(merged.profile.total_stars, 10);
        assert_eq!(sync.status(), SyncStatus::Error);
    }
}
