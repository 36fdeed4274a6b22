//! The reload coordinator: a user-facing fence that forces a full
//! resynchronization from the remote store.
//!
//! A reload replaces all three collections wholesale, superseding any
//! optimistic state still pending. Concurrent calls never launch
//! overlapping fetches: a caller that arrives while a reload is in
//! flight waits for it and shares its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::error::SyncError;
use crate::remote::RemoteStore;
use crate::store::SharedStore;

/// Keeps the syncing indicator visible long enough to read. Purely for
/// UI legibility, not a correctness requirement.
const MIN_SYNC_VISIBLE: Duration = Duration::from_millis(120);

pub struct ReloadCoordinator<R> {
    store: SharedStore,
    remote: R,
    gate: Mutex<()>,
    generation: AtomicU64,
    syncing: watch::Sender<bool>,
}

impl<R: RemoteStore> ReloadCoordinator<R> {
    pub fn new(store: SharedStore, remote: R) -> Self {
        let (syncing, _) = watch::channel(false);
        Self {
            store,
            remote,
            gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            syncing,
        }
    }

    /// True while a reload is in flight.
    pub fn is_syncing(&self) -> bool {
        *self.syncing.borrow()
    }

    /// Subscribes to the syncing flag, for consumers that render against
    /// it.
    pub fn subscribe_syncing(&self) -> watch::Receiver<bool> {
        self.syncing.subscribe()
    }

    /// Fetches the full remote snapshot and replaces the local replica.
    ///
    /// If another reload is already in flight, waits for it and returns
    /// without fetching again.
    pub async fn force_reload(&self) -> Result<(), SyncError> {
        let seen = self.generation.load(Ordering::Acquire);
        let _guard = self.gate.lock().await;
        if self.generation.load(Ordering::Acquire) != seen {
            // A reload completed while we waited; its snapshot covers us.
            return Ok(());
        }

        self.syncing.send_replace(true);
        let started = Instant::now();

        let result = match self.remote.fetch_snapshot().await {
            Ok(snapshot) => {
                self.store.write(|s| s.replace_all(snapshot));
                self.generation.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        if elapsed < MIN_SYNC_VISIBLE {
            tokio::time::sleep(MIN_SYNC_VISIBLE - elapsed).await;
        }
        self.syncing.send_replace(false);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, PersonKey};
    use crate::store::Snapshot;
    use crate::testing::FakeRemote;
    use std::sync::Arc;

    fn setup() -> (SharedStore, FakeRemote, Arc<ReloadCoordinator<FakeRemote>>) {
        let store = SharedStore::new();
        let remote = FakeRemote::new();
        let coordinator = Arc::new(ReloadCoordinator::new(store.clone(), remote.clone()));
        (store, remote, coordinator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_replaces_collections() {
        let (store, remote, coordinator) = setup();
        remote.set_snapshot(Snapshot {
            people: vec![Person::new("12345678-9", "Ana", "Rojas")],
            ..Default::default()
        });

        coordinator.force_reload().await.unwrap();
        assert_eq!(store.read(|s| s.people().len()), 1);
        assert!(!coordinator.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_supersedes_optimistic_drift() {
        let (store, remote, coordinator) = setup();
        remote.set_snapshot(Snapshot::default());

        // An optimistic insert whose remote write silently failed: the
        // remote never saw it, so a reload removes it.
        store.write(|s| s.upsert_person(Person::new("12345678-9", "Ana", "Rojas")));
        assert_eq!(store.read(|s| s.people().len()), 1);

        coordinator.force_reload().await.unwrap();
        assert!(store.read(|s| s.get_person(&PersonKey::new("12345678-9")).is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reloads_share_one_fetch() {
        let (_store, remote, coordinator) = setup();
        remote.set_fetch_delay(Duration::from_millis(50));

        let a = coordinator.clone();
        let b = coordinator.clone();
        let (ra, rb) = tokio::join!(a.force_reload(), b.force_reload());
        ra.unwrap();
        rb.unwrap();

        assert_eq!(remote.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_syncing_flag_during_reload() {
        let (_store, remote, coordinator) = setup();
        remote.set_fetch_delay(Duration::from_millis(50));
        let mut syncing = coordinator.subscribe_syncing();

        let task = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.force_reload().await }
        });

        syncing.wait_for(|on| *on).await.unwrap();
        assert!(coordinator.is_syncing());

        syncing.wait_for(|on| !*on).await.unwrap();
        task.await.unwrap().unwrap();
        assert!(!coordinator.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reload_surfaces_error_and_clears_flag() {
        let (store, remote, coordinator) = setup();
        store.write(|s| s.upsert_person(Person::new("1-9", "Ana", "Rojas")));
        remote.fail_fetch(true);

        let result = coordinator.force_reload().await;
        assert!(matches!(result, Err(SyncError::Connection(_))));
        // Last known good state is kept
        assert_eq!(store.read(|s| s.people().len()), 1);
        assert!(!coordinator.is_syncing());

        // A later reload is not blocked by the failed one
        remote.fail_fetch(false);
        coordinator.force_reload().await.unwrap();
        assert_eq!(remote.fetch_count(), 2);
    }
}
