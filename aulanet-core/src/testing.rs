//! Test doubles shared by the gateway and reload tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::SyncError;
use crate::remote::{RemoteStore, RemoteWrite};
use crate::store::Snapshot;

#[derive(Default)]
struct FakeRemoteState {
    snapshot: Snapshot,
    writes: Vec<RemoteWrite>,
    fail_writes: bool,
    fail_fetch: bool,
    fetch_count: usize,
    fetch_delay: Option<Duration>,
}

/// In-memory stand-in for the remote store. Records every write,
/// maintains its own authoritative snapshot, and can be told to fail.
#[derive(Clone, Default)]
pub(crate) struct FakeRemote {
    state: Arc<Mutex<FakeRemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, FakeRemoteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn writes(&self) -> Vec<RemoteWrite> {
        self.locked().writes.clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.locked().fail_writes = fail;
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.locked().fail_fetch = fail;
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        self.locked().snapshot = snapshot;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.locked().fetch_delay = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.locked().fetch_count
    }

    /// Applies a write to the fake's own snapshot so a later fetch
    /// reflects it, the way the real server would.
    fn record(&self, write: RemoteWrite) {
        let mut state = self.locked();
        match &write {
            RemoteWrite::InsertPerson(p) => {
                state.snapshot.people.retain(|x| x.rut != p.rut);
                state.snapshot.people.push(p.clone());
            }
            RemoteWrite::UpdatePerson(key, update) => {
                if let Some(p) = state.snapshot.people.iter_mut().find(|x| &x.rut == key) {
                    update.apply(p);
                }
            }
            RemoteWrite::DeletePerson(key) => {
                state.snapshot.people.retain(|x| &x.rut != key);
            }
            RemoteWrite::InsertOffering(o) => {
                state.snapshot.offerings.retain(|x| x.id != o.id);
                state.snapshot.offerings.push(o.clone());
            }
            RemoteWrite::UpdateOffering(id, update) => {
                if let Some(o) = state.snapshot.offerings.iter_mut().find(|x| &x.id == id) {
                    update.apply(o);
                }
            }
            RemoteWrite::DeleteOffering(id) => {
                state.snapshot.offerings.retain(|x| &x.id != id);
            }
            RemoteWrite::InsertEnrollment(e) => {
                state.snapshot.enrollments.retain(|x| x.id != e.id);
                state.snapshot.enrollments.push(e.clone());
            }
            RemoteWrite::UpdateEnrollment(id, update) => {
                if let Some(e) = state.snapshot.enrollments.iter_mut().find(|x| &x.id == id) {
                    update.apply(e);
                }
            }
            RemoteWrite::DeleteEnrollment(id) => {
                state.snapshot.enrollments.retain(|x| &x.id != id);
            }
        }
        state.writes.push(write);
    }
}

impl RemoteStore for FakeRemote {
    async fn apply(&self, write: RemoteWrite) -> Result<(), SyncError> {
        if self.locked().fail_writes {
            return Err(SyncError::Connection("injected write failure".to_string()));
        }
        self.record(write);
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, SyncError> {
        let delay = {
            let mut state = self.locked();
            state.fetch_count += 1;
            if state.fail_fetch {
                return Err(SyncError::Connection("injected fetch failure".to_string()));
            }
            state.fetch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.locked().snapshot.clone())
    }
}
