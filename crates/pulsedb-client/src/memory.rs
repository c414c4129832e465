//! Embedded in-memory backend.
//!
//! Implements the client contract over process-local state: an exact-path
//! value table plus a listener registry. Useful on its own as a local store
//! and as the backend the integration tests drive. Listeners observe the
//! path they registered at; there is no parent/child aggregation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::client::{ListenerId, Query, Reference, ValueListener, WriteAck};
use crate::error::ClientError;
use crate::path::Path;
use crate::snapshot::Snapshot;

#[derive(Default)]
struct MemoryState {
    values: BTreeMap<Path, Value>,
    listeners: BTreeMap<ListenerId, ListenerEntry>,
    next_listener_id: u64,
    next_push_key: u64,
}

struct ListenerEntry {
    path: Path,
    listener: Arc<dyn ValueListener>,
}

impl MemoryState {
    fn allocate_listener_id(&mut self) -> ListenerId {
        self.next_listener_id += 1;
        self.next_listener_id
    }

    /// Zero-padded monotonic keys so generated children order by creation.
    fn allocate_push_key(&mut self) -> String {
        self.next_push_key += 1;
        format!("{:016}", self.next_push_key)
    }

    fn snapshot_at(&self, path: &Path) -> Snapshot {
        Snapshot::new(path.clone(), self.values.get(path).cloned())
    }
}

/// Process-local store implementing the client contract.
///
/// Cloning shares the same state; handles returned by [`MemoryDb::reference`]
/// stay valid across clones.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(&self, path: impl Into<Path>) -> MemoryRef {
        MemoryRef {
            db: self.clone(),
            path: path.into(),
        }
    }

    /// Current value stored exactly at `path`, if any.
    pub fn value_at(&self, path: &Path) -> Option<Value> {
        self.state().values.get(path).cloned()
    }

    pub fn active_listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    /// Cancels every listener registered at `path`, delivering `error` and
    /// removing the registrations. This is the failure surface a remote
    /// client produces when, e.g., read permission is revoked mid-listen.
    pub fn revoke(&self, path: &Path, error: ClientError) {
        let cancelled: Vec<Arc<dyn ValueListener>> = {
            let mut state = self.state();
            let ids: Vec<ListenerId> = state
                .listeners
                .iter()
                .filter(|(_, entry)| entry.path == *path)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| state.listeners.remove(&id))
                .map(|entry| entry.listener)
                .collect()
        };
        for listener in cancelled {
            listener.on_cancelled(error.clone());
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().expect("memory backend mutex poisoned")
    }

    fn listen_once_at(&self, path: &Path, listener: Arc<dyn ValueListener>) -> ListenerId {
        // Single-fire listeners deliver the current snapshot immediately and
        // are never retained, so there is nothing to remove afterwards.
        let (id, snapshot) = {
            let mut state = self.state();
            (state.allocate_listener_id(), state.snapshot_at(path))
        };
        listener.on_value(snapshot);
        id
    }

    fn listen_at(&self, path: &Path, listener: Arc<dyn ValueListener>) -> ListenerId {
        let (id, snapshot) = {
            let mut state = self.state();
            let id = state.allocate_listener_id();
            state.listeners.insert(
                id,
                ListenerEntry {
                    path: path.clone(),
                    listener: Arc::clone(&listener),
                },
            );
            (id, state.snapshot_at(path))
        };
        listener.on_value(snapshot);
        id
    }

    fn remove(&self, listener_id: ListenerId) {
        // Unknown ids (already fired, already removed) are a no-op.
        self.state().listeners.remove(&listener_id);
    }

    fn write(&self, path: &Path, value: Value, ack: WriteAck) {
        // Callbacks run outside the state lock; delivery order follows the
        // order writes take the lock.
        let (snapshot, watchers) = {
            let mut state = self.state();
            state.values.insert(path.clone(), value);
            let snapshot = state.snapshot_at(path);
            let watchers: Vec<Arc<dyn ValueListener>> = state
                .listeners
                .values()
                .filter(|entry| entry.path == *path)
                .map(|entry| Arc::clone(&entry.listener))
                .collect();
            (snapshot, watchers)
        };
        for watcher in watchers {
            watcher.on_value(snapshot.clone());
        }
        ack(Ok(()));
    }
}

/// Read-only view over a location in a [`MemoryDb`].
#[derive(Clone)]
pub struct MemoryQuery {
    db: MemoryDb,
    path: Path,
}

impl Query for MemoryQuery {
    fn path(&self) -> &Path {
        &self.path
    }

    fn listen_once(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.db.listen_once_at(&self.path, listener)
    }

    fn listen(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.db.listen_at(&self.path, listener)
    }

    fn remove_listener(&self, listener_id: ListenerId) {
        self.db.remove(listener_id);
    }
}

/// Location handle in a [`MemoryDb`].
#[derive(Clone)]
pub struct MemoryRef {
    db: MemoryDb,
    path: Path,
}

impl MemoryRef {
    pub fn child(&self, key: &str) -> MemoryRef {
        MemoryRef {
            db: self.db.clone(),
            path: self.path.child(key),
        }
    }

    pub fn to_query(&self) -> MemoryQuery {
        MemoryQuery {
            db: self.db.clone(),
            path: self.path.clone(),
        }
    }

    pub fn db(&self) -> &MemoryDb {
        &self.db
    }
}

impl Query for MemoryRef {
    fn path(&self) -> &Path {
        &self.path
    }

    fn listen_once(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.db.listen_once_at(&self.path, listener)
    }

    fn listen(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.db.listen_at(&self.path, listener)
    }

    fn remove_listener(&self, listener_id: ListenerId) {
        self.db.remove(listener_id);
    }
}

impl Reference for MemoryRef {
    fn set_value(&self, value: Value, ack: WriteAck) {
        self.db.write(&self.path, value, ack);
    }

    fn set_child_value(&self, key: &str, value: Value, ack: WriteAck) {
        self.db.write(&self.path.child(key), value, ack);
    }

    fn push(&self) -> Result<Self, ClientError> {
        let key = self.db.state().allocate_push_key();
        Ok(self.child(&key))
    }
}
