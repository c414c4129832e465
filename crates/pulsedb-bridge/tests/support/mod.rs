#![allow(dead_code)]

//! Hand-driven client doubles. Unlike the embedded memory backend, these
//! never fire callbacks on their own, letting tests hold operations
//! in-flight and observe registration and removal exactly.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use pulsedb_client::{
    ClientError, ListenerId, Path, Query, Reference, Snapshot, ValueListener, WriteAck,
};
use serde_json::Value;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Once,
    Persistent,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    active: BTreeMap<ListenerId, (Mode, Arc<dyn ValueListener>)>,
    removals: Vec<ListenerId>,
}

/// Query double whose callbacks fire only when the test says so.
#[derive(Clone)]
pub struct ManualQuery {
    path: Path,
    inner: Arc<Mutex<ManualState>>,
}

impl ManualQuery {
    pub fn new(path: &str) -> Self {
        Self {
            path: Path::parse(path),
            inner: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().expect("manual query mutex")
    }

    /// Delivers a payload to every armed listener; single-fire listeners are
    /// discarded afterwards, as a real client would.
    pub fn fire_value(&self, value: Value) {
        self.fire_snapshot(Snapshot::new(self.path.clone(), Some(value)));
    }

    pub fn fire_absent(&self) {
        self.fire_snapshot(Snapshot::new(self.path.clone(), None));
    }

    fn fire_snapshot(&self, snapshot: Snapshot) {
        let targets: Vec<(ListenerId, Mode, Arc<dyn ValueListener>)> = self
            .state()
            .active
            .iter()
            .map(|(id, (mode, listener))| (*id, *mode, Arc::clone(listener)))
            .collect();
        for (id, mode, listener) in targets {
            listener.on_value(snapshot.clone());
            if mode == Mode::Once {
                self.state().active.remove(&id);
            }
        }
    }

    /// Cancels every armed listener terminally, discarding the registrations.
    pub fn fire_cancelled(&self, error: ClientError) {
        let targets: Vec<Arc<dyn ValueListener>> = {
            let mut state = self.state();
            let ids: Vec<ListenerId> = state.active.keys().copied().collect();
            ids.into_iter()
                .filter_map(|id| state.active.remove(&id))
                .map(|(_, listener)| listener)
                .collect()
        };
        for listener in targets {
            listener.on_cancelled(error.clone());
        }
    }

    pub fn active_listeners(&self) -> usize {
        self.state().active.len()
    }

    /// Number of `remove_listener` calls observed, fired-or-not.
    pub fn removal_count(&self) -> usize {
        self.state().removals.len()
    }
}

impl Query for ManualQuery {
    fn path(&self) -> &Path {
        &self.path
    }

    fn listen_once(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.active.insert(id, (Mode::Once, listener));
        id
    }

    fn listen(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.active.insert(id, (Mode::Persistent, listener));
        id
    }

    fn remove_listener(&self, listener_id: ListenerId) {
        let mut state = self.state();
        state.removals.push(listener_id);
        state.active.remove(&listener_id);
    }
}

pub struct PendingWrite {
    pub path: Path,
    pub value: Value,
    pub ack: WriteAck,
}

#[derive(Default)]
struct ManualRefState {
    writes: Vec<PendingWrite>,
    next_push: u64,
    push_failure: Option<ClientError>,
}

/// Reference double that parks writes until the test acknowledges them.
/// Children created by `push` share the same write ledger.
#[derive(Clone)]
pub struct ManualRef {
    query: ManualQuery,
    writes: Arc<Mutex<ManualRefState>>,
}

impl std::fmt::Debug for ManualRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualRef").finish_non_exhaustive()
    }
}

impl ManualRef {
    pub fn new(path: &str) -> Self {
        Self {
            query: ManualQuery::new(path),
            writes: Arc::default(),
        }
    }

    pub fn fail_push(&self, error: ClientError) {
        self.writes.lock().expect("manual ref mutex").push_failure = Some(error);
    }

    /// Drains the parked writes, oldest first.
    pub fn take_writes(&self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.writes.lock().expect("manual ref mutex").writes)
    }

    pub fn pending_write_count(&self) -> usize {
        self.writes.lock().expect("manual ref mutex").writes.len()
    }

    fn record_write(&self, path: Path, value: Value, ack: WriteAck) {
        self.writes
            .lock()
            .expect("manual ref mutex")
            .writes
            .push(PendingWrite { path, value, ack });
    }
}

impl Query for ManualRef {
    fn path(&self) -> &Path {
        self.query.path()
    }

    fn listen_once(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.query.listen_once(listener)
    }

    fn listen(&self, listener: Arc<dyn ValueListener>) -> ListenerId {
        self.query.listen(listener)
    }

    fn remove_listener(&self, listener_id: ListenerId) {
        self.query.remove_listener(listener_id);
    }
}

impl Reference for ManualRef {
    fn set_value(&self, value: Value, ack: WriteAck) {
        self.record_write(self.query.path().clone(), value, ack);
    }

    fn set_child_value(&self, key: &str, value: Value, ack: WriteAck) {
        self.record_write(self.query.path().child(key), value, ack);
    }

    fn push(&self) -> Result<Self, ClientError> {
        let mut state = self.writes.lock().expect("manual ref mutex");
        if let Some(error) = state.push_failure.clone() {
            return Err(error);
        }
        state.next_push += 1;
        let key = format!("{:016}", state.next_push);
        drop(state);
        Ok(Self {
            query: ManualQuery {
                path: self.query.path().child(&key),
                inner: Arc::default(),
            },
            writes: Arc::clone(&self.writes),
        })
    }
}
