use std::sync::Arc;

use serde_json::Value;

use crate::error::ClientError;
use crate::path::Path;
use crate::snapshot::Snapshot;

/// Registration handle for a listener. Removal by id is idempotent: removing
/// an id that already fired or was already removed is a no-op.
pub type ListenerId = u64;

/// Completion callback for a write submitted to the client.
pub type WriteAck = Box<dyn FnOnce(Result<(), ClientError>) + Send + 'static>;

/// Callback surface the client invokes on value delivery.
///
/// The client owns delivery threading; implementations must be safe to call
/// from whatever thread the client's internal synchronization chooses, hence
/// `&self` methods and `Send + Sync`.
pub trait ValueListener: Send + Sync {
    fn on_value(&self, snapshot: Snapshot);

    /// The client cancelled the listener (permission change, disconnect, ...).
    /// No further callbacks follow.
    fn on_cancelled(&self, error: ClientError);
}

/// A readable view over a location in the remote store.
pub trait Query: Send + Sync {
    fn path(&self) -> &Path;

    /// Arms a single-fire listener: the client delivers exactly one
    /// `on_value` or one `on_cancelled` and discards the listener. It is
    /// never re-armed.
    fn listen_once(&self, listener: Arc<dyn ValueListener>) -> ListenerId;

    /// Arms a persistent listener: the current value is delivered
    /// immediately, then every subsequent change, until removal.
    fn listen(&self, listener: Arc<dyn ValueListener>) -> ListenerId;

    fn remove_listener(&self, listener_id: ListenerId);
}

/// A writable location in the remote store. Every reference is also a query
/// over its own path.
pub trait Reference: Query {
    /// Submits a full-value write; `ack` fires once with the outcome.
    fn set_value(&self, value: Value, ack: WriteAck);

    /// Submits a write at the named child of this location.
    fn set_child_value(&self, key: &str, value: Value, ack: WriteAck);

    /// Asks the client to generate a new uniquely-ordered child location.
    /// Generated keys order by creation, and the returned handle is a strict
    /// descendant of this one.
    fn push(&self) -> Result<Self, ClientError>
    where
        Self: Sized;
}
