//! One-shot operations: awaitable reads and writes over the callback client.

use std::sync::{Arc, Mutex};

use pulsedb_client::{
    ClientError, ListenerId, Query, Reference, Snapshot, ValueListener, WriteAck,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::BridgeError;

/// Single-fire listener feeding a oneshot channel. The sender is taken on
/// the first event, so a late second callback has nothing left to complete.
struct OnceListener {
    slot: Mutex<Option<oneshot::Sender<Result<Snapshot, ClientError>>>>,
}

impl OnceListener {
    fn new(tx: oneshot::Sender<Result<Snapshot, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Some(tx)),
        })
    }

    fn complete(&self, outcome: Result<Snapshot, ClientError>) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        if let Some(tx) = slot.take() {
            // A dropped receiver means the caller cancelled; nothing to do.
            let _ = tx.send(outcome);
        }
    }
}

impl ValueListener for OnceListener {
    fn on_value(&self, snapshot: Snapshot) {
        self.complete(Ok(snapshot));
    }

    fn on_cancelled(&self, error: ClientError) {
        self.complete(Err(error));
    }
}

/// Removes the listener when dropped, whether the operation resolved or the
/// caller cancelled mid-flight. Removal at the client is idempotent.
struct ListenerGuard<'a, Q: Query + ?Sized> {
    query: &'a Q,
    listener_id: ListenerId,
}

impl<Q: Query + ?Sized> Drop for ListenerGuard<'_, Q> {
    fn drop(&mut self) {
        self.query.remove_listener(self.listener_id);
    }
}

/// Awaits the first payload at `query` and decodes it into `T`.
///
/// An absent value fails with [`BridgeError::Decode`] rather than resolving
/// with a default; a client-side cancellation fails with
/// [`BridgeError::Remote`]. Dropping the returned future before delivery
/// deregisters the listener and nothing is observed afterwards.
pub async fn read_value<Q, T>(query: &Q) -> Result<T, BridgeError>
where
    Q: Query + ?Sized,
    T: DeserializeOwned,
{
    let (tx, rx) = oneshot::channel();
    let listener_id = query.listen_once(OnceListener::new(tx));
    let _guard = ListenerGuard { query, listener_id };

    let snapshot = match rx.await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(error)) => return Err(BridgeError::Remote(error)),
        // Client discarded the listener without firing either callback.
        Err(_) => return Err(BridgeError::Remote(ClientError::ListenerDropped)),
    };
    Ok(snapshot.decode()?)
}

/// Submits a full-value write and awaits the client's acknowledgment.
pub async fn write_value<R>(reference: &R, value: Value) -> Result<(), BridgeError>
where
    R: Reference + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    reference.set_value(value, send_ack(tx));
    await_ack(rx).await
}

/// Submits a write at the named child of `reference` and awaits the
/// acknowledgment.
pub async fn write_child_value<R>(reference: &R, key: &str, value: Value) -> Result<(), BridgeError>
where
    R: Reference + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    reference.set_child_value(key, value, send_ack(tx));
    await_ack(rx).await
}

/// Asks the client for a fresh uniquely-ordered child location under
/// `reference`, writes `value` there, and returns the generated handle.
/// The written location is a strict descendant of `reference`.
pub async fn push_value<R>(reference: &R, value: Value) -> Result<R, BridgeError>
where
    R: Reference,
{
    let child = reference.push().map_err(BridgeError::Remote)?;
    write_value(&child, value).await?;
    Ok(child)
}

fn send_ack(tx: oneshot::Sender<Result<(), ClientError>>) -> WriteAck {
    Box::new(move |result| {
        let _ = tx.send(result);
    })
}

async fn await_ack(rx: oneshot::Receiver<Result<(), ClientError>>) -> Result<(), BridgeError> {
    match rx.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(BridgeError::Remote(error)),
        // Client dropped the acknowledgment without invoking it.
        Err(_) => Err(BridgeError::Remote(ClientError::WriteCancelled(
            "acknowledgment dropped without a result".to_string(),
        ))),
    }
}
