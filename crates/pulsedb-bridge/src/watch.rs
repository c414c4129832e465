//! Continuous subscriptions: a persistent listener exposed as a lazy stream.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use pulsedb_client::{ClientError, ListenerId, Query, Snapshot, ValueListener};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// Persistent listener feeding an unbounded channel. Consumers that fall
/// behind buffer; the client is never blocked by a slow stream.
struct WatchListener {
    tx: mpsc::UnboundedSender<Result<Snapshot, ClientError>>,
}

impl ValueListener for WatchListener {
    fn on_value(&self, snapshot: Snapshot) {
        let _ = self.tx.send(Ok(snapshot));
    }

    fn on_cancelled(&self, error: ClientError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Subscribes to ongoing value changes at `query`.
///
/// The returned stream yields the current value first, then every change the
/// client delivers, decoded in delivery order. It is unbounded and
/// non-restartable: a payload that fails to decode or a client-side
/// cancellation yields one final `Err` and ends the stream. Dropping the
/// stream deregisters the listener.
pub fn watch<Q, T>(query: Q) -> ValueStream<Q, T>
where
    Q: Query,
    T: DeserializeOwned,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let listener_id = query.listen(Arc::new(WatchListener { tx }));
    ValueStream {
        query,
        listener_id,
        rx,
        open: true,
        detached: false,
        _decoded: PhantomData,
    }
}

/// Stream of decoded values produced by [`watch`].
///
/// Owns the underlying listener registration for its whole lifetime and
/// removes it exactly once, on termination or drop, whichever comes first.
pub struct ValueStream<Q: Query, T> {
    query: Q,
    listener_id: ListenerId,
    rx: mpsc::UnboundedReceiver<Result<Snapshot, ClientError>>,
    open: bool,
    detached: bool,
    _decoded: PhantomData<fn() -> T>,
}

impl<Q: Query, T> ValueStream<Q, T> {
    /// Stops the subscription early. Deregistration still happens once even
    /// if the client reports a cancellation afterwards.
    pub fn close(&mut self) {
        self.open = false;
        self.detach();
    }

    fn detach(&mut self) {
        if !self.detached {
            self.detached = true;
            self.query.remove_listener(self.listener_id);
        }
    }
}

impl<Q, T> Stream for ValueStream<Q, T>
where
    Q: Query + Unpin,
    T: DeserializeOwned,
{
    type Item = Result<T, BridgeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.open {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(snapshot))) => match snapshot.decode::<T>() {
                Ok(value) => Poll::Ready(Some(Ok(value))),
                Err(error) => {
                    this.close();
                    Poll::Ready(Some(Err(BridgeError::Decode(error))))
                }
            },
            Poll::Ready(Some(Err(error))) => {
                this.close();
                Poll::Ready(Some(Err(BridgeError::Remote(error))))
            }
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<Q: Query, T> Drop for ValueStream<Q, T> {
    fn drop(&mut self) {
        self.detach();
    }
}
