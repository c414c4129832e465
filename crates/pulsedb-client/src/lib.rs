//! Client contract for a callback-based realtime remote store.
//!
//! Defines the location handles (`Reference`, `Query`), the listener surface
//! the store invokes (`ValueListener`, `Snapshot`), the client error types,
//! and an embedded in-memory backend. The async adaptation layer lives in
//! the `pulsedb-bridge` crate.

pub mod client;
pub mod error;
pub mod memory;
pub mod path;
pub mod snapshot;

pub use crate::client::{ListenerId, Query, Reference, ValueListener, WriteAck};
pub use crate::error::{ClientError, DecodeError};
pub use crate::memory::{MemoryDb, MemoryQuery, MemoryRef};
pub use crate::path::Path;
pub use crate::snapshot::Snapshot;
