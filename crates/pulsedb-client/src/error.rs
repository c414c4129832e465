use crate::path::Path;

/// Errors reported by the remote store client on listeners and writes.
///
/// These carry the client's own failure surface; the async layer above
/// translates but never reinterprets them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("permission denied at {0}")]
    PermissionDenied(Path),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("network disconnected")]
    Disconnected,

    #[error("write cancelled: {0}")]
    WriteCancelled(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("listener dropped before delivering an event")]
    ListenerDropped,
}

/// Payload could not be converted into the requested type.
///
/// An absent value is a decode failure, not a defined `None` result; callers
/// that want optionality decode into `Option<T>`-shaped payloads explicitly.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no value at {0}")]
    Absent(Path),

    #[error("value at {path} does not match the requested type: {source}")]
    Incompatible {
        path: Path,
        #[source]
        source: serde_json::Error,
    },
}
