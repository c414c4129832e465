use pulsedb_client::{ClientError, DecodeError};

/// Failure surface of the async operations.
///
/// Exactly two kinds reach callers: the client reported a failure or
/// cancellation (`Remote`), or a delivered payload could not be converted
/// into the requested type (`Decode`). Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("remote store error: {0}")]
    Remote(#[from] ClientError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl BridgeError {
    pub fn is_remote(&self) -> bool {
        matches!(self, BridgeError::Remote(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, BridgeError::Decode(_))
    }
}
