use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;
use crate::path::Path;

/// Point-in-time payload delivered to a listener.
///
/// Snapshots are transient: consumers decode them into a typed value and let
/// them go. `value` is `None` when the location holds no value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    path: Path,
    value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: Path, value: Option<Value>) -> Self {
        Self { path, value }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Decodes the payload into `T`. An absent value fails with
    /// `DecodeError::Absent` rather than resolving to a default.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let value = self
            .value
            .clone()
            .ok_or_else(|| DecodeError::Absent(self.path.clone()))?;
        serde_json::from_value(value).map_err(|source| DecodeError::Incompatible {
            path: self.path.clone(),
            source,
        })
    }
}
