//! Serializer for checkpoint payloads (state and metadata <-> bytes).
//!
//! Used by persistent checkpointers. `MemorySaver` keeps `Checkpoint<S>` values as they are
//! and does not need one.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::memory::checkpointer::CheckpointError;

/// Converts a value to bytes and back for storage.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<T, CheckpointError>;
}

/// JSON serializer for any `Serialize + DeserializeOwned` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T> Serializer<T> for JsonSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(value).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}
