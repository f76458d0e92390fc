//! Checkpointer trait and error.
//!
//! Narrow key-value contract keyed by run id. Implementations must allow concurrent access
//! for different run ids without interference.

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointSource};

/// Checkpoint store failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    /// State could not be converted to or from bytes.
    #[error("serialization: {0}")]
    Serialization(String),

    /// Backend failure (e.g. SQLite I/O).
    #[error("storage: {0}")]
    Storage(String),
}

/// Persists checkpoints per run id.
///
/// `put` appends to the run's history; `get` returns the latest checkpoint. After
/// `put(run_id, cp)`, `get(run_id)` returns `cp` until the next `put` for the same id.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(&self, run_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError>;

    /// Latest checkpoint for the run, if any.
    async fn get(&self, run_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError>;

    /// Checkpoint history for the run, oldest first.
    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Drops every checkpoint of the run. Returns how many were removed.
    async fn delete(&self, run_id: &str) -> Result<usize, CheckpointError>;

    /// Saves a bare state for the run.
    async fn save(&self, run_id: &str, state: &S) -> Result<(), CheckpointError> {
        let step = self.list(run_id).await?.len() as u64;
        let checkpoint = Checkpoint::from_state(state.clone(), CheckpointSource::Loop, step, None, None);
        self.put(run_id, &checkpoint).await
    }

    /// Latest state for the run, if any.
    async fn load(&self, run_id: &str) -> Result<Option<S>, CheckpointError> {
        Ok(self.get(run_id).await?.map(|cp| cp.state))
    }
}
