//! In-memory checkpointer for dev and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};

/// In-memory checkpointer keyed by run id.
///
/// Backed by a `DashMap`, so writes for one run id only lock that run's shard; concurrent runs
/// do not block each other. Keeps the full history per run; `get` returns the latest entry.
/// Data is lost when the saver is dropped.
pub struct MemorySaver<S> {
    runs: DashMap<String, Vec<Checkpoint<S>>>,
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
        }
    }

    /// Number of runs with at least one checkpoint.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(&self, run_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError> {
        self.runs
            .entry(run_id.to_string())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn get(&self, run_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        Ok(self
            .runs
            .get(run_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        Ok(self
            .runs
            .get(run_id)
            .map(|history| history.iter().map(Checkpoint::list_item).collect())
            .unwrap_or_default())
    }

    async fn delete(&self, run_id: &str) -> Result<usize, CheckpointError> {
        Ok(self
            .runs
            .remove(run_id)
            .map(|(_, history)| history.len())
            .unwrap_or(0))
    }
}
