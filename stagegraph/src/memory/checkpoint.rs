//! Checkpoint and metadata types.
//!
//! One checkpoint is written at run start and one after every stage. The metadata records the
//! node that just ran and the node routing chose next, which is what `resume` needs.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Metadata for a single checkpoint.
///
/// Used by Checkpointer implementations and by `list()` for post-hoc inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Number of stages completed when the checkpoint was taken.
    pub step: u64,
    /// Node that produced this state; `None` for the input checkpoint.
    pub node_id: Option<String>,
    /// Node to run next; `None` once the run reached END.
    pub next: Option<String>,
    pub created_at: Option<SystemTime>,
}

/// Source of the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointSource {
    /// Initial state, before the entry stage.
    Input,
    /// After a stage inside the run loop.
    Loop,
}

/// One checkpoint: state snapshot plus id/ts and metadata.
///
/// **Interaction**: Produced by graph execution; consumed by Checkpointer::put,
/// returned by get.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint<S> {
    pub id: String,
    pub ts: String,
    pub state: S,
    pub metadata: CheckpointMetadata,
}

/// Item returned by Checkpointer::list for history.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from current state. Uses current time for id/ts.
    pub fn from_state(
        state: S,
        source: CheckpointSource,
        step: u64,
        node_id: Option<String>,
        next: Option<String>,
    ) -> Self {
        let now = SystemTime::now();
        let ts = format!(
            "{}",
            now.duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        let id = format!("{}-{}", ts, step);
        Self {
            id,
            ts,
            state,
            metadata: CheckpointMetadata {
                source,
                step,
                node_id,
                next,
                created_at: Some(now),
            },
        }
    }

    /// True when the run that wrote this checkpoint reached END.
    pub fn is_terminal(&self) -> bool {
        self.metadata.next.is_none()
    }

    pub fn list_item(&self) -> CheckpointListItem {
        CheckpointListItem {
            checkpoint_id: self.id.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
