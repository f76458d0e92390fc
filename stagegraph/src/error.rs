//! Stage and run error types.
//!
//! [`StageError`] is what a stage returns when it cannot produce an update; the engine
//! records it into the run's error list and keeps routing. [`SchemaViolation`] and
//! [`RunError`] are contract failures that abort a run and reach the caller.

use std::time::Duration;

use thiserror::Error;

use crate::memory::CheckpointError;

/// Stage execution error.
///
/// Returned by `Stage::apply` when a stage fails (e.g. its external dependency failed after
/// its own retries, or its output broke its own contract). Recoverable: the engine appends it
/// to the run's errors and treats the stage as having returned an empty update.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    /// Execution failed with a message (e.g. model call failed, output did not parse).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The stage did not finish within its time budget.
    #[error("stage timed out after {0:?}")]
    Timeout(Duration),
}

impl StageError {
    /// Shorthand for `StageError::ExecutionFailed`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }
}

/// A stage update broke the stage/engine contract.
///
/// Raised when an update targets a field the emitting stage does not own, or when a merge
/// rejects a value as incompatible with the field (e.g. a decreasing iteration count).
/// Always fatal: the run aborts before the offending update is merged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("schema violation in stage '{stage}' on field '{field}': {reason}")]
pub struct SchemaViolation {
    /// Stage that produced the update. Empty when the merge is applied outside a run.
    pub stage: String,
    /// Field the update targeted.
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: String::new(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attributes the violation to a stage.
    pub fn in_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }
}

/// Unrecoverable run failure, returned by `CompiledStateGraph::invoke` / `resume`.
///
/// Business-level failures never show up here; they are carried in the state's error list.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// A router returned a label with no destination.
    #[error("node '{node_id}' routed to unknown outcome '{label}'")]
    UnknownRoute { node_id: String, label: String },

    /// The graph has no node with this id (e.g. resuming a checkpoint written by a
    /// different graph).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The run was cancelled between stages. The last checkpoint holds its state.
    #[error("run '{run_id}' cancelled after node '{node_id}'")]
    Cancelled { run_id: String, node_id: String },

    /// Engine safety cap: the run visited more stages than allowed.
    #[error("run '{run_id}' exceeded the step limit of {limit}")]
    StepLimitExceeded { run_id: String, limit: usize },

    #[error("resume requires a checkpointer")]
    NoCheckpointer,

    #[error("no checkpoint found for run '{0}'")]
    CheckpointNotFound(String),
}
