//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for run start/finish, stage execution, routing and
//! checkpointing. Fields carry `run_id` and `node_id` so a subscriber can filter one run.

use crate::error::{RunError, StageError};

pub fn log_run_start(run_id: &str, entry: &str) {
    tracing::info!(run_id, entry, "Starting graph run");
}

pub fn log_run_resume(run_id: &str, next: &str, step: u64) {
    tracing::info!(run_id, next, step, "Resuming graph run from checkpoint");
}

pub fn log_run_complete(run_id: &str, steps: u64) {
    tracing::info!(run_id, steps, "Graph run complete");
}

pub fn log_run_error(run_id: &str, error: &RunError) {
    tracing::error!(run_id, %error, "Graph run aborted");
}

/// Log stage execution start.
pub fn log_node_start(run_id: &str, node_id: &str) {
    tracing::debug!(run_id, node_id, "Starting stage");
}

/// Log a stage failure that was recorded into the state.
pub fn log_node_error(run_id: &str, node_id: &str, error: &StageError) {
    tracing::warn!(run_id, node_id, %error, "Stage failed; error recorded, run continues");
}

/// Log the routing decision made after a stage.
pub fn log_node_complete(run_id: &str, node_id: &str, next: &str) {
    tracing::debug!(run_id, node_id, next, "Stage complete");
}

pub fn log_checkpoint_saved(run_id: &str, step: u64) {
    tracing::trace!(run_id, step, "Checkpoint saved");
}
