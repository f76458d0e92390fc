//! Streaming types for graph runs.
//!
//! Defines stream modes and events emitted by `CompiledStateGraph::stream` while a run
//! advances stage by stage.

use std::fmt::Debug;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each stage is merged.
    Values,
    /// Emit the node id, its merged state, and where routing sends the run next.
    Updates,
    /// Emit stage failures as they are recorded.
    Errors,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a stage.
    Values(S),
    /// The node that ran, the state after merging its update, and the chosen next node
    /// (`END` when the run finished).
    Updates { node_id: String, state: S, next: String },
    /// A stage failed; the error was appended to the state and the run continued.
    StageFailed { node_id: String, error: String },
    /// The run stopped on an unrecoverable error (schema violation, cancellation, ...).
    Aborted(String),
}
