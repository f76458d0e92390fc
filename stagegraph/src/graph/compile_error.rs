//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the topology is invalid. Compilation happens once
//! per process, before any run starts, so all of these are fatal at build time.

use thiserror::Error;

/// Invalid graph topology.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// An edge or route names a node that was not registered via `add_node` (and is not END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge from START.
    #[error("graph must designate an entry node with an edge from START")]
    MissingEntry,

    /// More than one edge from START.
    #[error("graph must have exactly one entry node, found: {0:?}")]
    MultipleEntries(Vec<String>),

    /// A node has both an unconditional and a conditional outgoing edge.
    #[error("node '{0}' has both an unconditional and a conditional outgoing edge")]
    ConflictingEdges(String),

    /// A node has two unconditional (or two conditional) outgoing edges.
    #[error("node '{0}' has more than one outgoing edge")]
    DuplicateEdge(String),

    /// A router can return a label that has no destination.
    #[error("conditional edge from '{node_id}' has no destination for outcome '{label}'")]
    MissingRoute { node_id: String, label: String },

    /// A node has no outgoing edge at all.
    #[error("node '{0}' has no outgoing edge (route it to END explicitly)")]
    MissingOutgoingEdge(String),

    /// A node cannot be reached from the entry.
    #[error("node '{0}' is unreachable from the entry node")]
    Unreachable(String),

    /// Two stages declare ownership of the same derived field.
    #[error("field '{field}' is written by both '{first}' and '{second}'")]
    SharedField {
        field: String,
        first: String,
        second: String,
    },
}
