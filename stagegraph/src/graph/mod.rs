//! State graph: stages + explicit edges, compile, then invoke / resume / stream.
//!
//! Add stages and edges to a [`StateGraph`], compile it once into an immutable
//! [`CompiledStateGraph`], then run it any number of times, concurrently if needed.

mod compile_error;
mod compiled;
mod logging;
mod router;
mod run_context;
mod stage;
mod stage_middleware;
mod state_graph;

pub use compile_error::TopologyError;
pub use compiled::CompiledStateGraph;
pub use router::{FnRouter, Router};
pub use run_context::RunContext;
pub use stage::{FnStage, Stage};
pub use stage_middleware::{StageCall, StageFuture, StageMiddleware};
pub use state_graph::{StateGraph, DEFAULT_MAX_STEPS, END, START};
