//! # stagegraph
//!
//! A small workflow-orchestration core for multi-stage pipelines. One typed state flows
//! through a directed graph of stages; each stage reads the state and returns a partial
//! update, which the engine checks against the stage's declared fields and merges.
//!
//! ## Design Principles
//!
//! - **Single state type**: each graph uses one state type implementing [`GraphState`]. Its
//!   `Update` type enumerates field writes, so a stage can only touch fields it names.
//! - **Stage failures are data**: a failing stage appends to the state's error list and the run
//!   keeps routing; only contract violations abort a run.
//! - **Bounded retry**: a [`QualityGate`] evaluates a stage's output and routes back for
//!   another attempt at most `max_iterations` times.
//! - **Compile once**: topology errors (missing routes, unreachable nodes, two stages owning
//!   one field) are reported by `compile`, before any run starts.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Stage`, `Router`, `StageMiddleware`.
//! - [`gate`]: `QualityGate`, `Evaluator`, `GateOutcome`, `GateRoutes`.
//! - [`state`]: `GraphState`, `GateState`, `merge_all`.
//! - [`memory`]: `Checkpointer`, `MemorySaver`, optional `SqliteSaver`, `RunnableConfig`.
//! - [`stream`]: `StreamMode`, `StreamEvent` for `CompiledStateGraph::stream`.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent checkpointer backed by SQLite.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stagegraph::{
//!     FnStage, GraphState, RunnableConfig, SchemaViolation, StageError, StateGraph, END, START,
//! };
//!
//! #[derive(Clone, Debug, Default)]
//! struct Greeting { text: String, errors: Vec<String> }
//!
//! #[derive(Clone, Debug)]
//! enum GreetingUpdate { Text(String), Error(String) }
//!
//! impl GraphState for Greeting {
//!     type Update = GreetingUpdate;
//!     fn field_of(u: &GreetingUpdate) -> &'static str {
//!         match u { GreetingUpdate::Text(_) => "text", GreetingUpdate::Error(_) => "errors" }
//!     }
//!     fn shared_fields() -> &'static [&'static str] { &["errors"] }
//!     fn merge(&self, u: GreetingUpdate) -> Result<Self, SchemaViolation> {
//!         let mut next = self.clone();
//!         match u {
//!             GreetingUpdate::Text(t) => next.text = t,
//!             GreetingUpdate::Error(e) => next.errors.push(e),
//!         }
//!         Ok(next)
//!     }
//!     fn stage_failed(stage: &str, e: &StageError) -> GreetingUpdate {
//!         GreetingUpdate::Error(format!("{stage}: {e}"))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut graph = StateGraph::<Greeting>::new();
//! graph.add_node("hello", Arc::new(FnStage::new("hello", &["text"], |_s: Greeting| async {
//!     Ok(vec![GreetingUpdate::Text("hello".into())])
//! })));
//! graph.add_edge(START, "hello");
//! graph.add_edge("hello", END);
//! let compiled = graph.compile().unwrap();
//! let out = compiled.invoke(Greeting::default(), &RunnableConfig::new("run-1")).await.unwrap();
//! assert_eq!(out.text, "hello");
//! # }
//! ```

pub mod error;
pub mod gate;
pub mod graph;
pub mod memory;
pub mod state;
pub mod stream;

pub use error::{RunError, SchemaViolation, StageError};
pub use gate::{
    ContractCheck, Evaluator, GateOutcome, GateRoutes, QualityGate, Verdict, MAX_ITERATIONS,
    PASSED,
};
pub use graph::{
    CompiledStateGraph, FnRouter, FnStage, Router, RunContext, Stage, StageCall, StageFuture,
    StageMiddleware, StateGraph, TopologyError, DEFAULT_MAX_STEPS, END, START,
};
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, Serializer,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use state::{merge_all, GateRecord, GateState, GraphState};
pub use stream::{StreamEvent, StreamMode};
