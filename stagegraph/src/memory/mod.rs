//! # Memory: Checkpointing
//!
//! Per-run state snapshots keyed by run id, for resuming a run and for inspecting why it
//! stopped.
//!
//! ## Config
//!
//! [`RunnableConfig`] is passed to `CompiledStateGraph::invoke`:
//! - `run_id`: Required. Opaque, caller-supplied; the checkpoint key.
//! - `cancel`: Cooperative cancellation token, checked between stages.
//!
//! ## Checkpointer Implementations
//!
//! | Type             | Persistence | Use case                    | Feature  |
//! |------------------|-------------|-----------------------------|----------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests, single process  | —        |
//! | [`SqliteSaver`]  | SQLite file | Durable, resumable runs     | `sqlite` |
//!
//! Use with [`StateGraph::compile_with_checkpointer`](crate::graph::StateGraph::compile_with_checkpointer).
//! `SqliteSaver` stores state through [`JsonSerializer`], so the state must be
//! `Serialize + DeserializeOwned`.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;
