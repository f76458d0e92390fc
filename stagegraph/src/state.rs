//! State record contract: typed partial updates and the merge policy.
//!
//! A graph threads one state value `S` through its stages. Stages never return a whole new
//! state; they return a partial update, a list of `S::Update` entries. Each entry is one
//! tagged field write, and `S::merge` applies it with that field's policy (replace, append,
//! shallow-merge, ...). The match over the tag is where the policy lives, so it is checked by
//! the compiler rather than discovered at run time.

use std::fmt::Debug;

use crate::error::{SchemaViolation, StageError};

/// A state record that can be threaded through a `StateGraph`.
///
/// Implementors define the update union and the per-field merge policy. `merge` must be pure
/// and deterministic: the same `(state, update)` pair always yields the same result.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// One field write produced by a stage.
    type Update: Clone + Send + Sync + Debug + 'static;

    /// Name of the field an update entry writes.
    fn field_of(update: &Self::Update) -> &'static str;

    /// Fields any stage may write (accumulators like errors and diagnostics).
    ///
    /// Every other field must be declared in the writing stage's `Stage::writes`.
    fn shared_fields() -> &'static [&'static str] {
        &[]
    }

    /// Applies one update entry, returning the new state.
    fn merge(&self, update: Self::Update) -> Result<Self, SchemaViolation>;

    /// Builds the update that records a failed stage (usually an append to the error list).
    fn stage_failed(stage: &str, error: &StageError) -> Self::Update;
}

/// Applies a partial update (a list of field writes) in order.
pub fn merge_all<S: GraphState>(
    state: &S,
    updates: impl IntoIterator<Item = S::Update>,
) -> Result<S, SchemaViolation> {
    let mut current = state.clone();
    for update in updates {
        current = current.merge(update)?;
    }
    Ok(current)
}

/// What a quality gate traversal produced; turned into updates by [`GateState::gate_updates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRecord {
    /// New feedback value (`PASSED` on success).
    pub feedback: String,
    /// Iteration count after this traversal (previous + 1).
    pub iteration_count: u32,
    /// Set when the gate decided to halt; appended to the run's errors.
    pub halted: Option<String>,
    /// True when the pass was forced by the `accept_after` threshold.
    pub forced_pass: bool,
}

/// State that carries the fields a quality gate reads and writes.
pub trait GateState: GraphState {
    /// Fields written by the gate stage; used for ownership checks.
    const GATE_FIELDS: &'static [&'static str];

    fn iteration_count(&self) -> u32;

    /// Latest gate feedback, `None` before the gate first runs.
    fn feedback(&self) -> Option<&str>;

    fn gate_updates(record: GateRecord) -> Vec<Self::Update>;
}
