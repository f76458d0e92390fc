//! Run config: run_id and cancellation signal.
//!
//! Passed to `CompiledStateGraph::invoke` / `resume` / `stream`. The run id is an opaque,
//! caller-supplied string used as the checkpoint key.

use tokio_util::sync::CancellationToken;

/// Config for a single run.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, &config)`; `run_id` keys
/// `Checkpointer::put` / `get` / `list`.
#[derive(Debug, Clone)]
pub struct RunnableConfig {
    /// Identifies the run. Distinct runs must use distinct ids.
    pub run_id: String,
    /// Cooperative cancellation. Checked between stages, never mid-stage.
    pub cancel: CancellationToken,
}

impl RunnableConfig {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses the given token so the caller can cancel the run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
