//! Logging middleware: enter/exit events with elapsed time around each stage.

use std::time::Instant;

use async_trait::async_trait;
use stagegraph::{GraphState, StageCall, StageError, StageMiddleware};

/// Logs stage enter/exit through `tracing`. Exit events carry the number of field writes or
/// the stage error.
pub struct LoggingMiddleware;

#[async_trait]
impl<S: GraphState> StageMiddleware<S> for LoggingMiddleware {
    async fn around_apply(
        &self,
        node_id: &str,
        state: S,
        inner: StageCall<S>,
    ) -> Result<Vec<S::Update>, StageError> {
        tracing::info!(node_id, "Entering stage");
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(updates) => {
                tracing::info!(node_id, writes = updates.len(), elapsed_ms, "Stage finished")
            }
            Err(e) => tracing::warn!(node_id, error = %e, elapsed_ms, "Stage failed"),
        }
        result
    }
}
