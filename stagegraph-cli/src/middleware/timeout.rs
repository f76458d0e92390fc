//! Per-stage time budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stagegraph::{GraphState, StageCall, StageError, StageFuture, StageMiddleware};

/// Fails a stage with `StageError::Timeout` when it runs longer than `budget`.
///
/// Wraps an optional inner middleware; the budget covers the inner middleware too.
pub struct TimeoutMiddleware<S: GraphState> {
    budget: Duration,
    inner: Option<Arc<dyn StageMiddleware<S>>>,
}

impl<S: GraphState> TimeoutMiddleware<S> {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            inner: None,
        }
    }

    pub fn wrapping(mut self, inner: Arc<dyn StageMiddleware<S>>) -> Self {
        self.inner = Some(inner);
        self
    }
}

#[async_trait]
impl<S: GraphState> StageMiddleware<S> for TimeoutMiddleware<S> {
    async fn around_apply(
        &self,
        node_id: &str,
        state: S,
        call: StageCall<S>,
    ) -> Result<Vec<S::Update>, StageError> {
        let budget = self.budget;
        let run: StageFuture<S> = match &self.inner {
            Some(inner) => {
                let inner = inner.clone();
                let node_id = node_id.to_string();
                Box::pin(async move { inner.around_apply(&node_id, state, call).await })
            }
            None => call(state),
        };
        match tokio::time::timeout(budget, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(node_id, budget_ms = budget.as_millis() as u64, "Stage timed out");
                Err(StageError::Timeout(budget))
            }
        }
    }
}
