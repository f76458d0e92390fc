//! Stage middleware: wraps every stage invocation of a compiled graph.
//!
//! Set with `StateGraph::with_middleware` before compile. Typical uses are logging around each
//! stage and enforcing a per-stage time budget.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::StageError;
use crate::state::GraphState;

/// Boxed future returned by the wrapped stage call.
pub type StageFuture<S> =
    Pin<Box<dyn Future<Output = Result<Vec<<S as GraphState>::Update>, StageError>> + Send>>;

/// The wrapped stage call handed to middleware. Call it at most once.
pub type StageCall<S> = Box<dyn FnOnce(S) -> StageFuture<S> + Send>;

/// Runs around each stage's `apply`.
///
/// Implementations must call `inner` to run the stage (or return their own result to skip
/// it). The engine treats the returned value exactly like the stage's own result.
#[async_trait]
pub trait StageMiddleware<S: GraphState>: Send + Sync {
    async fn around_apply(
        &self,
        node_id: &str,
        state: S,
        inner: StageCall<S>,
    ) -> Result<Vec<S::Update>, StageError>;
}
