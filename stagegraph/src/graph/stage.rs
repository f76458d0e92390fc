//! Stage trait: one processing step, state in, partial update out.
//!
//! Stages are implemented by collaborators outside the core. The engine only calls `apply`,
//! checks the returned entries against `writes`, and merges them.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::StageError;
use crate::state::GraphState;

/// One node's behaviour in a state graph.
///
/// `apply` reads the current state and returns the field writes to merge. An empty vector is
/// a valid "nothing to change" answer. Returning `Err` records the error in the run and is
/// treated like an empty update; routing decides what happens next.
///
/// **Interaction**: Registered with `StateGraph::add_node`; invoked by `CompiledStateGraph`.
#[async_trait]
pub trait Stage<S: GraphState>: Send + Sync {
    /// Stage name used in logs and error attribution.
    fn id(&self) -> &str;

    /// Derived fields this stage owns. An update touching any other non-shared field is a
    /// schema violation. No two stages in a graph may declare the same field.
    fn writes(&self) -> &[&'static str] {
        &[]
    }

    async fn apply(&self, state: &S) -> Result<Vec<S::Update>, StageError>;
}

type StageFn<S> = Box<
    dyn Fn(S) -> Pin<Box<dyn Future<Output = Result<Vec<<S as GraphState>::Update>, StageError>> + Send>>
        + Send
        + Sync,
>;

/// Stage built from an async closure. The closure receives an owned clone of the state.
pub struct FnStage<S: GraphState> {
    id: String,
    writes: Vec<&'static str>,
    f: StageFn<S>,
    _state: PhantomData<fn(S)>,
}

impl<S: GraphState> FnStage<S> {
    pub fn new<F, Fut>(id: impl Into<String>, writes: &[&'static str], f: F) -> Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<S::Update>, StageError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            writes: writes.to_vec(),
            f: Box::new(move |s| Box::pin(f(s))),
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S: GraphState> Stage<S> for FnStage<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn writes(&self) -> &[&'static str] {
        &self.writes
    }

    async fn apply(&self, state: &S) -> Result<Vec<S::Update>, StageError> {
        (self.f)(state.clone()).await
    }
}
