//! Compiled state graph: immutable, supports invoke, resume and stream.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. Holds stages, one outgoing
//! edge per stage, the entry id, an optional checkpointer and an optional stage middleware.
//! When a checkpointer is set, a checkpoint is written under `config.run_id` at run start and
//! after every stage, so an interrupted run can be continued with `resume`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{RunError, SchemaViolation, StageError};
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};
use crate::state::{merge_all, GraphState};
use crate::stream::{StreamEvent, StreamMode};

use super::logging::{
    log_checkpoint_saved, log_node_complete, log_node_error, log_node_start, log_run_complete,
    log_run_error, log_run_resume, log_run_start,
};
use super::router::Router;
use super::stage::Stage;
use super::stage_middleware::{StageCall, StageFuture, StageMiddleware};
use super::{RunContext, END};

/// Conditional edge: a router plus its outcome label → destination map.
#[derive(Clone)]
pub(crate) struct ConditionalEdge<S> {
    pub(crate) router: Arc<dyn Router<S>>,
    pub(crate) routes: HashMap<String, String>,
}

/// The single outgoing edge of a compiled stage.
#[derive(Clone)]
pub(crate) enum Edge<S> {
    Direct(String),
    Conditional(ConditionalEdge<S>),
}

/// Compiled graph: immutable structure, safe to share across concurrent runs.
///
/// Created by `StateGraph::compile()` or `compile_with_checkpointer()`. Runs from the entry
/// stage; after each stage the update is ownership-checked and merged, then the stage's
/// outgoing edge picks the next stage from the merged state.
#[derive(Clone)]
pub struct CompiledStateGraph<S: GraphState> {
    pub(super) nodes: HashMap<String, Arc<dyn Stage<S>>>,
    pub(super) edges: HashMap<String, Edge<S>>,
    pub(super) entry: String,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn StageMiddleware<S>>>,
    pub(super) max_steps: usize,
}

impl<S: GraphState> CompiledStateGraph<S> {
    /// Id of the stage every new run starts at.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Registered stage ids (unordered).
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    /// Runs the graph to completion from the entry stage.
    ///
    /// Stage failures never surface here: they are recorded in the state and the run keeps
    /// routing. `Err` means the run was aborted (schema violation, unknown route, checkpoint
    /// write failure, cancellation or step limit).
    pub async fn invoke(&self, state: S, config: &RunnableConfig) -> Result<S, RunError> {
        let result = self.start(state, config, None).await;
        if let Err(e) = &result {
            log_run_error(&config.run_id, e);
        }
        result
    }

    /// Continues the run `config.run_id` from its latest checkpoint.
    ///
    /// A checkpoint written after the run reached END is returned as is.
    pub async fn resume(&self, config: &RunnableConfig) -> Result<S, RunError> {
        let result = self.resume_inner(config).await;
        if let Err(e) = &result {
            log_run_error(&config.run_id, e);
        }
        result
    }

    /// Streams a run, emitting events via channel-backed Stream.
    ///
    /// Events are filtered by `stream_mode`; `StreamEvent::Aborted` is always sent when the run
    /// stops on an error. The stream ends when the run finishes.
    pub fn stream(
        &self,
        state: S,
        config: RunnableConfig,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let mode_set: HashSet<StreamMode> = stream_mode.into();

        tokio::spawn(async move {
            let run_ctx = RunContext {
                stream_tx: tx.clone(),
                stream_mode: mode_set,
            };
            if let Err(e) = graph.start(state, &config, Some(&run_ctx)).await {
                log_run_error(&config.run_id, &e);
                let _ = tx.send(StreamEvent::Aborted(e.to_string())).await;
            }
        });

        ReceiverStream::new(rx)
    }

    async fn start(
        &self,
        state: S,
        config: &RunnableConfig,
        run_ctx: Option<&RunContext<S>>,
    ) -> Result<S, RunError> {
        log_run_start(&config.run_id, &self.entry);
        if let Some(cp) = &self.checkpointer {
            let checkpoint = Checkpoint::from_state(
                state.clone(),
                CheckpointSource::Input,
                0,
                None,
                Some(self.entry.clone()),
            );
            cp.put(&config.run_id, &checkpoint).await?;
        }
        self.run_loop(state, config, self.entry.clone(), 0, run_ctx)
            .await
    }

    async fn resume_inner(&self, config: &RunnableConfig) -> Result<S, RunError> {
        let cp = self.checkpointer.as_ref().ok_or(RunError::NoCheckpointer)?;
        let checkpoint = cp
            .get(&config.run_id)
            .await?
            .ok_or_else(|| RunError::CheckpointNotFound(config.run_id.clone()))?;
        match checkpoint.metadata.next {
            None => Ok(checkpoint.state),
            Some(next) => {
                log_run_resume(&config.run_id, &next, checkpoint.metadata.step);
                self.run_loop(
                    checkpoint.state,
                    config,
                    next,
                    checkpoint.metadata.step,
                    None,
                )
                .await
            }
        }
    }

    /// Steps through stages until END, shared by invoke, resume and stream.
    async fn run_loop(
        &self,
        mut state: S,
        config: &RunnableConfig,
        mut current_id: String,
        mut step: u64,
        run_ctx: Option<&RunContext<S>>,
    ) -> Result<S, RunError> {
        let run_id = config.run_id.as_str();
        loop {
            if step >= self.max_steps as u64 {
                return Err(RunError::StepLimitExceeded {
                    run_id: run_id.to_string(),
                    limit: self.max_steps,
                });
            }
            let stage = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| RunError::NodeNotFound(current_id.clone()))?;

            log_node_start(run_id, &current_id);
            let updates = match self.apply_stage(&current_id, stage.clone(), &state).await {
                Ok(updates) => {
                    check_ownership(&current_id, stage.as_ref(), &updates)?;
                    updates
                }
                Err(error) => {
                    log_node_error(run_id, &current_id, &error);
                    if let Some(ctx) = run_ctx {
                        ctx.emit(StreamMode::Errors, || StreamEvent::StageFailed {
                            node_id: current_id.clone(),
                            error: error.to_string(),
                        })
                        .await;
                    }
                    vec![S::stage_failed(&current_id, &error)]
                }
            };
            state = merge_all(&state, updates).map_err(|v| v.in_stage(current_id.clone()))?;
            step += 1;

            let next = self.next_node(&current_id, &state)?;
            log_node_complete(run_id, &current_id, &next);

            if let Some(ctx) = run_ctx {
                ctx.emit(StreamMode::Values, || StreamEvent::Values(state.clone()))
                    .await;
                ctx.emit(StreamMode::Updates, || StreamEvent::Updates {
                    node_id: current_id.clone(),
                    state: state.clone(),
                    next: next.clone(),
                })
                .await;
            }

            let finished = next == END;
            if let Some(cp) = &self.checkpointer {
                let checkpoint = Checkpoint::from_state(
                    state.clone(),
                    CheckpointSource::Loop,
                    step,
                    Some(current_id.clone()),
                    (!finished).then(|| next.clone()),
                );
                cp.put(run_id, &checkpoint).await?;
                log_checkpoint_saved(run_id, step);
            }

            if finished {
                log_run_complete(run_id, step);
                return Ok(state);
            }
            if config.cancel.is_cancelled() {
                return Err(RunError::Cancelled {
                    run_id: run_id.to_string(),
                    node_id: current_id,
                });
            }
            current_id = next;
        }
    }

    async fn apply_stage(
        &self,
        node_id: &str,
        stage: Arc<dyn Stage<S>>,
        state: &S,
    ) -> Result<Vec<S::Update>, StageError> {
        match &self.middleware {
            Some(middleware) => {
                let inner: StageCall<S> = Box::new(move |s: S| -> StageFuture<S> {
                    Box::pin(async move { stage.apply(&s).await })
                });
                middleware.around_apply(node_id, state.clone(), inner).await
            }
            None => stage.apply(state).await,
        }
    }

    fn next_node(&self, node_id: &str, state: &S) -> Result<String, RunError> {
        match self.edges.get(node_id) {
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional(edge)) => {
                let label = edge.router.route(state);
                tracing::debug!(node_id, label, "Routing decision");
                edge.routes
                    .get(label)
                    .cloned()
                    .ok_or_else(|| RunError::UnknownRoute {
                        node_id: node_id.to_string(),
                        label: label.to_string(),
                    })
            }
            None => Err(RunError::NodeNotFound(node_id.to_string())),
        }
    }
}

/// Every update must target a field the stage declared, or a field all stages may append to.
fn check_ownership<S: GraphState>(
    node_id: &str,
    stage: &dyn Stage<S>,
    updates: &[S::Update],
) -> Result<(), SchemaViolation> {
    let owned = stage.writes();
    let shared = S::shared_fields();
    for update in updates {
        let field = S::field_of(update);
        if !owned.contains(&field) && !shared.contains(&field) {
            return Err(SchemaViolation::new(field, "stage does not own this field").in_stage(node_id));
        }
    }
    Ok(())
}
