//! Shared run logic: build the pipeline graph and submit or resume a run.
//!
//! Used by [`run_with_config`](super::run_with_config) and by tests that inject `MockLlm`.

use std::sync::Arc;

use serde_json::{Map, Value};
use stagegraph::{Checkpointer, CompiledStateGraph, MemorySaver, RunnableConfig};

use crate::config::RunConfig;
use crate::llm::{LlmClient, RetryPolicy, StructuredLlm};
use crate::pipeline::{compile_pipeline, PipelineDeps};
use crate::stages::TemplateStore;
use crate::state::PipelineState;

use super::config_summary::log_config_summary;
use super::Error;

/// In-memory checkpoints do not outlive the process, so a resume has nothing to read.
pub(crate) const RESUME_NEEDS_DB: &str =
    "resume needs a durable checkpointer (set --db or DB_PATH)";

/// What to run: a fresh input document, or the checkpointed run to continue.
#[derive(Clone, Debug)]
pub enum RunRequest {
    Submit {
        input: Map<String, Value>,
        run_id: String,
    },
    Resume {
        run_id: String,
    },
}

impl RunRequest {
    pub fn run_id(&self) -> &str {
        match self {
            RunRequest::Submit { run_id, .. } | RunRequest::Resume { run_id } => run_id,
        }
    }
}

/// Runs `input` through a compiled pipeline under `run_id` and returns the final state.
///
/// Business failures (invalid input, gate halt, stage errors) are in `errors`; only
/// contract violations and checkpoint failures are `Err`.
pub async fn submit(
    compiled: &CompiledStateGraph<PipelineState>,
    input: Map<String, Value>,
    run_id: &str,
) -> Result<PipelineState, Error> {
    let state = compiled
        .invoke(PipelineState::new(input), &RunnableConfig::new(run_id))
        .await?;
    Ok(state)
}

/// Checkpointer from config: SQLite when `db_path` is set (feature `sqlite`), else memory.
pub(crate) fn open_checkpointer(
    config: &RunConfig,
) -> Result<Arc<dyn Checkpointer<PipelineState>>, Error> {
    match config.db_path.as_deref() {
        #[cfg(feature = "sqlite")]
        Some(path) => Ok(Arc::new(stagegraph::SqliteSaver::<PipelineState>::open(
            path,
        )?)),
        #[cfg(not(feature = "sqlite"))]
        Some(_) => Err("DB_PATH is set but SQLite support is not enabled. Build with --features sqlite".into()),
        None => Ok(Arc::new(MemorySaver::<PipelineState>::new())),
    }
}

/// Pipeline collaborators from config, around the given model client.
pub(crate) fn pipeline_deps(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<PipelineDeps, Error> {
    let templates = match &config.template_path {
        Some(path) => TemplateStore::load(path)?,
        None => TemplateStore::embedded()?,
    };
    let policy = RetryPolicy {
        max_attempts: config.max_retries.max(1),
        ..RetryPolicy::default()
    };
    let mut deps = PipelineDeps::new(StructuredLlm::new(llm, policy), Arc::new(templates));
    deps.max_iterations = config.max_iterations;
    deps.accept_after = config.accept_after;
    deps.stage_timeout = config.stage_timeout;
    Ok(deps)
}

/// Builds the pipeline for `config` around `llm` and executes `request`.
pub async fn run_pipeline(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
    request: RunRequest,
) -> Result<PipelineState, Error> {
    log_config_summary(config, request.run_id());
    if matches!(request, RunRequest::Resume { .. }) && config.db_path.is_none() {
        return Err(RESUME_NEEDS_DB.into());
    }
    let deps = pipeline_deps(config, llm)?;
    let compiled = compile_pipeline(&deps, open_checkpointer(config)?)?;
    let state = match request {
        RunRequest::Submit { input, run_id } => submit(&compiled, input, &run_id).await?,
        RunRequest::Resume { run_id } => compiled.resume(&RunnableConfig::new(run_id)).await?,
    };
    if state.succeeded() {
        tracing::info!(artifacts = state.artifacts.len(), "Pipeline completed successfully");
    } else {
        tracing::error!(errors = ?state.errors, "Pipeline finished with errors");
    }
    Ok(state)
}
