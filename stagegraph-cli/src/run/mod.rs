//! Run entry points: `run_with_options` (reads .env), `run_with_config`, and `run_pipeline` /
//! `submit` for callers that bring their own model client.

pub use crate::config::Error;

mod common;
mod config_summary;
mod output;
mod run_with_config;

use crate::config::{RunConfig, RunOptions};
use crate::state::PipelineState;

pub use common::{run_pipeline, submit, RunRequest};
pub use output::write_artifacts;
pub use run_with_config::run_with_config;

#[cfg(test)]
pub(crate) use common::{open_checkpointer, pipeline_deps, RESUME_NEEDS_DB};

/// Runs the pipeline with config from env and optional overrides applied.
///
/// Loads `.env`, builds `RunConfig` from env, applies `options`, then runs.
pub async fn run_with_options(
    request: RunRequest,
    options: &RunOptions,
) -> Result<(RunConfig, PipelineState), Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    let state = run_with_config(&config, request).await?;
    Ok((config, state))
}
