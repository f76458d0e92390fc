//! Run the pipeline against the configured OpenAI-compatible endpoint; does not read .env.

use crate::config::RunConfig;
use crate::state::PipelineState;

use super::common::{run_pipeline, RunRequest};
use super::Error;

#[cfg(feature = "openai")]
pub async fn run_with_config(
    config: &RunConfig,
    request: RunRequest,
) -> Result<PipelineState, Error> {
    use std::sync::Arc;

    use async_openai::config::OpenAIConfig;

    use crate::llm::ChatOpenAI;

    let openai_config = OpenAIConfig::new()
        .with_api_base(&config.api_base)
        .with_api_key(config.api_key.clone());
    let llm = Arc::new(ChatOpenAI::with_config(openai_config, config.model.clone()));
    run_pipeline(config, llm, request).await
}

#[cfg(not(feature = "openai"))]
pub async fn run_with_config(
    _config: &RunConfig,
    _request: RunRequest,
) -> Result<PipelineState, Error> {
    Err("no model client available. Build with --features openai".into())
}
