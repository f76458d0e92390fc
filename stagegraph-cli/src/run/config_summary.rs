//! One structured log line describing the effective run config. Never includes the API key.

use crate::config::RunConfig;

pub(crate) fn log_config_summary(config: &RunConfig, run_id: &str) {
    let templates = config
        .template_path
        .as_ref()
        .map_or_else(|| "embedded".to_string(), |p| p.display().to_string());
    let checkpoints = config.db_path.as_deref().unwrap_or("memory");
    tracing::info!(
        run_id,
        model = %config.model,
        api_base = %config.api_base,
        max_retries = config.max_retries,
        max_iterations = config.max_iterations,
        accept_after = ?config.accept_after,
        stage_timeout_secs = ?config.stage_timeout.map(|d| d.as_secs()),
        %templates,
        checkpoints,
        output_dir = %config.output_dir.display(),
        "Run config"
    );
}
