//! Optional overrides for a pipeline run (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). Only set fields
//! override the base config from env.

use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Directory the artifacts are written to.
    pub output_dir: Option<PathBuf>,
    /// SQLite database path for durable checkpoints.
    pub db_path: Option<String>,
    pub template_path: Option<PathBuf>,
    /// Audit gate iteration cap.
    pub max_iterations: Option<u32>,
    /// Audit gate force-pass threshold.
    pub accept_after: Option<u32>,
    /// Debug-level logs (stage enter/exit, routing, checkpoints).
    pub verbose: bool,
}
