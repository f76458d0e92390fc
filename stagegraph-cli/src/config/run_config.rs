//! Run config: model endpoint, retry budget, gate thresholds, storage and output paths.
//! Filled from env / .env.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use stagegraph::MAX_ITERATIONS;

/// Error type used for config loading.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// OpenAI-compatible API base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    pub api_key: String,
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Attempts per model request (at least 1).
    pub max_retries: u32,
    /// Per-stage time budget; `None` disables it.
    pub stage_timeout: Option<Duration>,
    /// Page templates file; the embedded templates are used when unset.
    pub template_path: Option<PathBuf>,
    /// SQLite database for checkpoints; in-memory checkpoints when unset.
    pub db_path: Option<String>,
    pub max_iterations: u32,
    /// Audit gate force-pass threshold; disabled when unset.
    pub accept_after: Option<u32>,
    pub output_dir: PathBuf,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_retries: 3,
            stage_timeout: None,
            template_path: None,
            db_path: None,
            max_iterations: MAX_ITERATIONS,
            accept_after: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Apply optional overrides from `RunOptions` to this config.
    pub fn apply_options(&mut self, options: &super::RunOptions) {
        if let Some(dir) = &options.output_dir {
            self.output_dir = dir.clone();
        }
        if options.db_path.is_some() {
            self.db_path = options.db_path.clone();
        }
        if options.template_path.is_some() {
            self.template_path = options.template_path.clone();
        }
        if let Some(n) = options.max_iterations {
            self.max_iterations = n.max(1);
        }
        if options.accept_after.is_some() {
            self.accept_after = options.accept_after;
        }
        self.verbose = options.verbose;
    }

    /// Fill config from env vars (and .env). Call `dotenv::dotenv().ok()` first.
    ///
    /// `OPENAI_API_KEY` required; `OPENAI_API_BASE`, `OPENAI_MODEL` have defaults.
    /// Optional: `LLM_MAX_RETRIES`, `STAGE_TIMEOUT_SECS`, `TEMPLATE_PATH`, `DB_PATH`,
    /// `MAX_ITERATIONS`, `ACCEPT_AFTER`, `OUTPUT_DIR`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `var`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();
        let api_key = var("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "OPENAI_API_KEY is not set; please configure it in .env",
                )
            })?;
        let max_retries = parse_var(&var, "LLM_MAX_RETRIES")?
            .unwrap_or(defaults.max_retries)
            .max(1);
        let stage_timeout = parse_var::<u64>(&var, "STAGE_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let max_iterations = parse_var(&var, "MAX_ITERATIONS")?
            .unwrap_or(defaults.max_iterations)
            .max(1);
        Ok(Self {
            api_base: var("OPENAI_API_BASE").unwrap_or(defaults.api_base),
            api_key,
            model: var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_retries,
            stage_timeout,
            template_path: var("TEMPLATE_PATH").map(PathBuf::from),
            db_path: var("DB_PATH"),
            max_iterations,
            accept_after: parse_var(&var, "ACCEPT_AFTER")?,
            output_dir: var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            verbose: false,
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}").into()),
    }
}
