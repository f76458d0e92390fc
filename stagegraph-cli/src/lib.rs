//! stagegraph-cli library: the product content pipeline built on `stagegraph`.
//!
//! Validates a raw product document, parses it with a model, generates FAQs, logic blocks and
//! a comparison table, audits the FAQs behind a bounded-retry quality gate, and assembles
//! three JSON pages.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stagegraph_cli::{run_pipeline, MockLlm, RunConfig, RunRequest};
//!
//! # async fn demo() -> Result<(), stagegraph_cli::Error> {
//! let input = serde_json::json!({"title": "Serum", "description": "Brightening", "price": 699});
//! let serde_json::Value::Object(input) = input else { unreachable!() };
//! let state = run_pipeline(
//!     &RunConfig::default(),
//!     Arc::new(MockLlm::happy_path()),
//!     RunRequest::Submit { input, run_id: "demo".into() },
//! )
//! .await?;
//! assert!(state.errors.is_empty());
//! # Ok(())
//! # }
//! ```

mod config;
mod llm;
mod logging;
mod middleware;
mod pipeline;
mod run;
mod schemas;
mod stages;
mod state;

pub use config::{Error, RunConfig, RunOptions};
pub use llm::{LlmClient, LlmError, MockLlm, RetryPolicy, StructuredLlm};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use logging::{init_tracing, load_dotenv};
pub use middleware::{LoggingMiddleware, TimeoutMiddleware, WithStageLogging};
pub use pipeline::{build_pipeline, compile_pipeline, PipelineDeps};
pub use run::{run_pipeline, run_with_config, run_with_options, submit, write_artifacts, RunRequest};
pub use schemas::{
    ComparisonTable, FaqCategory, FaqItem, ProductData, ProductSpecs, RawProductInput, SafetyInfo,
    FAQ_COUNT,
};
pub use stages::{ids, TemplateError, TemplateStore};
pub use state::{fields, PipelineState, PipelineUpdate};

#[cfg(test)]
mod tests;
