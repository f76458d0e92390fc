//! The seven pipeline stages.
//!
//! `validate_input` checks the raw input; `parse_product`, `generate_faq`, `extract_logic`
//! and `generate_comparison` call the model; `audit_quality` is the quality gate's evaluator;
//! `assemble_pages` fills the page templates. Each stage owns the fields it lists in
//! `writes`; `errors` and `metadata` are shared.

mod assemble;
mod audit;
mod comparison;
mod faq;
mod logic;
mod parse;
mod templates;
mod validate;

pub use assemble::{AssemblePages, COMPARISON_ARTIFACT, FAQ_ARTIFACT, PRODUCT_ARTIFACT};
pub use audit::{faq_count_contract, AuditQuality};
pub use comparison::GenerateComparison;
pub use faq::GenerateFaq;
pub use logic::ExtractLogic;
pub use parse::{spec_validator, ParseProduct};
pub use templates::{TemplateError, TemplateStore};
pub use validate::{route_after_validation, ValidateInput, VALIDATION_FAILED, VALIDATION_PASSED};

use stagegraph::StageError;

use crate::schemas::ProductData;
use crate::state::PipelineState;

/// Stage ids; also the task names in model prompts.
pub mod ids {
    pub const VALIDATE_INPUT: &str = "validate_input";
    pub const PARSE_PRODUCT: &str = "parse_product";
    pub const GENERATE_FAQ: &str = "generate_faq";
    pub const EXTRACT_LOGIC: &str = "extract_logic";
    pub const GENERATE_COMPARISON: &str = "generate_comparison";
    pub const AUDIT_QUALITY: &str = "audit_quality";
    pub const ASSEMBLE_PAGES: &str = "assemble_pages";
}

/// Parsed product, or a stage error naming the stage that needed it.
fn require_product(state: &PipelineState) -> Result<&ProductData, StageError> {
    state
        .product
        .as_ref()
        .ok_or_else(|| StageError::failed("no parsed product in state"))
}

/// Compact JSON for prompt context.
fn to_prompt_json<T: serde::Serialize>(value: &T) -> Result<String, StageError> {
    serde_json::to_string(value)
        .map_err(|e| StageError::failed(format!("cannot serialize prompt context: {e}")))
}
