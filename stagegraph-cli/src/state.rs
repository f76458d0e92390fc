//! Pipeline state record and its merge policy.
//!
//! `input` has no update variant, so no stage can rewrite it. Derived fields are replaced,
//! `errors` is appended to, `metadata` is merged key by key, and `iteration_count` may only
//! grow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stagegraph::{GateRecord, GateState, GraphState, SchemaViolation, StageError};

use crate::schemas::{ComparisonTable, FaqItem, ProductData};

/// Field names, as declared by stages in `Stage::writes`.
pub mod fields {
    pub const PRODUCT: &str = "product";
    pub const FAQS: &str = "faqs";
    pub const LOGIC_BLOCKS: &str = "logic_blocks";
    pub const COMPARISON: &str = "comparison";
    pub const ARTIFACTS: &str = "artifacts";
    pub const ERRORS: &str = "errors";
    pub const FEEDBACK: &str = "feedback";
    pub const ITERATION_COUNT: &str = "iteration_count";
    pub const METADATA: &str = "metadata";
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Raw input document; set at submission, never written by a stage.
    pub input: Map<String, Value>,
    pub product: Option<ProductData>,
    pub faqs: Vec<FaqItem>,
    pub logic_blocks: BTreeMap<String, String>,
    pub comparison: Option<ComparisonTable>,
    /// Output artifacts keyed by file name (e.g. `faq.json`).
    pub artifacts: BTreeMap<String, Value>,
    /// Append-only; any entry marks the run as failed.
    pub errors: Vec<String>,
    /// Latest quality gate feedback.
    pub feedback: Option<String>,
    pub iteration_count: u32,
    pub metadata: BTreeMap<String, Value>,
}

impl PipelineState {
    pub fn new(input: Map<String, Value>) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One field write. A stage's partial update is a `Vec<PipelineUpdate>`.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineUpdate {
    Product(ProductData),
    Faqs(Vec<FaqItem>),
    LogicBlocks(BTreeMap<String, String>),
    Comparison(ComparisonTable),
    Artifacts(BTreeMap<String, Value>),
    /// New entries only; appended to the existing list.
    Errors(Vec<String>),
    Feedback(String),
    /// The new count, not a delta.
    IterationCount(u32),
    /// Keys to set; other keys are kept.
    Metadata(BTreeMap<String, Value>),
}

impl PipelineUpdate {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Errors(vec![message.into()])
    }

    pub fn metadata(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Metadata(BTreeMap::from([(key.into(), value.into())]))
    }
}

impl GraphState for PipelineState {
    type Update = PipelineUpdate;

    fn field_of(update: &PipelineUpdate) -> &'static str {
        match update {
            PipelineUpdate::Product(_) => fields::PRODUCT,
            PipelineUpdate::Faqs(_) => fields::FAQS,
            PipelineUpdate::LogicBlocks(_) => fields::LOGIC_BLOCKS,
            PipelineUpdate::Comparison(_) => fields::COMPARISON,
            PipelineUpdate::Artifacts(_) => fields::ARTIFACTS,
            PipelineUpdate::Errors(_) => fields::ERRORS,
            PipelineUpdate::Feedback(_) => fields::FEEDBACK,
            PipelineUpdate::IterationCount(_) => fields::ITERATION_COUNT,
            PipelineUpdate::Metadata(_) => fields::METADATA,
        }
    }

    fn shared_fields() -> &'static [&'static str] {
        &[fields::ERRORS, fields::METADATA]
    }

    fn merge(&self, update: PipelineUpdate) -> Result<Self, SchemaViolation> {
        let mut next = self.clone();
        match update {
            PipelineUpdate::Product(p) => next.product = Some(p),
            PipelineUpdate::Faqs(items) => next.faqs = items,
            PipelineUpdate::LogicBlocks(blocks) => next.logic_blocks = blocks,
            PipelineUpdate::Comparison(table) => next.comparison = Some(table),
            PipelineUpdate::Artifacts(artifacts) => next.artifacts = artifacts,
            PipelineUpdate::Errors(new) => next.errors.extend(new),
            PipelineUpdate::Feedback(f) => next.feedback = Some(f),
            PipelineUpdate::IterationCount(n) => {
                if n < self.iteration_count {
                    return Err(SchemaViolation::new(
                        fields::ITERATION_COUNT,
                        format!("cannot decrease from {} to {}", self.iteration_count, n),
                    ));
                }
                next.iteration_count = n;
            }
            PipelineUpdate::Metadata(entries) => next.metadata.extend(entries),
        }
        Ok(next)
    }

    fn stage_failed(stage: &str, error: &StageError) -> PipelineUpdate {
        PipelineUpdate::error(format!("{stage}: {error}"))
    }
}

impl GateState for PipelineState {
    const GATE_FIELDS: &'static [&'static str] = &[fields::FEEDBACK, fields::ITERATION_COUNT];

    fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    fn gate_updates(record: GateRecord) -> Vec<PipelineUpdate> {
        let mut updates = vec![
            PipelineUpdate::Feedback(record.feedback),
            PipelineUpdate::IterationCount(record.iteration_count),
        ];
        if record.forced_pass {
            updates.push(PipelineUpdate::metadata("gate_forced_pass", true));
        }
        if let Some(message) = record.halted {
            updates.push(PipelineUpdate::error(message));
        }
        updates
    }
}
