//! Unit tests for stagegraph-cli, organized by module.
//!
//! Each submodule documents the behaviour under test. Shared fixtures live here: a sample
//! input document and states at the points of the pipeline the stage tests start from.


use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::llm::mock::{comparison_reply, faq_reply, logic_reply, product_reply};
use crate::llm::{MockLlm, RetryPolicy, StructuredLlm};
use crate::pipeline::PipelineDeps;
use crate::schemas::{ComparisonReply, ComparisonTable, FaqReply, LogicReply, FAQ_COUNT};
use crate::stages::TemplateStore;
use crate::state::PipelineState;

pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Well-formed input with every required field.
pub(crate) fn sample_input() -> Map<String, Value> {
    object(json!({
        "title": "Test Serum",
        "description": "High hygiene test product",
        "price": 1000,
        "ingredients": ["Clean Code"],
        "target_skin_type": ["Developer", "Reviewer"]
    }))
}

/// State right after `parse_product`.
pub(crate) fn parsed_state() -> PipelineState {
    PipelineState {
        product: Some(serde_json::from_value(product_reply()).expect("product fixture")),
        ..PipelineState::new(sample_input())
    }
}

/// State right before `audit_quality`: product, FAQs, logic blocks and comparison present.
pub(crate) fn generated_state() -> PipelineState {
    let faqs: FaqReply = serde_json::from_value(faq_reply(FAQ_COUNT)).expect("faq fixture");
    let logic: LogicReply = serde_json::from_value(logic_reply()).expect("logic fixture");
    let comparison: ComparisonReply =
        serde_json::from_value(comparison_reply()).expect("comparison fixture");
    PipelineState {
        faqs: faqs.items,
        logic_blocks: logic.blocks,
        comparison: Some(ComparisonTable::try_from(comparison).expect("coercible fixture")),
        ..parsed_state()
    }
}

/// Pipeline deps around `mock` with embedded templates and no backoff.
pub(crate) fn mock_deps(mock: &MockLlm) -> PipelineDeps {
    PipelineDeps::new(
        StructuredLlm::new(Arc::new(mock.clone()), RetryPolicy::immediate(3)),
        Arc::new(TemplateStore::embedded().expect("embedded templates")),
    )
}
