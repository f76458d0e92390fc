use std::collections::BTreeMap;

use async_trait::async_trait;
use stagegraph::{Stage, StageError};

use super::{ids, require_product, to_prompt_json};
use crate::llm::{prompt, StructuredLlm};
use crate::schemas::{LogicReply, LOGIC_BLOCKS};
use crate::state::{fields, PipelineState, PipelineUpdate};

const INSTRUCTIONS: &str = "\
Extract content logic blocks for the product. Reply as {\"blocks\": {...}} with keys:
benefits (key advantages), usage_instructions (step-by-step guide),
safety_summary (quick safety reference).";

/// Extracts the benefits / usage / safety blocks used by the product page.
pub struct ExtractLogic {
    llm: StructuredLlm,
}

impl ExtractLogic {
    pub fn new(llm: StructuredLlm) -> Self {
        Self { llm }
    }
}

/// Every block the product page renders must be present and non-empty.
fn complete_blocks(reply: LogicReply) -> Result<BTreeMap<String, String>, String> {
    let missing: Vec<&str> = LOGIC_BLOCKS
        .into_iter()
        .filter(|key| reply.blocks.get(*key).map_or(true, |v| v.trim().is_empty()))
        .collect();
    if missing.is_empty() {
        Ok(reply.blocks)
    } else {
        Err(format!("missing logic block(s): {}", missing.join(", ")))
    }
}

#[async_trait]
impl Stage<PipelineState> for ExtractLogic {
    fn id(&self) -> &str {
        ids::EXTRACT_LOGIC
    }

    fn writes(&self) -> &[&'static str] {
        &[fields::LOGIC_BLOCKS]
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        let product = require_product(state)?;
        let p = prompt(
            ids::EXTRACT_LOGIC,
            INSTRUCTIONS,
            &[
                ("Product", product.name.clone()),
                ("Available Data", to_prompt_json(product)?),
            ],
        );
        let blocks = self
            .llm
            .generate_with(ids::EXTRACT_LOGIC, &p, complete_blocks)
            .await
            .map_err(|e| StageError::failed(format!("Logic extraction failed: {e}")))?;
        tracing::info!(blocks = blocks.len(), "Logic blocks extracted");
        Ok(vec![PipelineUpdate::LogicBlocks(blocks)])
    }
}
