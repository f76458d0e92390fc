use async_trait::async_trait;
use stagegraph::{Stage, StageError};

use super::{ids, require_product, to_prompt_json};
use crate::llm::{prompt, StructuredLlm};
use crate::schemas::{ComparisonReply, ComparisonTable};
use crate::state::{fields, PipelineState, PipelineUpdate};

const INSTRUCTIONS: &str = "\
Compare the product against one generic competitor. Reply as
{\"attributes\": [...], \"products\": [{...}, {...}], \"comparison_summary\": \"...\"}.
Use 5 key attributes named in snake_case (e.g. price_inr, target_skin_type).
Prices are integers; skin types are lists of strings.
The summary is 2-3 grounded, objective sentences.";

/// Builds the comparison table; replies that cannot be coerced are retried.
pub struct GenerateComparison {
    llm: StructuredLlm,
}

impl GenerateComparison {
    pub fn new(llm: StructuredLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage<PipelineState> for GenerateComparison {
    fn id(&self) -> &str {
        ids::GENERATE_COMPARISON
    }

    fn writes(&self) -> &[&'static str] {
        &[fields::COMPARISON]
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        let product = require_product(state)?;
        let p = prompt(
            ids::GENERATE_COMPARISON,
            INSTRUCTIONS,
            &[
                ("Product", product.name.clone()),
                ("Details", to_prompt_json(&product.specs)?),
            ],
        );
        let table = self
            .llm
            .generate_with(ids::GENERATE_COMPARISON, &p, |reply: ComparisonReply| {
                ComparisonTable::try_from(reply)
            })
            .await
            .map_err(|e| StageError::failed(format!("Comparison failed: {e}")))?;
        tracing::info!(
            products = table.products.len(),
            attributes = table.attributes.len(),
            "Comparison generated"
        );
        Ok(vec![PipelineUpdate::Comparison(table)])
    }
}
