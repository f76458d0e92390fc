use async_trait::async_trait;
use stagegraph::{Stage, StageError};

use super::{ids, to_prompt_json};
use crate::llm::{prompt, StructuredLlm};
use crate::schemas::{ProductData, ProductSpecs};
use crate::state::{fields, PipelineState, PipelineUpdate};

const INSTRUCTIONS: &str = "\
Parse the raw product information into structured JSON with fields: name, description,
specs {primary_spec, secondary_spec, target, price}, highlights, benefits, usage,
safety {details, warnings}. Identify key highlights and benefits; extract usage
instructions and safety information.";

/// Heuristic check of parsed specs; the result is kept in `metadata["spec_validation"]`.
pub fn spec_validator(specs: &ProductSpecs) -> String {
    let text = serde_json::to_string(specs)
        .unwrap_or_default()
        .to_lowercase();
    if specs.primary_spec.is_empty() && specs.secondary_spec.is_empty() && specs.price.is_empty() {
        "ERROR: No specifications provided for validation.".to_string()
    } else if text.contains("concentration") || text.contains("price") {
        "SUCCESS: All specifications passed industry standard validation.".to_string()
    } else {
        "WARNING: Specifications are incomplete but pass basic checks.".to_string()
    }
}

/// Turns the raw input into [`ProductData`] via the model.
pub struct ParseProduct {
    llm: StructuredLlm,
}

impl ParseProduct {
    pub fn new(llm: StructuredLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage<PipelineState> for ParseProduct {
    fn id(&self) -> &str {
        ids::PARSE_PRODUCT
    }

    fn writes(&self) -> &[&'static str] {
        &[fields::PRODUCT]
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        let p = prompt(
            ids::PARSE_PRODUCT,
            INSTRUCTIONS,
            &[("Raw Input", to_prompt_json(&state.input)?)],
        );
        let product: ProductData = self
            .llm
            .generate(ids::PARSE_PRODUCT, &p)
            .await
            .map_err(|e| StageError::failed(format!("Parsing failed: {e}")))?;

        let validation = spec_validator(&product.specs);
        tracing::info!(product = %product.name, %validation, "Product parsed");
        Ok(vec![
            PipelineUpdate::Product(product),
            PipelineUpdate::metadata("spec_validation", validation),
        ])
    }
}
