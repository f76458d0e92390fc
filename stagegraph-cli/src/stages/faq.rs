use async_trait::async_trait;
use stagegraph::{Stage, StageError, PASSED};

use super::{ids, require_product, to_prompt_json};
use crate::llm::{prompt, StructuredLlm};
use crate::schemas::{FaqReply, FAQ_COUNT};
use crate::state::{fields, PipelineState, PipelineUpdate};

/// Generates the FAQ list. Loop body of the quality gate: on retry the previous feedback
/// is part of the prompt.
///
/// The item count is not checked here; the gate's contract does that.
pub struct GenerateFaq {
    llm: StructuredLlm,
}

impl GenerateFaq {
    pub fn new(llm: StructuredLlm) -> Self {
        Self { llm }
    }
}

fn instructions() -> String {
    format!(
        "Generate exactly {FAQ_COUNT} frequently asked questions and answers for the product.\n\
         Reply as {{\"items\": [{{\"category\", \"question\", \"answer\"}}]}}.\n\
         Categories: informational, usage, safety, pricing, comparison.\n\
         Answers must be grounded in the product data."
    )
}

#[async_trait]
impl Stage<PipelineState> for GenerateFaq {
    fn id(&self) -> &str {
        ids::GENERATE_FAQ
    }

    fn writes(&self) -> &[&'static str] {
        &[fields::FAQS]
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        let product = require_product(state)?;
        let mut context = vec![
            ("Product", product.name.clone()),
            ("Description", product.description.clone()),
            ("Details", to_prompt_json(&product.specs)?),
        ];
        if let Some(feedback) = state.feedback.as_deref().filter(|f| *f != PASSED) {
            context.push(("Reviewer feedback on the previous attempt", feedback.to_string()));
        }
        let p = prompt(ids::GENERATE_FAQ, &instructions(), &context);

        let reply: FaqReply = self
            .llm
            .generate(ids::GENERATE_FAQ, &p)
            .await
            .map_err(|e| StageError::failed(format!("FAQ generation failed: {e}")))?;
        if reply.items.len() != FAQ_COUNT {
            tracing::warn!(
                expected = FAQ_COUNT,
                got = reply.items.len(),
                "FAQ count off; leaving it to the quality gate"
            );
        }
        tracing::info!(count = reply.items.len(), attempt = state.iteration_count + 1, "FAQs generated");
        Ok(vec![PipelineUpdate::Faqs(reply.items)])
    }
}
