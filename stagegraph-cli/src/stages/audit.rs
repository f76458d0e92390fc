use async_trait::async_trait;
use stagegraph::{Evaluator, StageError, Verdict};

use super::{ids, to_prompt_json};
use crate::llm::{prompt, StructuredLlm};
use crate::schemas::{AuditReply, FAQ_COUNT};
use crate::state::PipelineState;

const INSTRUCTIONS: &str = "\
Audit the generated content for professionalism, accuracy and formatting.
Reply as {\"is_valid\": bool, \"feedback\": \"...\"}. Formatting errors (triple newlines,
broken strings) mean is_valid=false; explain what to fix in feedback.";

/// Structural contract of the FAQ loop: exactly [`FAQ_COUNT`] items.
pub fn faq_count_contract(state: &PipelineState) -> Result<(), String> {
    if state.faqs.len() == FAQ_COUNT {
        Ok(())
    } else {
        Err(format!(
            "FAQ list must contain exactly {FAQ_COUNT} items, got {}",
            state.faqs.len()
        ))
    }
}

/// Model-backed reviewer behind the `audit_quality` gate.
pub struct AuditQuality {
    llm: StructuredLlm,
}

impl AuditQuality {
    pub fn new(llm: StructuredLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Evaluator<PipelineState> for AuditQuality {
    async fn evaluate(&self, state: &PipelineState) -> Result<Verdict, StageError> {
        let p = prompt(
            ids::AUDIT_QUALITY,
            INSTRUCTIONS,
            &[
                ("FAQs", to_prompt_json(&state.faqs)?),
                ("Logic Blocks", to_prompt_json(&state.logic_blocks)?),
                ("Comparison", to_prompt_json(&state.comparison)?),
            ],
        );
        let reply: AuditReply = self
            .llm
            .generate(ids::AUDIT_QUALITY, &p)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Quality audit model call failed");
                StageError::failed(format!("audit failed: {e}"))
            })?;
        if reply.is_valid {
            Ok(Verdict::pass())
        } else if reply.feedback.trim().is_empty() {
            Ok(Verdict::fail("auditor rejected the content without feedback"))
        } else {
            Ok(Verdict::fail(reply.feedback))
        }
    }
}
