//! Scripted LLM client for tests and offline runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::{task_of, LlmClient, LlmError};
use crate::schemas::{FaqCategory, FAQ_COUNT};
use crate::stages::ids;

#[derive(Default)]
struct Script {
    replies: HashMap<String, Vec<String>>,
    calls: HashMap<String, usize>,
}

/// Replies keyed by the prompt's task header. Each task's replies are served in order; the
/// last one repeats. Clones share the script and the call counters.
#[derive(Clone, Default)]
pub struct MockLlm {
    script: Arc<Mutex<Script>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reply for `task`.
    pub fn with_reply(self, task: &str, reply: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script
                .replies
                .entry(task.to_string())
                .or_default()
                .push(reply.into());
        }
        self
    }

    /// Replaces every reply for `task` with one.
    pub fn set_reply(&self, task: &str, reply: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.replies.insert(task.to_string(), vec![reply.into()]);
        }
    }

    /// Number of prompts received for `task`.
    pub fn calls(&self, task: &str) -> usize {
        self.script
            .lock()
            .map(|s| s.calls.get(task).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Valid replies for every model-backed stage; a full pipeline run succeeds on the first
    /// audit.
    pub fn happy_path() -> Self {
        Self::new()
            .with_reply(ids::PARSE_PRODUCT, product_reply().to_string())
            .with_reply(ids::GENERATE_FAQ, faq_reply(FAQ_COUNT).to_string())
            .with_reply(ids::EXTRACT_LOGIC, logic_reply().to_string())
            .with_reply(ids::GENERATE_COMPARISON, comparison_reply().to_string())
            .with_reply(
                ids::AUDIT_QUALITY,
                json!({"is_valid": true, "feedback": ""}).to_string(),
            )
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let task = task_of(prompt).unwrap_or_default().to_string();
        let mut script = self
            .script
            .lock()
            .map_err(|_| LlmError::Api("mock script lock poisoned".into()))?;
        let served = script.calls.get(&task).copied().unwrap_or(0);
        *script.calls.entry(task.clone()).or_default() += 1;
        let replies = script
            .replies
            .get(&task)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| LlmError::Unscripted(task.clone()))?;
        let reply = replies
            .get(served)
            .or_else(|| replies.last())
            .cloned()
            .unwrap_or_default();
        Ok(reply)
    }
}

pub(crate) fn product_reply() -> serde_json::Value {
    json!({
        "name": "GlowBoost Vitamin C Serum",
        "description": "A lightweight brightening serum with 10% Vitamin C.",
        "specs": {
            "primary_spec": "10% Vitamin C concentration",
            "secondary_spec": "Hyaluronic Acid",
            "target": ["Oily", "Combination"],
            "price": "699 INR"
        },
        "highlights": ["Brightening", "Fades dark spots"],
        "benefits": ["Brightening", "Fades dark spots"],
        "usage": "Apply 2-3 drops in the morning before sunscreen.",
        "safety": {
            "details": "Mild tingling for sensitive skin.",
            "warnings": ["Patch test first"]
        }
    })
}

/// FAQ reply with `count` items, cycling through the categories.
pub(crate) fn faq_reply(count: usize) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| {
            let category = FaqCategory::ALL[i % FaqCategory::ALL.len()];
            json!({
                "category": category,
                "question": format!("Question {} about {}?", i + 1, category),
                "answer": format!("Answer {}.", i + 1)
            })
        })
        .collect();
    json!({ "items": items })
}

pub(crate) fn logic_reply() -> serde_json::Value {
    json!({
        "blocks": {
            "benefits": "Brightens skin and fades dark spots.",
            "usage_instructions": "Apply 2-3 drops every morning.",
            "safety_summary": "Patch test first; mild tingling is normal."
        }
    })
}

pub(crate) fn comparison_reply() -> serde_json::Value {
    json!({
        "attributes": ["name", "price_inr", "target_skin_type"],
        "products": [
            {"name": "GlowBoost Vitamin C Serum", "price_inr": 699, "target_skin_type": ["Oily", "Combination"]},
            {"name": "RadiantC Daily Serum", "price_inr": "849", "target_skin_type": "Dry, Normal"}
        ],
        "comparison_summary": "GlowBoost is cheaper and suits oily skin."
    })
}
