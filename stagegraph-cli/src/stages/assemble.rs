use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use stagegraph::{Stage, StageError};

use super::{ids, require_product, TemplateStore};
use crate::schemas::{ComparisonTable, FaqItem, ProductData};
use crate::state::{fields, PipelineState, PipelineUpdate};

pub const FAQ_ARTIFACT: &str = "faq.json";
pub const PRODUCT_ARTIFACT: &str = "product_page.json";
pub const COMPARISON_ARTIFACT: &str = "comparison_page.json";

/// Block keys and their headings on the product page.
const PRODUCT_BLOCKS: [(&str, &str); 3] = [
    ("benefits", "Benefits"),
    ("usage_instructions", "Usage Instructions"),
    ("safety_summary", "Safety Summary"),
];

/// Terminal stage: fills the three page templates into output artifacts.
pub struct AssemblePages {
    templates: Arc<TemplateStore>,
}

impl AssemblePages {
    pub fn new(templates: Arc<TemplateStore>) -> Self {
        Self { templates }
    }

    fn faq_page(&self, product: &ProductData, faqs: &[FaqItem]) -> Map<String, Value> {
        let mut page = self.templates.render("faq_page", product);
        default_title(&mut page, format!("{} - FAQ", product.name));
        let items = serde_json::to_value(faqs).unwrap_or_else(|_| json!([]));
        if let Some(Value::Array(sections)) = page.get_mut("sections") {
            for section in sections.iter_mut().filter_map(Value::as_object_mut) {
                if section.get("type").and_then(Value::as_str) == Some("faq_list") {
                    section.insert("content".into(), items.clone());
                }
            }
        }
        page
    }

    fn product_page(
        &self,
        product: &ProductData,
        blocks: &BTreeMap<String, String>,
    ) -> Map<String, Value> {
        let mut page = self.templates.render("product_page", product);
        default_title(&mut page, format!("{} - Product Details", product.name));
        page.insert("description".into(), json!(product.description));
        if page.contains_key("blocks") {
            let rendered: Vec<Value> = PRODUCT_BLOCKS
                .iter()
                .map(|(key, title)| {
                    json!({
                        "title": title,
                        "content": blocks.get(*key).cloned().unwrap_or_default(),
                    })
                })
                .collect();
            page.insert("blocks".into(), Value::Array(rendered));
        }
        page
    }

    fn comparison_page(
        &self,
        product: &ProductData,
        table: &ComparisonTable,
    ) -> Map<String, Value> {
        let mut page = self.templates.render("comparison_page", product);
        default_title(&mut page, format!("{} - Comparison Guide", product.name));
        page.insert(
            "comparison_table".into(),
            json!({ "attributes": table.attributes, "products": table.products }),
        );
        page.insert(
            "comparison_summary".into(),
            json!(table.comparison_summary),
        );
        page
    }
}

fn default_title(page: &mut Map<String, Value>, title: String) {
    let blank = page
        .get("title")
        .and_then(Value::as_str)
        .map_or(true, |t| t.trim().is_empty());
    if blank {
        page.insert("title".into(), Value::String(title));
    }
}

#[async_trait]
impl Stage<PipelineState> for AssemblePages {
    fn id(&self) -> &str {
        ids::ASSEMBLE_PAGES
    }

    fn writes(&self) -> &[&'static str] {
        &[fields::ARTIFACTS]
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        let product = require_product(state)
            .map_err(|_| StageError::failed("No product data available for assembly"))?;
        let table = state
            .comparison
            .as_ref()
            .ok_or_else(|| StageError::failed("Comparison data missing during page assembly"))?;

        let artifacts = BTreeMap::from([
            (
                FAQ_ARTIFACT.to_string(),
                Value::Object(self.faq_page(product, &state.faqs)),
            ),
            (
                PRODUCT_ARTIFACT.to_string(),
                Value::Object(self.product_page(product, &state.logic_blocks)),
            ),
            (
                COMPARISON_ARTIFACT.to_string(),
                Value::Object(self.comparison_page(product, table)),
            ),
        ]);
        tracing::info!(artifacts = artifacts.len(), "Pages assembled");
        Ok(vec![PipelineUpdate::Artifacts(artifacts)])
    }
}
