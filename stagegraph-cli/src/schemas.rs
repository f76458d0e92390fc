//! Pipeline data shapes: raw input contract, parsed product, FAQ items, comparison table.
//!
//! Model replies are deserialized into the `*Reply` shapes and converted with the
//! constructors here, so coercion rules live in one place.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of FAQ items the pipeline produces.
pub const FAQ_COUNT: usize = 15;

/// Raw input document, as validated before the pipeline starts parsing.
///
/// `title`, `description` and `price` are required; the rest default to empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawProductInput {
    pub title: String,
    pub description: String,
    pub price: Value,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub safety: Option<String>,
    #[serde(default)]
    pub target_skin_type: Vec<String>,
}

impl RawProductInput {
    /// Checks the input mapping against the raw input contract.
    ///
    /// Reports every missing required field at once, then any type mismatch.
    pub fn validate(input: &Map<String, Value>) -> Result<Self, String> {
        let missing: Vec<&str> = ["title", "description", "price"]
            .into_iter()
            .filter(|field| input.get(*field).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required field(s): {}", missing.join(", ")));
        }
        serde_json::from_value(Value::Object(input.clone())).map_err(|e| e.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSpecs {
    pub primary_spec: String,
    #[serde(default)]
    pub secondary_spec: String,
    /// Target audience; free-form (string or list) as the model reports it.
    #[serde(default)]
    pub target: Value,
    pub price: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyInfo {
    pub details: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Structured product produced by the parse stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub name: String,
    pub description: String,
    pub specs: ProductSpecs,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub usage: String,
    pub safety: SafetyInfo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqCategory {
    Informational,
    Usage,
    Safety,
    Pricing,
    Comparison,
}

impl FaqCategory {
    pub const ALL: [FaqCategory; 5] = [
        FaqCategory::Informational,
        FaqCategory::Usage,
        FaqCategory::Safety,
        FaqCategory::Pricing,
        FaqCategory::Comparison,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FaqCategory::Informational => "informational",
            FaqCategory::Usage => "usage",
            FaqCategory::Safety => "safety",
            FaqCategory::Pricing => "pricing",
            FaqCategory::Comparison => "comparison",
        }
    }
}

impl fmt::Display for FaqCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub category: FaqCategory,
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FaqReply {
    pub items: Vec<FaqItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogicReply {
    pub blocks: std::collections::BTreeMap<String, String>,
}

/// Logic block keys the assembler renders.
pub const LOGIC_BLOCKS: [&str; 3] = ["benefits", "usage_instructions", "safety_summary"];

/// Comparison as returned by the model, before coercion.
#[derive(Clone, Debug, Deserialize)]
pub struct ComparisonReply {
    pub attributes: Vec<String>,
    pub products: Vec<Map<String, Value>>,
    pub comparison_summary: String,
}

/// Comparison table: at least two products, `price_inr` an integer, `target_skin_type` a
/// list of strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub attributes: Vec<String>,
    pub products: Vec<Map<String, Value>>,
    pub comparison_summary: String,
}

impl TryFrom<ComparisonReply> for ComparisonTable {
    type Error = String;

    fn try_from(reply: ComparisonReply) -> Result<Self, String> {
        if reply.products.len() < 2 {
            return Err(format!(
                "comparison requires at least two products, got {}",
                reply.products.len()
            ));
        }
        let products = reply
            .products
            .into_iter()
            .map(coerce_product)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            attributes: reply.attributes,
            products,
            comparison_summary: reply.comparison_summary,
        })
    }
}

fn coerce_product(mut product: Map<String, Value>) -> Result<Map<String, Value>, String> {
    if let Some(price) = product.get_mut("price_inr") {
        *price = Value::from(coerce_price(price)?);
    }
    if let Some(skin) = product.get_mut("target_skin_type") {
        *skin = coerce_skin_types(skin)?;
    }
    Ok(product)
}

fn coerce_price(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("price_inr out of range: {n}")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("price_inr must be an integer, got \"{s}\"")),
        other => Err(format!("price_inr must be an integer, got {}", type_name(other))),
    }
}

fn coerce_skin_types(value: &Value) -> Result<Value, String> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Ok(value.clone()),
        Value::String(s) => Ok(Value::from(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>(),
        )),
        other => Err(format!(
            "target_skin_type must be a list, got {}",
            type_name(other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuditReply {
    pub is_valid: bool,
    #[serde(default)]
    pub feedback: String,
}
