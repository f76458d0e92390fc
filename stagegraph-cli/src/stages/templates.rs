//! Page templates: JSON documents whose string leaves may contain `{{field}}` placeholders.
//!
//! Placeholders name a product field (`{{name}}`) or a dotted path into it
//! (`{{specs.price}}`). Unknown or empty fields leave the placeholder in place.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schemas::ProductData;

static EMBEDDED: &str = include_str!("../../templates/page_templates.json");

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder regex"));

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read templates from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("template file must be a JSON object keyed by template name")]
    NotObject,
}

/// Named page templates.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    templates: Map<String, Value>,
}

impl TemplateStore {
    /// Templates compiled into the binary.
    pub fn embedded() -> Result<Self, TemplateError> {
        Self::from_json(EMBEDDED)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, TemplateError> {
        match serde_json::from_str(text)? {
            Value::Object(templates) => Ok(Self { templates }),
            _ => Err(TemplateError::NotObject),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Template `name` with placeholders filled from `product`. A missing template renders
    /// as an empty object.
    pub fn render(&self, name: &str, product: &ProductData) -> Map<String, Value> {
        let Some(template) = self.templates.get(name) else {
            tracing::warn!(template = name, "Template not found; using an empty page");
            return Map::new();
        };
        let fields = serde_json::to_value(product).unwrap_or(Value::Null);
        match fill(template.clone(), &fields) {
            Value::Object(page) => page,
            _ => {
                tracing::warn!(template = name, "Template is not an object; using an empty page");
                Map::new()
            }
        }
    }
}

fn fill(value: Value, fields: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(&s, fields)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| fill(v, fields)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, fill(v, fields)))
                .collect(),
        ),
        other => other,
    }
}

fn substitute(text: &str, fields: &Value) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(fields, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn lookup(fields: &Value, path: &str) -> Option<String> {
    let value = path
        .split('.')
        .try_fold(fields, |current, key| current.get(key))?;
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
