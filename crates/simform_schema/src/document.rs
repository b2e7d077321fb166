//! Schema Document
//!
//! The on-disk shape, as served to the UI:
//!
//! ```json
//! {
//!   "model": { "dog": { "breed": ["Breed", "String", "", "Tooltip"] } },
//!   "view":  { "dog": { "title": "Dog", "basic": ["breed"], "advanced": [] } },
//!   "enum":  { "Gender": [["male", "Male"], ["female", "Female"]] }
//! }
//! ```
//!
//! Field entries are positional: `[displayName, typeName, defaultValue,
//! description?, min?, max?]`. They are unpacked into [`FieldSchema`] here
//! so nothing downstream deals with tuples.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SchemaError;
use crate::types::EnumOption;

/// Static description of one model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub display_name: String,
    pub type_name: String,
    pub default_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inclusive lower bound, numeric types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound, numeric types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldSchema {
    pub fn new(
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        default_value: Value,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            type_name: type_name.into(),
            default_value,
            description: None,
            min: None,
            max: None,
        }
    }

    fn from_entry(model: &str, field: &str, entry: &[Value]) -> Result<Self, SchemaError> {
        let malformed = |reason: &str| SchemaError::MalformedField {
            model: model.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if entry.len() < 3 {
            return Err(malformed("expected [displayName, typeName, defaultValue, ...]"));
        }
        let display_name = entry[0]
            .as_str()
            .ok_or_else(|| malformed("displayName must be a string"))?;
        let type_name = entry[1]
            .as_str()
            .ok_or_else(|| malformed("typeName must be a string"))?;

        let description = match entry.get(3) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(malformed("description must be a string")),
        };
        let bound = |index: usize, label: &str| match entry.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(_) => Err(malformed(&format!("{label} must be a number"))),
        };

        Ok(Self {
            display_name: display_name.to_string(),
            type_name: type_name.to_string(),
            default_value: entry[2].clone(),
            description,
            min: bound(4, "min")?,
            max: bound(5, "max")?,
        })
    }
}

/// Field name -> field schema for one model.
pub type ModelSchema = BTreeMap<String, FieldSchema>;

/// A panel over one model: fields shown inline and fields behind the
/// advanced editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub basic: Vec<String>,
    #[serde(default)]
    pub advanced: Vec<String>,
}

impl ViewSchema {
    /// The model a view edits: its `model` key, else the view's own name.
    pub fn model_name<'a>(&'a self, view_name: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(view_name)
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    model: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
    #[serde(default)]
    view: BTreeMap<String, ViewSchema>,
    #[serde(default, rename = "enum")]
    enums: BTreeMap<String, Vec<Vec<Value>>>,
}

/// A parsed, not yet resolved, schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDocument {
    pub models: BTreeMap<String, ModelSchema>,
    pub views: BTreeMap<String, ViewSchema>,
    pub enums: BTreeMap<String, Vec<EnumOption>>,
}

impl SchemaDocument {
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn from_json_value(value: Value) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            models = document.models.len(),
            views = document.views.len(),
            enums = document.enums.len(),
            "loaded schema document"
        );
        Ok(document)
    }

    fn from_raw(raw: RawDocument) -> Result<Self, SchemaError> {
        let mut models = BTreeMap::new();
        for (model_name, fields) in raw.model {
            let mut schema = ModelSchema::new();
            for (field_name, entry) in fields {
                let field = FieldSchema::from_entry(&model_name, &field_name, &entry)?;
                schema.insert(field_name, field);
            }
            models.insert(model_name, schema);
        }

        let mut enums = BTreeMap::new();
        for (name, entries) in raw.enums {
            let options = entries
                .iter()
                .map(|entry| enum_option(&name, entry))
                .collect::<Result<Vec<_>, _>>()?;
            enums.insert(name, options);
        }

        Ok(Self {
            models,
            views: raw.view,
            enums,
        })
    }
}

fn enum_option(name: &str, entry: &[Value]) -> Result<EnumOption, SchemaError> {
    let malformed = |reason: &str| SchemaError::MalformedEnum {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let (value, display_name) = match entry {
        [value, display_name, ..] => (value, display_name),
        _ => return Err(malformed("expected [value, displayName]")),
    };
    let display_name = display_name
        .as_str()
        .ok_or_else(|| malformed("displayName must be a string"))?;
    match value {
        Value::String(s) => Ok(EnumOption::new(s.clone(), display_name)),
        Value::Number(n) => Ok(EnumOption::numeric(n.to_string(), display_name)),
        _ => Err(malformed("value must be a string or number")),
    }
}
