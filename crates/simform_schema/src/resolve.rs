//! Schema Resolution
//!
//! Turns a [`SchemaDocument`] into a [`ResolvedSchema`]: every field is
//! paired with its [`TypeDescriptor`], and every view reference is checked.
//! Resolution is where schema-authoring mistakes surface; once a schema is
//! resolved, validating a value can no longer fail.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::document::{FieldSchema, SchemaDocument};
use crate::error::SchemaError;
use crate::types::{TypeDescriptor, TypeRegistry};

/// A committed model: field name -> native JSON value.
pub type ModelValue = Map<String, Value>;

/// A field with its type resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub schema: FieldSchema,
    pub descriptor: TypeDescriptor,
}

impl FieldSpec {
    /// Field-level validation: the type check, then any declared bounds.
    ///
    /// Without bounds this is exactly `descriptor.validate(raw)`.
    pub fn validate(&self, raw: &str) -> bool {
        self.descriptor.validate(raw) && self.in_bounds(raw)
    }

    fn in_bounds(&self, raw: &str) -> bool {
        if !self.descriptor.kind.is_numeric() {
            return true;
        }
        let (min, max) = (self.schema.min, self.schema.max);
        if min.is_none() && max.is_none() {
            return true;
        }
        let Ok(value) = raw.parse::<f64>() else {
            return false;
        };
        min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
    }

    pub fn to_ui(&self, native: Option<&Value>) -> String {
        self.descriptor.to_ui(native)
    }

    pub fn to_native(&self, raw: &str) -> Value {
        self.descriptor.to_native(raw)
    }
}

/// All resolved fields of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    pub name: String,
    pub fields: BTreeMap<String, FieldSpec>,
}

impl ModelSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The model as declared by the schema defaults.
    pub fn defaults(&self) -> ModelValue {
        self.fields
            .iter()
            .map(|(name, spec)| (name.clone(), spec.schema.default_value.clone()))
            .collect()
    }
}

/// A fully qualified field reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FieldRef {
    pub model: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Parse `field` (relative to `default_model`) or `model.field`.
    pub fn parse(reference: &str, default_model: &str) -> Self {
        match reference.split_once('.') {
            Some((model, field)) => Self::new(model, field),
            None => Self::new(default_model, reference),
        }
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.model, self.field)
    }
}

/// The two field pages of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subview {
    Basic,
    Advanced,
}

impl std::fmt::Display for Subview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subview::Basic => write!(f, "basic"),
            Subview::Advanced => write!(f, "advanced"),
        }
    }
}

/// A view with its model and field references resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSpec {
    pub name: String,
    pub title: String,
    pub model: String,
    pub basic: Vec<FieldRef>,
    pub advanced: Vec<FieldRef>,
}

impl ViewSpec {
    pub fn fields(&self, subview: Subview) -> &[FieldRef] {
        match subview {
            Subview::Basic => &self.basic,
            Subview::Advanced => &self.advanced,
        }
    }
}

/// A schema whose every type and view reference is known to resolve.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    registry: TypeRegistry,
    models: BTreeMap<String, ModelSpec>,
    views: BTreeMap<String, ViewSpec>,
}

impl TypeRegistry {
    /// Built-in types plus one enum type per entry of the document's
    /// `enum` section. An enum named like a built-in is `DuplicateType`.
    pub fn with_schema_enums(document: &SchemaDocument) -> Result<Self, SchemaError> {
        let mut registry = Self::with_builtins();
        register_enums(&mut registry, document)?;
        Ok(registry)
    }
}

fn register_enums(registry: &mut TypeRegistry, document: &SchemaDocument) -> Result<(), SchemaError> {
    for (name, options) in &document.enums {
        registry.register_enum(name.clone(), options.clone())?;
    }
    Ok(())
}

impl ResolvedSchema {
    /// Resolve against the built-in types plus the document's enums.
    pub fn resolve(document: &SchemaDocument) -> Result<Self, SchemaError> {
        Self::resolve_with(document, TypeRegistry::with_builtins())
    }

    /// Resolve against a caller-supplied registry, e.g. one holding
    /// app-specific types. The document's enums are registered into it.
    pub fn resolve_with(
        document: &SchemaDocument,
        mut registry: TypeRegistry,
    ) -> Result<Self, SchemaError> {
        register_enums(&mut registry, document)?;

        let mut models = BTreeMap::new();
        for (model_name, fields) in &document.models {
            let mut specs = BTreeMap::new();
            for (field_name, schema) in fields {
                let descriptor = registry.resolve(&schema.type_name).map_err(|err| {
                    tracing::error!(
                        model = %model_name,
                        field = %field_name,
                        type_name = %schema.type_name,
                        "field references unknown type"
                    );
                    err
                })?;
                specs.insert(
                    field_name.clone(),
                    FieldSpec {
                        name: field_name.clone(),
                        schema: schema.clone(),
                        descriptor: descriptor.clone(),
                    },
                );
            }
            models.insert(
                model_name.clone(),
                ModelSpec {
                    name: model_name.clone(),
                    fields: specs,
                },
            );
        }

        let mut views = BTreeMap::new();
        for (view_name, view) in &document.views {
            let model = view.model_name(view_name).to_string();
            if !models.contains_key(&model) {
                return Err(SchemaError::UnknownModel(model));
            }
            let resolve_refs = |references: &[String]| -> Result<Vec<FieldRef>, SchemaError> {
                references
                    .iter()
                    .map(|reference| {
                        let field_ref = FieldRef::parse(reference, &model);
                        let known = models
                            .get(&field_ref.model)
                            .is_some_and(|spec| spec.fields.contains_key(&field_ref.field));
                        if known {
                            Ok(field_ref)
                        } else {
                            Err(SchemaError::UnknownViewField {
                                view: view_name.clone(),
                                field: reference.clone(),
                            })
                        }
                    })
                    .collect()
            };
            let basic = resolve_refs(&view.basic)?;
            let advanced = resolve_refs(&view.advanced)?;
            views.insert(
                view_name.clone(),
                ViewSpec {
                    name: view_name.clone(),
                    title: view.title.clone().unwrap_or_else(|| view_name.clone()),
                    model,
                    basic,
                    advanced,
                },
            );
        }

        tracing::debug!(
            models = models.len(),
            views = views.len(),
            types = registry.names().count(),
            "resolved schema"
        );
        Ok(Self {
            registry,
            models,
            views,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn model(&self, name: &str) -> Result<&ModelSpec, SchemaError> {
        self.models
            .get(name)
            .ok_or_else(|| SchemaError::UnknownModel(name.to_string()))
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn view(&self, name: &str) -> Option<&ViewSpec> {
        self.views.get(name)
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewSpec> {
        self.views.values()
    }

    /// Schema-declared default value for a model.
    pub fn defaults(&self, model: &str) -> Result<ModelValue, SchemaError> {
        Ok(self.model(model)?.defaults())
    }
}
