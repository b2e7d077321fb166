//! Field Types
//!
//! A type decides whether the raw text a user typed is acceptable, and how
//! that text maps to and from the committed (native) JSON value.
//!
//! The set of kinds is closed: the built-ins plus enums declared by the
//! schema. Apps can still register additional *names* for any kind, e.g. a
//! `Float6` alias that validates like `Float`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::SchemaError;

/// Built-in required string type name
pub const STRING: &str = "String";
/// Built-in optional string type name
pub const OPTIONAL_STRING: &str = "OptionalString";
/// Built-in floating point type name
pub const FLOAT: &str = "Float";
/// Built-in integer type name
pub const INTEGER: &str = "Integer";

fn float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("float pattern is valid")
    })
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"))
}

/// One allowed value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    /// The value as the UI sees it (always a string)
    pub value: String,

    /// Label shown next to the value
    pub display_name: String,

    /// The schema declared this value as a JSON number
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub numeric: bool,
}

impl EnumOption {
    pub fn new(value: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display_name: display_name.into(),
            numeric: false,
        }
    }

    pub fn numeric(value: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            numeric: true,
            ..Self::new(value, display_name)
        }
    }
}

/// The validation and conversion behavior behind a type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Non-empty after trimming
    String,
    /// Anything, including empty
    OptionalString,
    /// Decimal or scientific notation
    Float,
    /// Optional sign followed by digits
    Integer,
    /// One of an ordered set of declared values
    Enum { options: Vec<EnumOption> },
}

impl TypeKind {
    /// Pure function of `raw`: no state, no side effects.
    pub fn validate(&self, raw: &str) -> bool {
        match self {
            TypeKind::String => !raw.trim().is_empty(),
            TypeKind::OptionalString => true,
            TypeKind::Float => {
                float_pattern().is_match(raw)
                    && raw.parse::<f64>().map(f64::is_finite).unwrap_or(false)
            }
            TypeKind::Integer => integer_pattern().is_match(raw) && raw.parse::<i64>().is_ok(),
            TypeKind::Enum { options } => options.iter().any(|option| option.value == raw),
        }
    }

    /// Whether values of this kind can be range-checked.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeKind::Float | TypeKind::Integer)
    }
}

/// A named, registered type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn validate(&self, raw: &str) -> bool {
        self.kind.validate(raw)
    }

    /// UI representation of an absent value.
    pub fn empty_value(&self) -> &'static str {
        ""
    }

    /// Convert a committed value into the text the UI edits.
    pub fn to_ui(&self, native: Option<&Value>) -> String {
        match native {
            None | Some(Value::Null) => self.empty_value().to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Convert validated UI text into the value stored in the model.
    ///
    /// Text that does not convert (only possible when the caller skipped
    /// validation) is kept as a JSON string.
    pub fn to_native(&self, raw: &str) -> Value {
        let converted = match &self.kind {
            TypeKind::String | TypeKind::OptionalString => None,
            TypeKind::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            TypeKind::Integer => raw.parse::<i64>().ok().map(Value::from),
            TypeKind::Enum { options } => options
                .iter()
                .find(|option| option.value == raw && option.numeric)
                .and_then(|_| serde_json::from_str::<Number>(raw).ok())
                .map(Value::Number),
        };
        converted.unwrap_or_else(|| Value::String(raw.to_string()))
    }

    /// Declared options, empty for non-enum types.
    pub fn options(&self) -> &[EnumOption] {
        match &self.kind {
            TypeKind::Enum { options } => options,
            _ => &[],
        }
    }

    /// Label for an enum value, if this is an enum and the value is declared.
    pub fn display_name(&self, value: &str) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.display_name.as_str())
    }
}

/// Lookup table from type name to descriptor.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// An empty registry, without built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `String`, `OptionalString`, `Float` and `Integer`.
    pub fn with_builtins() -> Self {
        let mut types = BTreeMap::new();
        for (name, kind) in [
            (STRING, TypeKind::String),
            (OPTIONAL_STRING, TypeKind::OptionalString),
            (FLOAT, TypeKind::Float),
            (INTEGER, TypeKind::Integer),
        ] {
            types.insert(name.to_string(), TypeDescriptor::new(name, kind));
        }
        Self { types }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: TypeKind,
    ) -> Result<&TypeDescriptor, SchemaError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name));
        }
        tracing::debug!(type_name = %name, "registered field type");
        let descriptor = TypeDescriptor::new(name.clone(), kind);
        Ok(self.types.entry(name).or_insert(descriptor))
    }

    pub fn register_enum(
        &mut self,
        name: impl Into<String>,
        options: Vec<EnumOption>,
    ) -> Result<&TypeDescriptor, SchemaError> {
        self.register(name, TypeKind::Enum { options })
    }

    pub fn resolve(&self, name: &str) -> Result<&TypeDescriptor, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Validate `raw` against the named type.
    ///
    /// Never fails: an unregistered type name is rejected at resolve time,
    /// so here it only reads as "not valid".
    pub fn validate(&self, name: &str, raw: &str) -> bool {
        match self.types.get(name) {
            Some(descriptor) => descriptor.validate(raw),
            None => {
                tracing::warn!(type_name = name, "validate called with unregistered type");
                false
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
