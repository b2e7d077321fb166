//! User-facing failures of the `simform` commands
//!
//! A `HelpfulError` names the failing schema, model file or field edit and
//! carries hints for the next command to try. Library errors (`SchemaError`,
//! `FormError`) are mapped onto it at the CLI boundary.

use simform_schema::SchemaError;
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    /// What the command was doing when it failed
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Schema or model file missing on disk
    pub fn file_not_found(path: &Path) -> Self {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(format!("No such file: {}", path.display()))
            .with_context("Schema documents and model data are read from disk")
            .with_suggestion(format!("List the JSON files next to it: ls {}/*.json", dir.display()))
            .with_suggestion("Paths in config.toml are relative to the config file")
    }

    /// No schema on the command line or in config.toml
    pub fn missing_schema(config_path: &Path) -> Self {
        Self::new("No schema document given")
            .with_context(format!("Neither --schema nor `schema` in {} is set", config_path.display()))
            .with_suggestion("Pass a schema explicitly: simform edit --schema myapp-schema.json")
            .with_suggestion(format!("Add `schema = \"...\"` to {}", config_path.display()))
    }

    /// Schema document failed to load or resolve
    pub fn invalid_schema(path: &Path, err: &SchemaError) -> Self {
        let suggestion = match err {
            SchemaError::UnknownType(_) => {
                "Declare the type under \"enum\" or use String, OptionalString, Float, Integer"
            }
            SchemaError::UnknownModel(_) | SchemaError::UnknownViewField { .. } => {
                "Every view field must name a field of a declared model"
            }
            SchemaError::Parse(_) => "Validate the JSON: cat FILE | python -m json.tool",
            _ => "Field entries are [displayName, typeName, defaultValue, description?, min?, max?]",
        };
        Self::new(format!("Invalid schema: {}", err))
            .with_context(format!("While loading {}", path.display()))
            .with_suggestion(suggestion)
            .with_suggestion(format!("Inspect the schema: simform check {}", path.display()))
    }

    /// `--set` argument not of the form `model.field=value`
    pub fn invalid_assignment(arg: &str) -> Self {
        Self::new(format!("Invalid field assignment: '{}'", arg))
            .with_context("Assignments must name a model, a field and a value")
            .with_suggestion("Use the form model.field=value, e.g. --set dog.height=42.5")
    }

    /// One or more models refused to commit
    pub fn commit_rejected(rejected: &[(String, Vec<String>)]) -> Self {
        let names: Vec<&str> = rejected.iter().map(|(model, _)| model.as_str()).collect();
        let mut err = Self::new(format!("Commit rejected for: {}", names.join(", ")))
            .with_context("Committed values are unchanged for the rejected models");
        for (model, fields) in rejected {
            err = err.with_suggestion(format!(
                "Fix invalid fields of {}: {}",
                model,
                fields.join(", ")
            ));
        }
        err
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  while: {}", ctx)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  hint: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a command failure as a JSON object on stderr.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({ "error": format!("{:#}", err) }),
    };
    eprintln!("{}", payload);
}
