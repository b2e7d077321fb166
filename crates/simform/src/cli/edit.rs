//! `simform edit` - drive the form engine without a UI
//!
//! Loads models, applies `--set model.field=value` edits through the
//! reconciler, then commits or cancels every edited model.

use crate::cli::check::open_schema;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use anyhow::{Context, Result};
use serde::Serialize;
use simform::config::{config_path, SimformConfig};
use simform::{JsonFileSource, ModelLoader, ModelSource, StubSource};
use simform_schema::FieldRef;
use simform_state::{FieldView, FormError, FormStatus, ModelSet, Reconciler};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug)]
pub struct EditArgs {
    pub schema: Option<PathBuf>,
    pub models: Option<PathBuf>,
    pub set: Vec<String>,
    pub commit: bool,
    pub cancel: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct EditRecord {
    model: String,
    field: String,
    value: String,
    changed: bool,
    valid: bool,
}

#[derive(Debug, Serialize)]
struct CommitRecord {
    model: String,
    committed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    invalid_fields: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FormReport {
    #[serde(flatten)]
    status: FormStatus,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct EditReport {
    edits: Vec<EditRecord>,
    commits: Vec<CommitRecord>,
    cancelled: Vec<String>,
    forms: Vec<FormReport>,
    models: ModelSet,
}

pub fn run(args: EditArgs) -> Result<()> {
    let config = SimformConfig::load()?;

    let schema_path = args
        .schema
        .clone()
        .or_else(|| config.schema.clone())
        .ok_or_else(|| HelpfulError::missing_schema(&config_path()))?;
    let mut reconciler = Reconciler::new(open_schema(&schema_path)?);

    let assignments = args
        .set
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    match args.models.clone().or_else(|| config.models.clone()) {
        Some(path) => {
            if !path.exists() {
                return Err(HelpfulError::file_not_found(&path).into());
            }
            let loader = ModelLoader::new(JsonFileSource::new(path));
            load_into(&runtime, &loader, &mut reconciler)?;
        }
        None => {
            let defaults: ModelSet = reconciler
                .schema()
                .models()
                .map(|spec| (spec.name.clone(), spec.defaults()))
                .collect();
            let loader = ModelLoader::new(StubSource::new(defaults, config.load_delay()));
            load_into(&runtime, &loader, &mut reconciler)?;
        }
    }

    let mut edited = BTreeSet::new();
    let mut edits = Vec::new();
    for (target, value) in &assignments {
        let outcome = reconciler
            .edit_field(&target.model, &target.field, value)
            .with_context(|| format!("Failed to apply --set {}={}", target, value))?;
        let view = reconciler.field_view(&target.model, &target.field)?;
        edits.push(EditRecord {
            model: target.model.clone(),
            field: target.field.clone(),
            value: value.clone(),
            changed: outcome.is_changed(),
            valid: view.valid,
        });
        edited.insert(target.model.clone());
    }

    let mut commits = Vec::new();
    let mut cancelled = Vec::new();
    let mut rejected = Vec::new();
    for model in &edited {
        if args.commit {
            match reconciler.commit(model) {
                Ok(_) => commits.push(CommitRecord {
                    model: model.clone(),
                    committed: true,
                    invalid_fields: Vec::new(),
                }),
                Err(FormError::CommitRejected { model, invalid_fields }) => {
                    rejected.push((model.clone(), invalid_fields.clone()));
                    commits.push(CommitRecord {
                        model,
                        committed: false,
                        invalid_fields,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        } else if args.cancel {
            reconciler.cancel(model)?;
            cancelled.push(model.clone());
        }
    }

    // With no edits, show every form as loaded.
    let shown: Vec<String> = if edited.is_empty() {
        reconciler.models().model_names().map(str::to_string).collect()
    } else {
        edited.into_iter().collect()
    };
    let mut forms = Vec::new();
    for model in &shown {
        forms.push(form_report(&reconciler, model)?);
    }

    let report = EditReport {
        edits,
        commits,
        cancelled,
        forms,
        models: reconciler.models().snapshot(),
    };

    if let Some(path) = &args.output {
        let text = serde_json::to_string_pretty(&report.models)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write models: {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote committed models");
    }

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if !rejected.is_empty() {
        return Err(HelpfulError::commit_rejected(&rejected).into());
    }
    Ok(())
}

/// Split `model.field=value`. The value may itself contain `=` or be empty.
fn parse_assignment(arg: &str) -> Result<(FieldRef, String), HelpfulError> {
    let (target, value) = arg
        .split_once('=')
        .ok_or_else(|| HelpfulError::invalid_assignment(arg))?;
    match target.trim().split_once('.') {
        Some((model, field)) if !model.is_empty() && !field.is_empty() => {
            Ok((FieldRef::new(model, field), value.to_string()))
        }
        _ => Err(HelpfulError::invalid_assignment(arg)),
    }
}

/// Wait for the run's single fetch and hand the result to the reconciler.
fn load_into<S: ModelSource>(
    runtime: &tokio::runtime::Runtime,
    loader: &ModelLoader<S>,
    reconciler: &mut Reconciler,
) -> Result<()> {
    let set = runtime.block_on(loader.load())?;
    reconciler.load_models(set.clone())?;
    tracing::debug!(fetches = loader.fetch_count(), "model data applied");
    Ok(())
}

fn form_report(reconciler: &Reconciler, model: &str) -> Result<FormReport> {
    let spec = reconciler.schema().model(model)?;
    let fields = spec
        .field_names()
        .map(|field| reconciler.field_view(model, field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FormReport {
        status: reconciler.status(model)?,
        fields,
    })
}

fn print_report(report: &EditReport) {
    for form in &report.forms {
        let rows = form
            .fields
            .iter()
            .map(|field| {
                vec![
                    field.field.clone(),
                    field.display_name.clone(),
                    field.value.clone(),
                    if field.valid { "yes" } else { "NO" }.to_string(),
                    if field.touched { "*" } else { "" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{} (dirty: {}, valid: {})",
            form.status.model, form.status.dirty, form.status.valid
        );
        print_table(&["FIELD", "LABEL", "VALUE", "VALID", "TOUCHED"], rows);
    }

    for commit in &report.commits {
        if commit.committed {
            println!("Committed {}", commit.model);
        } else {
            println!(
                "Rejected {}: invalid {}",
                commit.model,
                commit.invalid_fields.join(", ")
            );
        }
    }
    for model in &report.cancelled {
        println!("Cancelled {}", model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (target, value) = parse_assignment("dog.breed=Great Dane").unwrap();
        assert_eq!(target, FieldRef::new("dog", "breed"));
        assert_eq!(value, "Great Dane");

        let (_, value) = parse_assignment("simulation.notes=a=b").unwrap();
        assert_eq!(value, "a=b");

        let (_, value) = parse_assignment("dog.breed=").unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn test_load_into_reuses_one_fetch() {
        let doc = simform_schema::SchemaDocument::from_json_str(
            r#"{"model": {"dog": {"breed": ["Breed", "String", ""]}}}"#,
        )
        .unwrap();
        let mut reconciler = Reconciler::new(simform_schema::ResolvedSchema::resolve(&doc).unwrap());
        let set = simform::parse_model_set(r#"{"dog": {"breed": "Great Dane"}}"#).unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let loader = ModelLoader::new(StubSource::new(set, std::time::Duration::ZERO));

        load_into(&runtime, &loader, &mut reconciler).unwrap();
        reconciler.edit_field("dog", "breed", "Beagle").unwrap();
        load_into(&runtime, &loader, &mut reconciler).unwrap();

        assert_eq!(loader.fetch_count(), 1);
        assert!(reconciler.models().is_loaded("dog"));
        let breed = reconciler.forms().get_field("dog", "breed").unwrap();
        assert_eq!((breed.value(), breed.touched()), ("Great Dane", false));
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        for arg in ["dog.breed", "breed=Beagle", ".breed=Beagle", "dog.=Beagle"] {
            assert!(parse_assignment(arg).is_err(), "{arg} accepted");
        }
    }
}
