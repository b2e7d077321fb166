//! `simform check` - load a schema document and show what it resolves to

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_bounds, format_value, print_json, print_table};
use anyhow::Result;
use serde::Serialize;
use simform::load_schema;
use simform_schema::{FieldRef, ModelSpec, ResolvedSchema, ViewSpec};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CheckArgs {
    pub schema: PathBuf,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    schema: &'a Path,
    types: Vec<&'a str>,
    models: Vec<&'a ModelSpec>,
    views: Vec<&'a ViewSpec>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let schema = open_schema(&args.schema)?;

    if args.json {
        return print_json(&CheckReport {
            schema: &args.schema,
            types: schema.registry().names().collect(),
            models: schema.models().collect(),
            views: schema.views().collect(),
        });
    }

    let mut rows = Vec::new();
    for model in schema.models() {
        for field in model.fields.values() {
            rows.push(vec![
                model.name.clone(),
                field.name.clone(),
                field.schema.display_name.clone(),
                field.schema.type_name.clone(),
                format_value(Some(&field.schema.default_value)),
                format_bounds(field.schema.min, field.schema.max),
            ]);
        }
    }
    print_table(&["MODEL", "FIELD", "LABEL", "TYPE", "DEFAULT", "BOUNDS"], rows);

    let views: Vec<Vec<String>> = schema
        .views()
        .map(|view| {
            vec![
                view.name.clone(),
                view.title.clone(),
                view.model.clone(),
                join_refs(&view.basic, &view.model),
                join_refs(&view.advanced, &view.model),
            ]
        })
        .collect();
    if !views.is_empty() {
        println!();
        print_table(&["VIEW", "TITLE", "MODEL", "BASIC", "ADVANCED"], views);
    }

    println!(
        "\n{} models, {} views, {} types",
        schema.models().count(),
        schema.views().count(),
        schema.registry().names().count()
    );
    Ok(())
}

/// Load and resolve a schema, turning failures into helpful errors.
pub fn open_schema(path: &Path) -> Result<ResolvedSchema> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    load_schema(path).map_err(|err| {
        tracing::error!(path = %path.display(), error = %err, "schema failed to load");
        anyhow::Error::from(HelpfulError::invalid_schema(path, &err))
    })
}

/// Field references relative to the view's own model print bare.
fn join_refs(refs: &[FieldRef], model: &str) -> String {
    refs.iter()
        .map(|r| {
            if r.model == model {
                r.field.clone()
            } else {
                r.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
