//! View/Form Reconciler
//!
//! Owns both stores and is the only code that copies between them:
//!
//! - **initialize**: model store -> form store (on load, commit, cancel)
//! - **edit**: user text -> one field of the form store
//! - **commit**: valid form -> model store, then re-initialize the form
//! - **cancel**: re-initialize the form from the unchanged model
//!
//! Commit and cancel are scoped to a single model. A form with any invalid
//! field, touched or not, cannot be committed.

use serde::Serialize;
use simform_schema::{EnumOption, FieldRef, ModelSpec, ResolvedSchema, Subview};
use tracing::{debug, info, warn};

use crate::error::FormError;
use crate::field::{EditOutcome, FieldController};
use crate::form_store::{FormEvent, FormState, FormStateStore};
use crate::model_store::{ModelEvent, ModelSet, ModelStore};
use crate::observe::SubscriptionId;

/// True iff any field has been edited since the last initialization.
pub fn is_dirty(form: &FormState) -> bool {
    form.values().any(|field| field.touched())
}

/// True iff every field is valid, including fields the user never touched.
pub fn is_valid(form: &FormState) -> bool {
    form.values().all(|field| field.valid())
}

/// Aggregate status of one form, for enabling save/cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormStatus {
    pub model: String,
    pub dirty: bool,
    pub valid: bool,
    pub invalid_fields: Vec<String>,
}

/// What the rendering layer needs to draw one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub model: String,
    pub field: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub type_name: String,
    pub value: String,
    pub valid: bool,
    pub touched: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<EnumOption>,
}

#[derive(Debug)]
pub struct Reconciler {
    schema: ResolvedSchema,
    models: ModelStore,
    forms: FormStateStore,
}

impl Reconciler {
    /// Seed the model store with schema defaults and initialize every form
    /// from them, so no form is ever read before it exists.
    pub fn new(schema: ResolvedSchema) -> Self {
        let models = ModelStore::with_defaults(&schema);
        let mut forms = FormStateStore::new();
        for spec in schema.models() {
            if let Ok(value) = models.get_model(&spec.name) {
                forms.initialize_form(spec, value);
            }
        }
        Self {
            schema,
            models,
            forms,
        }
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn forms(&self) -> &FormStateStore {
        &self.forms
    }

    pub fn subscribe_forms(
        &mut self,
        callback: impl FnMut(&FormEvent<'_>) + 'static,
    ) -> SubscriptionId {
        self.forms.subscribe(callback)
    }

    pub fn subscribe_models(
        &mut self,
        callback: impl FnMut(&ModelEvent<'_>) + 'static,
    ) -> SubscriptionId {
        self.models.subscribe(callback)
    }

    pub fn unsubscribe_forms(&mut self, id: SubscriptionId) -> bool {
        self.forms.unsubscribe(id)
    }

    pub fn unsubscribe_models(&mut self, id: SubscriptionId) -> bool {
        self.models.unsubscribe(id)
    }

    /// Replace every schema model present in `set` and re-initialize its
    /// form. Models missing from `set` keep their current value; entries for
    /// models the schema does not declare are skipped.
    pub fn load_models(&mut self, set: ModelSet) -> Result<(), FormError> {
        for (name, value) in set {
            let Ok(spec) = self.schema.model(&name) else {
                warn!(model = %name, "ignoring data for model not declared by the schema");
                continue;
            };
            self.models.set_model(&name, value)?;
            let committed = self.models.get_model(&name)?;
            self.forms.initialize_form(spec, committed);
        }
        info!(
            loaded = self.models.model_names().filter(|m| self.models.is_loaded(m)).count(),
            "loaded model data"
        );
        Ok(())
    }

    /// Route a user edit of `model.field` through its controller.
    pub fn edit_field(
        &mut self,
        model: &str,
        field: &str,
        raw: &str,
    ) -> Result<EditOutcome, FormError> {
        self.field_spec(model, field)?;
        let outcome = self.forms.update_field(model, field, raw)?;
        if let EditOutcome::Changed(next) = &outcome {
            debug!(model, field, valid = next.valid(), "field edited");
        }
        Ok(outcome)
    }

    pub fn status(&self, model: &str) -> Result<FormStatus, FormError> {
        let form = self.forms.get_form(model)?;
        Ok(FormStatus {
            model: model.to_string(),
            dirty: is_dirty(form),
            valid: is_valid(form),
            invalid_fields: invalid_fields(form),
        })
    }

    /// Write the form back into the model store.
    ///
    /// Touched fields are converted to native values; untouched fields keep
    /// their committed value, as do model entries the schema does not
    /// declare. Returns the newly committed model.
    pub fn commit(&mut self, model: &str) -> Result<&simform_schema::ModelValue, FormError> {
        let spec = self.schema.model(model)?;
        let form = self.forms.get_form(model)?;
        if !is_valid(form) {
            let invalid_fields = invalid_fields(form);
            warn!(model, invalid = ?invalid_fields, "commit rejected");
            return Err(FormError::CommitRejected {
                model: model.to_string(),
                invalid_fields,
            });
        }

        let mut next = self.models.get_model(model)?.clone();
        let mut changed = 0usize;
        for (name, state) in form {
            if !state.touched() {
                continue;
            }
            if let Some(field_spec) = spec.field(name) {
                next.insert(name.clone(), FieldController::new(field_spec).to_native(state));
                changed += 1;
            }
        }

        self.models.set_model(model, next)?;
        let committed = self.models.get_model(model)?;
        self.forms.initialize_form(spec, committed);
        info!(model, changed, "committed model");
        Ok(committed)
    }

    /// Discard all edits by re-initializing from the committed model.
    pub fn cancel(&mut self, model: &str) -> Result<(), FormError> {
        let spec = self.schema.model(model)?;
        let committed = self.models.get_model(model)?;
        let dirty = self.forms.get_form(model).map(is_dirty).unwrap_or(false);
        self.forms.initialize_form(spec, committed);
        info!(model, discarded = dirty, "cancelled edits");
        Ok(())
    }

    /// The render tuple for one field.
    pub fn field_view(&self, model: &str, field: &str) -> Result<FieldView, FormError> {
        let spec = self.field_spec(model, field)?;
        let state = self.forms.get_field(model, field)?;
        Ok(FieldView {
            model: model.to_string(),
            field: field.to_string(),
            display_name: spec.schema.display_name.clone(),
            description: spec.schema.description.clone(),
            type_name: spec.descriptor.name.clone(),
            value: state.value().to_string(),
            valid: state.valid(),
            touched: state.touched(),
            options: spec.descriptor.options().to_vec(),
        })
    }

    /// Render tuples for a view page, in declared order.
    pub fn view_fields(&self, view: &str, subview: Subview) -> Result<Vec<FieldView>, FormError> {
        let spec = self
            .schema
            .view(view)
            .ok_or_else(|| FormError::UnknownView(view.to_string()))?;
        spec.fields(subview)
            .iter()
            .map(|FieldRef { model, field }| self.field_view(model, field))
            .collect()
    }

    fn model_spec(&self, model: &str) -> Result<&ModelSpec, FormError> {
        Ok(self.schema.model(model)?)
    }

    fn field_spec(&self, model: &str, field: &str) -> Result<&simform_schema::FieldSpec, FormError> {
        self.model_spec(model)?
            .field(field)
            .ok_or_else(|| FormError::UnknownField {
                model: model.to_string(),
                field: field.to_string(),
            })
    }
}

fn invalid_fields(form: &FormState) -> Vec<String> {
    form.iter()
        .filter(|(_, state)| !state.valid())
        .map(|(name, _)| name.clone())
        .collect()
}
