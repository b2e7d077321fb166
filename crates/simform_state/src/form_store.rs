//! Form State Store
//!
//! Per model, the editing state of every field declared by the schema. A
//! form is replaced wholesale on (re)initialization and patched one field
//! at a time on user edits; nothing else writes here.
//!
//! The store keeps the model schema each form was built from, and a field
//! edit is run through that field's own controller. A state computed for
//! one field can never land in another field's slot.

use std::collections::BTreeMap;

use simform_schema::{ModelSpec, ModelValue};

use crate::error::FormError;
use crate::field::{EditOutcome, FieldController, FieldState};
use crate::observe::{Observers, SubscriptionId};

/// Field name -> editing state, for exactly the fields in the model schema.
pub type FormState = BTreeMap<String, FieldState>;

/// A form store mutation, with the form as it is after the change.
#[derive(Debug, Clone, Copy)]
pub enum FormEvent<'a> {
    Initialized {
        model: &'a str,
        form: &'a FormState,
    },
    FieldUpdated {
        model: &'a str,
        field: &'a str,
        form: &'a FormState,
    },
}

impl<'a> FormEvent<'a> {
    pub fn model(&self) -> &'a str {
        match *self {
            FormEvent::Initialized { model, .. } | FormEvent::FieldUpdated { model, .. } => model,
        }
    }

    pub fn form(&self) -> &'a FormState {
        match *self {
            FormEvent::Initialized { form, .. } | FormEvent::FieldUpdated { form, .. } => form,
        }
    }
}

type FormObserver = dyn FnMut(&FormEvent<'_>);

#[derive(Debug, Default)]
pub struct FormStateStore {
    forms: BTreeMap<String, FormState>,
    specs: BTreeMap<String, ModelSpec>,
    observers: Observers<FormObserver>,
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the form for `schema` from `value`, replacing any previous form
    /// for that model in a single step.
    pub fn initialize_form(&mut self, schema: &ModelSpec, value: &ModelValue) {
        let form: FormState = schema
            .fields
            .iter()
            .map(|(name, spec)| {
                let state = FieldController::new(spec).on_external_reinit(value.get(name));
                (name.clone(), state)
            })
            .collect();

        tracing::debug!(model = %schema.name, fields = form.len(), "initialized form");
        self.forms.insert(schema.name.clone(), form);
        self.specs.insert(schema.name.clone(), schema.clone());

        let form = &self.forms[&schema.name];
        let event = FormEvent::Initialized {
            model: &schema.name,
            form,
        };
        for callback in self.observers.callbacks() {
            callback(&event);
        }
    }

    pub fn get_form(&self, model: &str) -> Result<&FormState, FormError> {
        self.forms
            .get(model)
            .ok_or_else(|| FormError::FormNotInitialized(model.to_string()))
    }

    pub fn get_field(&self, model: &str, field: &str) -> Result<&FieldState, FormError> {
        self.get_form(model)?
            .get(field)
            .ok_or_else(|| FormError::UnknownField {
                model: model.to_string(),
                field: field.to_string(),
            })
    }

    /// Apply a user edit to one field, leaving its siblings untouched.
    ///
    /// The next state comes from the field's own controller, so `valid`
    /// always reflects this field's validator. An input equal to the
    /// current value is `Unchanged` and notifies nobody.
    pub fn update_field(
        &mut self,
        model: &str,
        field: &str,
        raw: &str,
    ) -> Result<EditOutcome, FormError> {
        let (Some(form), Some(spec)) = (self.forms.get_mut(model), self.specs.get(model)) else {
            return Err(FormError::FormNotInitialized(model.to_string()));
        };
        let unknown = || FormError::UnknownField {
            model: model.to_string(),
            field: field.to_string(),
        };
        let field_spec = spec.field(field).ok_or_else(unknown)?;
        let slot = form.get_mut(field).ok_or_else(unknown)?;

        let outcome = FieldController::new(field_spec).on_user_edit(slot, raw);
        let EditOutcome::Changed(next) = &outcome else {
            return Ok(outcome);
        };
        *slot = next.clone();
        tracing::debug!(model, field, valid = slot.valid(), "updated form field");

        let form = &self.forms[model];
        let event = FormEvent::FieldUpdated { model, field, form };
        for callback in self.observers.callbacks() {
            callback(&event);
        }
        Ok(outcome)
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&FormEvent<'_>) + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use simform_schema::{ResolvedSchema, SchemaDocument};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn dog_schema() -> ResolvedSchema {
        let doc = SchemaDocument::from_json_value(json!({
            "model": {
                "dog": {
                    "breed": ["Breed", "String", ""],
                    "weight": ["Weight", "Float", 60.5]
                }
            }
        }))
        .unwrap();
        ResolvedSchema::resolve(&doc).unwrap()
    }

    fn model(value: serde_json::Value) -> ModelValue {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_form_before_initialize() {
        let store = FormStateStore::new();
        let err = store.get_form("dog").unwrap_err();
        assert!(matches!(err, FormError::FormNotInitialized(name) if name == "dog"));
    }

    #[test]
    fn test_initialize_covers_schema_fields_only() {
        let schema = dog_schema();
        let mut store = FormStateStore::new();
        store.initialize_form(
            schema.model("dog").unwrap(),
            &model(json!({ "breed": "Great Dane", "color": "grey" })),
        );

        let form = store.get_form("dog").unwrap();
        assert_eq!(form.len(), 2);
        assert_eq!(form["breed"].value(), "Great Dane");
        assert!(form["breed"].valid());
        assert_eq!(form["weight"].value(), "");
        assert!(!form["weight"].valid());
        assert!(!form.contains_key("color"));
    }

    #[test]
    fn test_update_field_leaves_siblings() {
        let schema = dog_schema();
        let dog = schema.model("dog").unwrap();
        let mut store = FormStateStore::new();
        store.initialize_form(dog, &model(json!({ "breed": "Great Dane", "weight": 70.25 })));

        let before = store.get_field("dog", "weight").unwrap().clone();
        let outcome = store.update_field("dog", "breed", "Poodle").unwrap();
        assert!(outcome.is_changed());

        let breed = store.get_field("dog", "breed").unwrap();
        assert_eq!((breed.value(), breed.valid(), breed.touched()), ("Poodle", true, true));
        assert_eq!(store.get_field("dog", "weight").unwrap(), &before);
    }

    #[test]
    fn test_update_field_validates_with_its_own_type() {
        let schema = dog_schema();
        let dog = schema.model("dog").unwrap();
        let mut store = FormStateStore::new();
        store.initialize_form(dog, &model(json!({ "breed": "Great Dane", "weight": 70.25 })));

        // "heavy" is a fine String but not a Float.
        store.update_field("dog", "breed", "heavy").unwrap();
        store.update_field("dog", "weight", "heavy").unwrap();

        assert!(store.get_field("dog", "breed").unwrap().valid());
        let weight = store.get_field("dog", "weight").unwrap();
        assert_eq!(weight.value(), "heavy");
        assert!(!weight.valid());
        assert_eq!(weight.valid(), dog.field("weight").unwrap().validate(weight.value()));
    }

    #[test]
    fn test_update_field_same_value_is_unchanged() {
        let schema = dog_schema();
        let dog = schema.model("dog").unwrap();
        let mut store = FormStateStore::new();
        store.initialize_form(dog, &model(json!({ "breed": "Great Dane" })));

        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        let outcome = store.update_field("dog", "breed", "Great Dane").unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert!(!store.get_field("dog", "breed").unwrap().touched());
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_update_unknown_field() {
        let schema = dog_schema();
        let dog = schema.model("dog").unwrap();
        let mut store = FormStateStore::new();
        store.initialize_form(dog, &ModelValue::new());

        let err = store.update_field("dog", "tail", "wagging").unwrap_err();
        assert!(matches!(err, FormError::UnknownField { ref field, .. } if field == "tail"));

        let err = store.update_field("cat", "breed", "Siamese").unwrap_err();
        assert!(matches!(err, FormError::FormNotInitialized(_)));
    }

    #[test]
    fn test_observers_see_latest_snapshot() {
        let schema = dog_schema();
        let dog = schema.model("dog").unwrap();
        let mut store = FormStateStore::new();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |event| {
            let breed = event.form()["breed"].value().to_string();
            let kind = match event {
                FormEvent::Initialized { .. } => "init",
                FormEvent::FieldUpdated { .. } => "field",
            };
            sink.borrow_mut().push((kind, event.model().to_string(), breed));
        });

        store.initialize_form(dog, &model(json!({ "breed": "Great Dane" })));
        store.update_field("dog", "breed", "Poodle").unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("init", "dog".to_string(), "Great Dane".to_string()),
                ("field", "dog".to_string(), "Poodle".to_string()),
            ]
        );

        assert!(store.unsubscribe(id));
        store.initialize_form(dog, &ModelValue::new());
        assert_eq!(seen.borrow().len(), 2);
    }
}
