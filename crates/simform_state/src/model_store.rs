//! Model Store
//!
//! Last committed value of every model in the schema. Seeded with schema
//! defaults so a model that was never loaded still reads as something
//! sensible. The only write is a whole-object replace.

use std::collections::{BTreeMap, BTreeSet};

use simform_schema::{ModelValue, ResolvedSchema};

use crate::error::FormError;
use crate::observe::{Observers, SubscriptionId};

/// Model name -> model value, as delivered by a loader.
pub type ModelSet = BTreeMap<String, ModelValue>;

/// A model store mutation.
#[derive(Debug, Clone, Copy)]
pub enum ModelEvent<'a> {
    Replaced { model: &'a str, value: &'a ModelValue },
}

type ModelObserver = dyn FnMut(&ModelEvent<'_>);

#[derive(Debug, Default)]
pub struct ModelStore {
    models: BTreeMap<String, ModelValue>,
    loaded: BTreeSet<String>,
    observers: Observers<ModelObserver>,
}

impl ModelStore {
    /// A store holding the schema defaults for every model.
    pub fn with_defaults(schema: &ResolvedSchema) -> Self {
        let models = schema
            .models()
            .map(|spec| (spec.name.clone(), spec.defaults()))
            .collect();
        Self {
            models,
            loaded: BTreeSet::new(),
            observers: Observers::new(),
        }
    }

    /// Last committed value, or the schema defaults if never set.
    pub fn get_model(&self, model: &str) -> Result<&ModelValue, FormError> {
        self.models
            .get(model)
            .ok_or_else(|| FormError::UnknownModel(model.to_string()))
    }

    /// Replace a model as a whole. There is deliberately no per-field setter.
    pub fn set_model(&mut self, model: &str, value: ModelValue) -> Result<(), FormError> {
        let slot = self
            .models
            .get_mut(model)
            .ok_or_else(|| FormError::UnknownModel(model.to_string()))?;
        *slot = value;
        self.loaded.insert(model.to_string());
        tracing::debug!(model, fields = slot.len(), "replaced model");

        let value = &self.models[model];
        let event = ModelEvent::Replaced { model, value };
        for callback in self.observers.callbacks() {
            callback(&event);
        }
        Ok(())
    }

    /// Whether the model has been set since the store was created.
    pub fn is_loaded(&self, model: &str) -> bool {
        self.loaded.contains(model)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Copy of every model, for export.
    pub fn snapshot(&self) -> ModelSet {
        self.models.clone()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ModelEvent<'_>) + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}
