//! Field Controller
//!
//! The editing lifecycle of one field:
//!
//! ```text
//! Initialized(touched = false) --user edit--> Edited(touched = true) --edit--> Edited
//!        ^                                          |
//!        +------------- re-init (commit/cancel) ----+
//! ```
//!
//! [`FieldState`] can only be produced by the two transitions on
//! [`FieldController`]. The form store runs the controller of the field
//! being written, so a stored state's `valid` always equals that field's
//! validator applied to `value`.

use serde::Serialize;
use serde_json::Value;
use simform_schema::FieldSpec;

/// Editing state of one field. The value is always UI text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldState {
    value: String,
    valid: bool,
    touched: bool,
}

impl FieldState {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn touched(&self) -> bool {
        self.touched
    }
}

/// Result of a user edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The input equals the current value; nothing to store.
    Unchanged,
    /// The next state to store for the field.
    Changed(FieldState),
}

impl EditOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, EditOutcome::Changed(_))
    }
}

/// Transitions for one field, bound to its resolved schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldController<'a> {
    spec: &'a FieldSpec,
}

impl<'a> FieldController<'a> {
    pub fn new(spec: &'a FieldSpec) -> Self {
        Self { spec }
    }

    /// Build state from a committed value; `None` means the model has no
    /// entry for this field.
    pub fn on_external_reinit(&self, native: Option<&Value>) -> FieldState {
        let value = self.spec.to_ui(native);
        FieldState {
            valid: self.spec.validate(&value),
            value,
            touched: false,
        }
    }

    pub fn on_user_edit(&self, current: &FieldState, raw: &str) -> EditOutcome {
        if raw == current.value {
            return EditOutcome::Unchanged;
        }
        EditOutcome::Changed(FieldState {
            value: raw.to_string(),
            valid: self.spec.validate(raw),
            touched: true,
        })
    }

    /// The value to commit for this state.
    pub fn to_native(&self, state: &FieldState) -> Value {
        self.spec.to_native(&state.value)
    }
}
