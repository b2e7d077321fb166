//! End-to-end tests for the form reconciler
//!
//! Drives the full cycle: schema -> load -> edit -> commit/cancel, and
//! checks both stores after every step.

use serde_json::{json, Value};
use simform_schema::{ModelValue, ResolvedSchema, SchemaDocument, Subview};
use simform_state::{
    is_dirty, is_valid, EditOutcome, FormError, FormEvent, ModelEvent, ModelSet, Reconciler,
};
use std::cell::RefCell;
use std::rc::Rc;

fn myapp_schema() -> ResolvedSchema {
    let doc = SchemaDocument::from_json_value(json!({
        "enum": {
            "DogDisposition": [["aggressive", "Aggressive"], ["friendly", "Friendly"], ["submissive", "Submissive"]],
            "Gender": [["male", "Male"], ["female", "Female"]]
        },
        "model": {
            "dog": {
                "breed": ["Breed", "String", ""],
                "gender": ["Gender", "Gender", "male"],
                "height": ["Height [cm]", "Float", 50.0, "Distance from front paws to withers", 0, 300],
                "weight": ["Weight [lbs]", "Float", 60.5],
                "disposition": ["Disposition", "DogDisposition", "friendly"],
                "favoriteTreat": ["Favorite Treat", "OptionalString", ""]
            },
            "simulation": {
                "name": ["Name", "String", ""],
                "notes": ["Notes", "OptionalString", ""]
            }
        },
        "view": {
            "dog": {
                "title": "Dog",
                "basic": ["breed", "gender", "height", "weight"],
                "advanced": ["breed", "gender", "height", "weight", "disposition", "favoriteTreat"]
            },
            "simulation": {
                "title": "Simulation",
                "basic": ["name"],
                "advanced": ["name", "notes"]
            }
        }
    }))
    .unwrap();
    ResolvedSchema::resolve(&doc).unwrap()
}

fn object(value: Value) -> ModelValue {
    value.as_object().cloned().unwrap()
}

fn loaded() -> Reconciler {
    let mut reconciler = Reconciler::new(myapp_schema());
    let mut set = ModelSet::new();
    set.insert(
        "dog".to_string(),
        object(json!({
            "breed": "Great Dane",
            "disposition": "friendly",
            "favoriteTreat": "",
            "gender": "male",
            "height": 81.28,
            "weight": 70.25
        })),
    );
    set.insert(
        "simulation".to_string(),
        object(json!({
            "name": "Scooby Doo",
            "notes": "",
            "simulationId": "vK42jokQ",
            "isExample": true
        })),
    );
    reconciler.load_models(set).unwrap();
    reconciler
}

fn dog_only() -> Reconciler {
    let doc = SchemaDocument::from_json_str(r#"{"model": {"dog": {"breed": ["Breed","String","",""]}}}"#)
        .unwrap();
    let mut reconciler = Reconciler::new(ResolvedSchema::resolve(&doc).unwrap());
    let mut set = ModelSet::new();
    set.insert("dog".to_string(), object(json!({ "breed": "Great Dane" })));
    reconciler.load_models(set).unwrap();
    reconciler
}

// =============================================================================
// DOG SCENARIOS
// =============================================================================

#[test]
fn test_dog_invalid_edit_is_rejected() {
    let mut reconciler = dog_only();

    let breed = reconciler.forms().get_field("dog", "breed").unwrap();
    assert_eq!((breed.value(), breed.valid(), breed.touched()), ("Great Dane", true, false));

    reconciler.edit_field("dog", "breed", "").unwrap();
    let breed = reconciler.forms().get_field("dog", "breed").unwrap();
    assert_eq!((breed.value(), breed.valid(), breed.touched()), ("", false, true));
    assert!(!is_valid(reconciler.forms().get_form("dog").unwrap()));

    let err = reconciler.commit("dog").unwrap_err();
    assert!(matches!(err, FormError::CommitRejected { .. }));
    assert_eq!(
        reconciler.models().get_model("dog").unwrap(),
        &object(json!({ "breed": "Great Dane" }))
    );
}

#[test]
fn test_dog_valid_edit_commits() {
    let mut reconciler = dog_only();
    reconciler.edit_field("dog", "breed", "Poodle").unwrap();
    reconciler.commit("dog").unwrap();

    assert_eq!(
        reconciler.models().get_model("dog").unwrap(),
        &object(json!({ "breed": "Poodle" }))
    );
    let breed = reconciler.forms().get_field("dog", "breed").unwrap();
    assert_eq!((breed.value(), breed.valid(), breed.touched()), ("Poodle", true, false));
}

// =============================================================================
// COMMIT SEMANTICS
// =============================================================================

#[test]
fn test_commit_round_trip_resets_touched() {
    let mut reconciler = loaded();
    reconciler.edit_field("dog", "height", "3.14e-2").unwrap();
    reconciler.edit_field("dog", "gender", "female").unwrap();
    reconciler.edit_field("dog", "favoriteTreat", "bacon").unwrap();

    let committed = reconciler.commit("dog").unwrap().clone();
    assert_eq!(committed["height"], json!(0.0314));
    assert_eq!(committed["gender"], json!("female"));

    let form = reconciler.forms().get_form("dog").unwrap();
    assert!(!is_dirty(form));
    for (name, state) in form {
        assert!(!state.touched(), "{name} still touched");
        let spec = reconciler.schema().model("dog").unwrap().field(name).unwrap();
        assert_eq!(state.value(), spec.to_ui(committed.get(name)));
    }
}

#[test]
fn test_commit_keeps_untouched_and_undeclared_values() {
    let mut reconciler = loaded();
    reconciler.edit_field("simulation", "notes", "first run").unwrap();
    reconciler.commit("simulation").unwrap();

    let simulation = reconciler.models().get_model("simulation").unwrap();
    assert_eq!(simulation["notes"], json!("first run"));
    assert_eq!(simulation["name"], json!("Scooby Doo"));
    assert_eq!(simulation["simulationId"], json!("vK42jokQ"));
    assert_eq!(simulation["isExample"], json!(true));
}

#[test]
fn test_untouched_invalid_field_blocks_commit() {
    let mut reconciler = Reconciler::new(myapp_schema());

    reconciler.edit_field("dog", "favoriteTreat", "kibble").unwrap();
    let err = reconciler.commit("dog").unwrap_err();
    match err {
        FormError::CommitRejected {
            model,
            invalid_fields,
        } => {
            assert_eq!(model, "dog");
            assert_eq!(invalid_fields, vec!["breed".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(reconciler.models().get_model("dog").unwrap()["favoriteTreat"], json!(""));
}

#[test]
fn test_out_of_range_value_blocks_commit() {
    let mut reconciler = loaded();
    reconciler.edit_field("dog", "height", "-5").unwrap();

    let status = reconciler.status("dog").unwrap();
    assert!(status.dirty);
    assert_eq!(status.invalid_fields, vec!["height".to_string()]);
    assert!(reconciler.commit("dog").is_err());
}

#[test]
fn test_commit_is_scoped_to_one_model() {
    let mut reconciler = loaded();
    reconciler.edit_field("dog", "breed", "Beagle").unwrap();
    reconciler.edit_field("simulation", "name", "").unwrap();

    reconciler.commit("dog").unwrap();
    assert!(reconciler.status("simulation").unwrap().dirty);
    assert!(reconciler.commit("simulation").is_err());
    assert_eq!(reconciler.models().get_model("dog").unwrap()["breed"], json!("Beagle"));
}

// =============================================================================
// EDIT AND CANCEL
// =============================================================================

#[test]
fn test_repeated_edit_reports_no_change() {
    let mut reconciler = loaded();
    assert!(reconciler.edit_field("dog", "breed", "Beagle").unwrap().is_changed());

    let before = reconciler.forms().get_form("dog").unwrap().clone();
    assert_eq!(
        reconciler.edit_field("dog", "breed", "Beagle").unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(reconciler.forms().get_form("dog").unwrap(), &before);
}

#[test]
fn test_cancel_discards_edits() {
    let mut reconciler = loaded();
    let pristine = reconciler.forms().get_form("dog").unwrap().clone();

    reconciler.edit_field("dog", "weight", "heavy").unwrap();
    reconciler.edit_field("dog", "disposition", "aggressive").unwrap();
    reconciler.cancel("dog").unwrap();

    assert_eq!(reconciler.forms().get_form("dog").unwrap(), &pristine);
    assert_eq!(reconciler.models().get_model("dog").unwrap()["weight"], json!(70.25));
}

#[test]
fn test_enum_edit_validation() {
    let mut reconciler = loaded();
    reconciler.edit_field("dog", "disposition", "grumpy").unwrap();
    assert!(!reconciler.field_view("dog", "disposition").unwrap().valid);

    reconciler.edit_field("dog", "disposition", "submissive").unwrap();
    let view = reconciler.field_view("dog", "disposition").unwrap();
    assert!(view.valid);
    assert!(view.touched);
    assert_eq!(view.options.len(), 3);
}

// =============================================================================
// RENDERING AND OBSERVERS
// =============================================================================

#[test]
fn test_view_fields_follow_declared_order() {
    let reconciler = loaded();

    let basic = reconciler.view_fields("dog", Subview::Basic).unwrap();
    let names: Vec<&str> = basic.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(names, vec!["breed", "gender", "height", "weight"]);
    assert_eq!(basic[2].value, "81.28");
    assert_eq!(basic[2].description.as_deref(), Some("Distance from front paws to withers"));

    let advanced = reconciler.view_fields("simulation", Subview::Advanced).unwrap();
    assert_eq!(advanced.len(), 2);
}

#[test]
fn test_observers_follow_commit_sequence() {
    let mut reconciler = loaded();
    let log = Rc::new(RefCell::new(Vec::new()));

    let form_log = Rc::clone(&log);
    reconciler.subscribe_forms(move |event| {
        let entry = match event {
            FormEvent::Initialized { model, form } => {
                format!("form init {model} dirty={}", is_dirty(form))
            }
            FormEvent::FieldUpdated { model, field, form } => {
                format!("form field {model}.{field} dirty={}", is_dirty(form))
            }
        };
        form_log.borrow_mut().push(entry);
    });
    let model_log = Rc::clone(&log);
    reconciler.subscribe_models(move |event| {
        let ModelEvent::Replaced { model, value } = event;
        model_log
            .borrow_mut()
            .push(format!("model replaced {model} breed={}", value["breed"]));
    });

    reconciler.edit_field("dog", "breed", "Beagle").unwrap();
    reconciler.commit("dog").unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "form field dog.breed dirty=true".to_string(),
            "model replaced dog breed=\"Beagle\"".to_string(),
            "form init dog dirty=false".to_string(),
        ]
    );
}

#[test]
fn test_rejected_commit_notifies_nobody() {
    let mut reconciler = loaded();
    reconciler.edit_field("dog", "breed", " ").unwrap();

    let count = Rc::new(RefCell::new(0));
    let forms = Rc::clone(&count);
    let form_id = reconciler.subscribe_forms(move |_| *forms.borrow_mut() += 1);
    let models = Rc::clone(&count);
    reconciler.subscribe_models(move |_| *models.borrow_mut() += 1);

    assert!(reconciler.commit("dog").is_err());
    assert_eq!(*count.borrow(), 0);

    assert!(reconciler.unsubscribe_forms(form_id));
    reconciler.cancel("dog").unwrap();
    assert_eq!(*count.borrow(), 0);
}
