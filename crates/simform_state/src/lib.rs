//! Simulation form editing state.
//!
//! Two stores and one component that moves values between them:
//!
//! - [`ModelStore`]: last committed value per model (ground truth)
//! - [`FormStateStore`]: what the user is currently editing, per field
//! - [`Reconciler`]: initializes forms from models, routes edits, and
//!   commits or cancels one model at a time
//!
//! Only the reconciler copies values between the stores. Outside code gets
//! shared references to the stores and goes through the reconciler for
//! every mutation.

pub mod error;
pub mod field;
pub mod form_store;
pub mod model_store;
pub mod observe;
pub mod reconciler;

pub use error::FormError;
pub use field::{EditOutcome, FieldController, FieldState};
pub use form_store::{FormEvent, FormState, FormStateStore};
pub use model_store::{ModelEvent, ModelSet, ModelStore};
pub use observe::SubscriptionId;
pub use reconciler::{is_dirty, is_valid, FieldView, FormStatus, Reconciler};
