//! Simform - Core Library
//!
//! Shared functionality for the launcher: where things live on disk, and
//! how schema and model data get loaded before the form engine starts.

pub mod config;
pub mod loader;

pub use config::SimformConfig;
pub use loader::{load_schema, parse_model_set, JsonFileSource, ModelLoader, ModelSource, StubSource};
