//! Schema and model loading
//!
//! Model data arrives asynchronously from a [`ModelSource`]. A
//! [`ModelLoader`] issues exactly one fetch no matter how many callers ask;
//! everyone after the first gets the same result.

use anyhow::{Context, Result};
use simform_schema::{ResolvedSchema, SchemaDocument, SchemaError};
use simform_state::ModelSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Read and resolve a schema document from disk.
pub fn load_schema(path: &Path) -> Result<ResolvedSchema, SchemaError> {
    let document = SchemaDocument::from_path(path)?;
    ResolvedSchema::resolve(&document)
}

/// Parse a JSON object of `model name -> model object`.
pub fn parse_model_set(text: &str) -> Result<ModelSet> {
    serde_json::from_str(text).context("Model data must be a JSON object of model objects")
}

/// Somewhere model data can be fetched from.
pub trait ModelSource {
    fn fetch(&self) -> impl Future<Output = Result<ModelSet>> + Send;
}

/// Model data stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelSource for JsonFileSource {
    async fn fetch(&self) -> Result<ModelSet> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read model data: {}", self.path.display()))?;
        parse_model_set(&text).with_context(|| format!("Invalid model data: {}", self.path.display()))
    }
}

/// Fixed data delivered after a delay, standing in for a remote fetch.
#[derive(Debug, Clone, Default)]
pub struct StubSource {
    data: ModelSet,
    delay: Duration,
}

impl StubSource {
    pub fn new(data: ModelSet, delay: Duration) -> Self {
        Self { data, delay }
    }
}

impl ModelSource for StubSource {
    async fn fetch(&self) -> Result<ModelSet> {
        tokio::time::sleep(self.delay).await;
        Ok(self.data.clone())
    }
}

/// Fire-once wrapper around a [`ModelSource`].
///
/// A failed fetch leaves the loader empty, so a later `load` tries again.
#[derive(Debug)]
pub struct ModelLoader<S> {
    source: S,
    loaded: OnceCell<ModelSet>,
    fetches: AtomicUsize,
}

impl<S: ModelSource> ModelLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            loaded: OnceCell::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Fetch on first call; later and concurrent calls share that result.
    pub async fn load(&self) -> Result<&ModelSet> {
        self.loaded
            .get_or_try_init(|| async {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                let set = self.source.fetch().await?;
                tracing::info!(models = set.len(), "loaded model data");
                Ok::<_, anyhow::Error>(set)
            })
            .await
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// How many fetches have been started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}
