use super::engine::Engine;
use super::store::StoreState;
use crate::error::{Result, StoreError};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A mutation body: takes the payload, resolves once the state change is done.
pub type MutationFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// The mutation currently in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDispatch {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

/// Named mutation bodies, as handed to [`StoreConfig::mutations`](super::StoreConfig::mutations).
#[derive(Clone, Default)]
pub struct MutationTable {
    entries: BTreeMap<String, MutationFn>,
}

impl MutationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mutation. A later entry with the same name replaces the earlier one.
    pub fn with<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.entries
            .insert(name.into(), Arc::new(move |payload| body(payload).boxed()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, MutationFn> {
        self.entries
    }
}

impl fmt::Debug for MutationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// The callable side of a store: every configured mutation, by name.
pub struct Mutations<S: StoreState> {
    engine: Arc<Engine<S>>,
}

impl<S: StoreState> Mutations<S> {
    pub(crate) fn new(engine: Arc<Engine<S>>) -> Self {
        Self { engine }
    }

    /// Invoke a mutation by name.
    pub async fn call(&self, name: &str, payload: Value) -> Result<()> {
        self.engine.invoke(name, payload, 0).await
    }

    /// Invoke a mutation with a serializable payload.
    pub async fn dispatch<P: Serialize>(&self, name: &str, payload: P) -> Result<()> {
        let payload = serde_json::to_value(payload).map_err(StoreError::Shape)?;
        self.call(name, payload).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engine.has_mutation(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.engine.mutation_names()
    }
}

impl<S: StoreState> Clone for Mutations<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: StoreState> fmt::Debug for Mutations<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.engine.mutation_names()).finish()
    }
}
