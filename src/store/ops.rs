use super::engine::Engine;
use super::store::StoreState;
use crate::deep::{deep_get, deep_merge, deep_set};
use crate::error::{Result, StoreError};
use crate::signal::Observable;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Weak;

/// Arguments of [`MutationOps::set`]: an optional dot-path and the value to put there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetParams {
    #[serde(default)]
    pub path: Option<String>,
    pub value: Value,
}

impl SetParams {
    /// Assign `value` at `path`.
    pub fn at(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: Some(path.into()),
            value,
        }
    }

    /// Replace the whole state.
    pub fn root(value: Value) -> Self {
        Self { path: None, value }
    }
}

/// Operations available to mutation bodies.
pub struct MutationOps<S: StoreState> {
    value: Observable<S>,
    engine: Weak<Engine<S>>,
}

impl<S: StoreState> MutationOps<S> {
    pub(crate) fn new(value: Observable<S>, engine: Weak<Engine<S>>) -> Self {
        Self { value, engine }
    }

    /// Current state.
    pub fn get(&self) -> S {
        self.value.current()
    }

    /// Assign a value at a dot-path (or replace the state) in one transaction.
    ///
    /// Every write is its own transaction, so a body that writes twice runs
    /// the mutation's `will_commit`/`did_commit` hooks twice. The snapshot is
    /// still the state from before the first write.
    ///
    /// A path that runs into an array or a primitive leaves the state as it
    /// was; the transaction still commits.
    pub fn set(&self, params: SetParams) -> impl Future<Output = Result<()>> + Send + 'static {
        let engine = self.engine.clone();
        async move {
            let engine = engine.upgrade().ok_or(StoreError::StoreDropped)?;
            engine
                .transaction(move |state| {
                    let current = to_json(&state)?;
                    from_json(deep_set(params.path.as_deref(), current, params.value))
                })
                .await
        }
    }

    /// Deep-merge a partial state in one transaction.
    pub fn merge(&self, patch: Value) -> impl Future<Output = Result<()>> + Send + 'static {
        let engine = self.engine.clone();
        async move {
            let engine = engine.upgrade().ok_or(StoreError::StoreDropped)?;
            engine
                .transaction(move |state| {
                    let current = to_json(&state)?;
                    from_json(deep_merge(current, &patch))
                })
                .await
        }
    }

    /// Restore the initial state in one transaction.
    pub fn reset(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let engine = self.engine.clone();
        async move {
            let engine = engine.upgrade().ok_or(StoreError::StoreDropped)?;
            let initial = engine.initial_state();
            engine.transaction(move |_| Ok(initial)).await
        }
    }

    /// Invoke another mutation of this store from inside a body.
    ///
    /// The nested mutation runs its own hooks with its own payload but shares
    /// the caller's snapshot, so a rollback restores the state from before
    /// the outermost mutation.
    pub fn call(&self, name: &str, payload: Value) -> impl Future<Output = Result<()>> + Send + 'static {
        let name = name.to_string();
        let engine = self.engine.clone();
        async move {
            let engine = engine.upgrade().ok_or(StoreError::StoreDropped)?;
            engine.invoke(&name, payload, 0).await
        }
    }

    /// The value forwarded for `key` during the current mutation, or `fallback`.
    ///
    /// A forwarded value that is `null` or does not deserialize into `T`
    /// counts as absent.
    pub fn optimistic<T>(&self, key: &str, fallback: T) -> T
    where
        T: DeserializeOwned,
    {
        let overlay = match self.engine.upgrade() {
            Some(engine) => engine.overlay(),
            None => return fallback,
        };
        let forwarded = deep_get(Some(key), &overlay).filter(|v| !v.is_null()).cloned();

        match forwarded {
            Some(value) => match serde_json::from_value(value) {
                Ok(typed) => typed,
                Err(err) => {
                    tracing::debug!(key, %err, "forwarded value has the wrong shape, using fallback");
                    fallback
                }
            },
            None => fallback,
        }
    }
}

impl<S: StoreState> Clone for MutationOps<S> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            engine: self.engine.clone(),
        }
    }
}

/// Operations available to subscription hooks.
pub struct SubscriptionOps<S: StoreState> {
    value: Observable<S>,
    engine: Weak<Engine<S>>,
}

impl<S: StoreState> SubscriptionOps<S> {
    pub(crate) fn new(value: Observable<S>, engine: Weak<Engine<S>>) -> Self {
        Self { value, engine }
    }

    /// Current state.
    pub fn get(&self) -> S {
        self.value.current()
    }

    /// The current mutation's optimistic overlay; `{}` outside a mutation.
    pub fn forwarded(&self) -> Value {
        self.engine
            .upgrade()
            .map(|engine| engine.overlay())
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// Record the authoritative value for `key` and replay the mutation
    /// being committed so it can pick the value up through
    /// [`MutationOps::optimistic`]. Only the replay skips commit hooks;
    /// other mutations running at the same time are unaffected.
    pub fn forward(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send + 'static {
        let key = key.to_string();
        let engine = self.engine.clone();
        async move {
            let engine = engine.upgrade().ok_or(StoreError::StoreDropped)?;
            engine.forward(&key, value).await
        }
    }

    /// Put the state back to what it was before the outermost mutation of
    /// the current call chain.
    pub fn rollback(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.rollback();
        }
    }
}

impl<S: StoreState> Clone for SubscriptionOps<S> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            engine: self.engine.clone(),
        }
    }
}

fn to_json<S: Serialize>(state: &S) -> Result<Value> {
    serde_json::to_value(state).map_err(StoreError::Shape)
}

fn from_json<S: DeserializeOwned>(value: Value) -> Result<S> {
    serde_json::from_value(value).map_err(StoreError::Shape)
}
