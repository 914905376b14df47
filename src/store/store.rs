use super::engine::Engine;
use super::mutation::{MutationDispatch, MutationTable, Mutations};
use super::ops::{MutationOps, SubscriptionOps};
use super::subscription::SubscriptionTable;
use crate::config::StoreOptions;
use crate::error::{Result, StoreError};
use crate::signal::Unsubscribe;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// State types a store can hold.
///
/// Path-based `set` and `merge` work on the JSON form of the state, so the
/// state has to round-trip through `serde_json`.
pub trait StoreState: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreState for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

type MutationsFactory<S> = Box<dyn FnOnce(MutationOps<S>) -> MutationTable + Send>;
type SubscriptionsFactory<S> = Box<dyn FnOnce(SubscriptionOps<S>) -> SubscriptionTable + Send>;

/// Everything needed to build a [`Store`].
pub struct StoreConfig<S: StoreState = Value> {
    pub(crate) initial_state: S,
    pub(crate) mutations: Option<MutationsFactory<S>>,
    pub(crate) subscriptions: Option<SubscriptionsFactory<S>>,
    pub(crate) options: StoreOptions,
}

impl<S: StoreState> StoreConfig<S> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            mutations: None,
            subscriptions: None,
            options: StoreOptions::default(),
        }
    }

    /// Parse the initial state from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(StoreError::InvalidJson)?;
        let initial_state = serde_json::from_value(value).map_err(StoreError::Shape)?;
        Ok(Self::new(initial_state))
    }

    /// Build the mutation table from the mutation operations.
    pub fn mutations<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(MutationOps<S>) -> MutationTable + Send + 'static,
    {
        self.mutations = Some(Box::new(factory));
        self
    }

    /// Build the commit hooks from the subscription operations.
    pub fn subscriptions<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(SubscriptionOps<S>) -> SubscriptionTable + Send + 'static,
    {
        self.subscriptions = Some(Box::new(factory));
        self
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }
}

/// An observable state container with named, transactional mutations.
///
/// `Store` is a cheap handle; clones share the same state.
///
/// # Examples
///
/// ```
/// use optimist::{create_store, MutationTable, SetParams, StoreConfig};
/// use serde_json::json;
///
/// let store = create_store(StoreConfig::new(json!({"count": 0})).mutations(|ops| {
///     MutationTable::new().with("inc", move |_| {
///         let ops = ops.clone();
///         async move {
///             let count = ops.get()["count"].as_i64().unwrap_or(0);
///             ops.set(SetParams::at("count", json!(count + 1))).await
///         }
///     })
/// }));
///
/// futures::executor::block_on(store.mutations().call("inc", json!(null))).unwrap();
/// assert_eq!(store.current()["count"], 1);
/// ```
pub struct Store<S: StoreState = Value> {
    engine: Arc<Engine<S>>,
    mutations: Mutations<S>,
}

impl<S: StoreState> Store<S> {
    /// Create a store from its configuration.
    pub fn new(config: StoreConfig<S>) -> Self {
        let engine = Engine::build(config);
        let mutations = Mutations::new(Arc::clone(&engine));
        Self { engine, mutations }
    }

    /// Get a clone of the current state.
    pub fn current(&self) -> S {
        self.engine.value.current()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        self.engine.value.with(f)
    }

    /// Subscribe to state changes.
    ///
    /// The callback runs on every state write, including writes that leave
    /// the value unchanged and rollbacks.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.engine.value.watch(callback)
    }

    /// The store's mutations.
    pub fn mutations(&self) -> &Mutations<S> {
        &self.mutations
    }

    /// The most recently dispatched mutation while any mutation is running.
    pub fn pending(&self) -> Option<MutationDispatch> {
        self.engine.dispatch.current()
    }

    /// Whether no mutation or transaction is open.
    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }
}

impl<S: StoreState> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            mutations: self.mutations.clone(),
        }
    }
}

impl<S: StoreState + fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.current())
            .field("mutations", &self.mutations)
            .finish()
    }
}

/// Create a store from its configuration.
pub fn create_store<S: StoreState>(config: StoreConfig<S>) -> Store<S> {
    Store::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SetParams, Subscription};
    use futures::executor::block_on;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct AppState {
        count: usize,
        name: String,
    }

    fn counter_store() -> Store<AppState> {
        create_store(
            StoreConfig::new(AppState {
                count: 0,
                name: "test".to_string(),
            })
            .mutations(|ops| {
                let inc = ops.clone();
                let rename = ops.clone();
                let reset = ops;
                MutationTable::new()
                    .with("inc", move |_| {
                        let ops = inc.clone();
                        async move {
                            let count = ops.get().count;
                            ops.set(SetParams::at("count", json!(count + 1))).await
                        }
                    })
                    .with("rename", move |payload| {
                        let ops = rename.clone();
                        async move { ops.merge(json!({ "name": payload })).await }
                    })
                    .with("reset", move |_| {
                        let ops = reset.clone();
                        async move { ops.reset().await }
                    })
            }),
        )
    }

    #[test]
    fn store_get_set() {
        let store = counter_store();
        assert_eq!(store.current().count, 0);

        block_on(store.mutations().call("inc", Value::Null)).unwrap();
        block_on(store.mutations().call("rename", json!("updated"))).unwrap();

        assert_eq!(store.current().count, 1);
        assert_eq!(store.current().name, "updated");
        assert!(store.is_idle());
        assert!(store.pending().is_none());
    }

    #[test]
    fn store_reset() {
        let store = counter_store();
        block_on(store.mutations().call("inc", Value::Null)).unwrap();
        block_on(store.mutations().call("reset", Value::Null)).unwrap();
        assert_eq!(store.current().count, 0);
    }

    #[test]
    fn store_subscribe() {
        let store = counter_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let handle = store.subscribe(move |state: &AppState| seen_clone.lock().push(state.count));

        block_on(store.mutations().call("inc", Value::Null)).unwrap();
        block_on(store.mutations().call("inc", Value::Null)).unwrap();
        handle.unsubscribe();
        block_on(store.mutations().call("inc", Value::Null)).unwrap();

        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn shape_mismatch_leaves_state_untouched() {
        let store = create_store(StoreConfig::new(AppState {
            count: 0,
            name: "test".to_string(),
        })
        .mutations(|ops| {
            MutationTable::new().with("break", move |_| {
                let ops = ops.clone();
                async move { ops.set(SetParams::at("count", json!("many"))).await }
            })
        }));

        let err = block_on(store.mutations().call("break", Value::Null)).unwrap_err();
        assert!(matches!(err, StoreError::Shape(_)));
        assert_eq!(store.current().count, 0);
        assert!(store.is_idle());
    }

    #[test]
    fn unknown_mutation_is_reported() {
        let store = counter_store();
        let err = block_on(store.mutations().call("missing", Value::Null)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownMutation(name) if name == "missing"));
        assert!(store.mutations().contains("inc"));
        assert_eq!(store.mutations().names(), vec!["inc", "rename", "reset"]);
    }

    #[test]
    fn from_json_validates_input() {
        let config = StoreConfig::<Value>::from_json(r#"{"count": 1}"#).unwrap();
        assert_eq!(create_store(config).current(), json!({"count": 1}));

        assert!(matches!(
            StoreConfig::<Value>::from_json("{count: 1}"),
            Err(StoreError::InvalidJson(_))
        ));
        assert!(matches!(
            StoreConfig::<AppState>::from_json(r#"{"count": "x"}"#),
            Err(StoreError::Shape(_))
        ));
    }

    #[test]
    fn subscriptions_without_mutation_are_inert() {
        let store: Store = create_store(
            StoreConfig::new(json!({}))
                .subscriptions(|_| SubscriptionTable::new().on("nothing", Subscription::new())),
        );
        assert!(store.mutations().names().is_empty());
        assert!(store.is_idle());
    }
}
