use crate::error::{Result, StoreError};
use crate::signal::WatchGuard;
use crate::store::{create_store, Mutations, Store, StoreConfig, StoreState};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Selector-based access to a store for a UI layer.
///
/// The hook owns one store. Every slice it hands out is a JSON deep copy,
/// so nothing the UI holds aliases store state.
pub struct StoreHook<S: StoreState = Value> {
    store: Store<S>,
}

impl<S: StoreState> StoreHook<S> {
    pub fn new(store: Store<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    /// The whole state and the mutations.
    pub fn use_store(&self) -> Result<(S, Mutations<S>)> {
        self.select(S::clone)
    }

    /// A selected slice of the state and the mutations.
    pub fn select<T, F>(&self, selector: F) -> Result<(T, Mutations<S>)>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&S) -> T,
    {
        let slice = self.store.read(|state| json_clone(&selector(state)))?;
        Ok((slice, self.store.mutations().clone()))
    }

    /// Mount a binding: deliver the selected slice now and after every
    /// state change, until the returned [`Binding`] is dropped.
    pub fn bind<T, F, C>(&self, selector: F, on_change: C) -> Result<Binding<S, T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T) + Send + Sync + 'static,
    {
        let (initial, mutations) = self.select(&selector)?;
        let selection = Arc::new(RwLock::new(initial));

        let latest = Arc::clone(&selection);
        let guard = self
            .store
            .subscribe(move |state: &S| match json_clone(&selector(state)) {
                Ok(slice) => {
                    *latest.write() = slice.clone();
                    on_change(&slice);
                }
                Err(err) => tracing::warn!(%err, "selected slice is not JSON-clean, skipped"),
            })
            .guard();

        Ok(Binding {
            selection,
            mutations,
            _guard: guard,
        })
    }
}

impl<S: StoreState> Clone for StoreHook<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

/// Build a store and wrap it in a [`StoreHook`].
pub fn create_store_hook<S: StoreState>(config: StoreConfig<S>) -> StoreHook<S> {
    StoreHook::new(create_store(config))
}

/// A mounted selection; unsubscribes from the store when dropped.
pub struct Binding<S: StoreState, T> {
    selection: Arc<RwLock<T>>,
    mutations: Mutations<S>,
    _guard: WatchGuard,
}

impl<S: StoreState, T: Clone> Binding<S, T> {
    /// The most recently delivered slice.
    pub fn selection(&self) -> T {
        self.selection.read().clone()
    }

    pub fn mutations(&self) -> &Mutations<S> {
        &self.mutations
    }

    /// Unmount explicitly; same as dropping the binding.
    pub fn unmount(self) {}
}

fn json_clone<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    let json = serde_json::to_value(value).map_err(StoreError::Shape)?;
    serde_json::from_value(json).map_err(StoreError::Shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MutationTable, SetParams};
    use futures::executor::block_on;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;

    fn friends_hook() -> StoreHook {
        create_store_hook(
            StoreConfig::new(json!({
                "current": {"nested": {"val1": 1, "val2": 2}},
                "friends": [{"id": 1, "name": "Alice"}]
            }))
            .mutations(|ops| {
                MutationTable::new().with("addFriend", move |friend| {
                    let ops = ops.clone();
                    async move {
                        let mut friends = ops.get()["friends"].as_array().cloned().unwrap_or_default();
                        friends.push(friend);
                        ops.set(SetParams::at("friends", Value::Array(friends))).await
                    }
                })
            }),
        )
    }

    #[test]
    fn use_store_returns_state_and_mutations() {
        let hook = friends_hook();
        let (state, mutations) = hook.use_store().unwrap();
        assert_eq!(state["current"]["nested"]["val1"], 1);
        assert!(mutations.contains("addFriend"));
    }

    #[test]
    fn binding_tracks_selected_slice() {
        let hook = friends_hook();
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let deliveries_clone = Arc::clone(&deliveries);

        let binding = hook
            .bind(
                |state: &Value| state["friends"].as_array().map_or(0, Vec::len),
                move |count: &usize| deliveries_clone.lock().push(*count),
            )
            .unwrap();
        assert_eq!(binding.selection(), 1);

        block_on(
            binding
                .mutations()
                .call("addFriend", json!({"id": 2, "name": "Bob"})),
        )
        .unwrap();

        assert_eq!(binding.selection(), 2);
        assert_eq!(deliveries.lock().last(), Some(&2));
    }

    #[test]
    fn unmount_stops_delivery() {
        let hook = friends_hook();
        let deliveries = Arc::new(Mutex::new(0usize));
        let deliveries_clone = Arc::clone(&deliveries);

        let binding = hook
            .bind(
                |state: &Value| state["friends"].clone(),
                move |_: &Value| *deliveries_clone.lock() += 1,
            )
            .unwrap();
        binding.unmount();

        block_on(hook.store().mutations().call("addFriend", json!({"id": 3}))).unwrap();
        assert_eq!(*deliveries.lock(), 0);
    }

    #[test]
    fn non_json_slice_is_rejected() {
        let hook = friends_hook();
        let result = hook.select(|_| {
            let mut map = HashMap::new();
            map.insert(vec![1u8], 1);
            map
        });
        assert!(matches!(result, Err(StoreError::Shape(_))));
    }
}
