//! The transaction protocol behind every store.
//!
//! A mutation call runs as:
//!
//! ```text
//! record dispatch -> open scope -> body (inside its own Call)
//!     transaction: snapshot (first write of the chain) -> apply
//!                  -> will_commit -> clear overlay -> did_commit
//! close scope
//! ```
//!
//! The dispatch, replay depth, snapshot and overlay a transaction works with
//! come from the [`Call`] its body runs under, never from the store, so
//! interleaved mutations stay apart. A mutation invoked from inside another
//! joins the outer one's chain and shares its snapshot and overlay. The
//! store-wide scope counter only drives [`Store::is_idle`](super::Store::is_idle)
//! and [`Store::pending`](super::Store::pending); it is closed by a drop
//! guard, so it also unwinds when a body or hook fails or the future is
//! dropped.

use super::context::{Call, Chain};
use super::mutation::{MutationDispatch, MutationFn};
use super::ops::{MutationOps, SubscriptionOps};
use super::store::{StoreConfig, StoreState};
use super::subscription::{Subscription, SubscriptionTable};
use crate::config::StoreOptions;
use crate::deep::deep_set;
use crate::error::{Result, StoreError};
use crate::signal::Observable;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn, Instrument};

pub(crate) struct Engine<S: StoreState> {
    pub(crate) value: Observable<S>,
    /// The most recently dispatched mutation, while any scope is open.
    pub(crate) dispatch: Observable<Option<MutationDispatch>>,
    initial_state: S,
    options: StoreOptions,
    mutations: BTreeMap<String, MutationFn>,
    subscriptions: SubscriptionTable,
    /// Open mutation scopes and transactions.
    depth: AtomicUsize,
}

impl<S: StoreState> Engine<S> {
    pub(crate) fn build(config: StoreConfig<S>) -> Arc<Self> {
        let StoreConfig {
            initial_state,
            mutations,
            subscriptions,
            options,
        } = config;

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let value = Observable::new(initial_state.clone());

            let subscriptions = subscriptions
                .map(|factory| factory(SubscriptionOps::new(value.clone(), weak.clone())))
                .unwrap_or_default();

            let mutations = mutations
                .map(|factory| factory(MutationOps::new(value.clone(), weak.clone())))
                .unwrap_or_default()
                .into_entries();

            debug!(
                mutations = mutations.len(),
                subscriptions = subscriptions.len(),
                "store created"
            );

            Engine {
                value,
                dispatch: Observable::new(None),
                initial_state,
                options,
                mutations,
                subscriptions,
                depth: AtomicUsize::new(0),
            }
        })
    }

    pub(crate) fn initial_state(&self) -> S {
        self.initial_state.clone()
    }

    pub(crate) fn has_mutation(&self, name: &str) -> bool {
        self.mutations.contains_key(name)
    }

    pub(crate) fn mutation_names(&self) -> Vec<String> {
        self.mutations.keys().cloned().collect()
    }

    fn subscription(&self, name: &str) -> Option<Subscription> {
        self.subscriptions.get(name).cloned()
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// The mutation call the current task is running for this store.
    pub(crate) fn current_call(&self) -> Option<Arc<Call<S>>> {
        Call::current(self.id())
    }

    fn open_scope(self: &Arc<Self>) -> ScopeGuard<S> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        ScopeGuard {
            engine: Arc::clone(self),
        }
    }

    fn close_scope(&self) {
        if self.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.dispatch.update(None);
            debug!("store idle");
        }
    }

    /// Run the mutation `name` with `payload`.
    ///
    /// `replays` is the forward depth this invocation is a replay at, 0 for
    /// a plain call. A call made from inside another mutation joins its chain
    /// and inherits its replay depth.
    pub(crate) async fn invoke(self: &Arc<Self>, name: &str, payload: Value, replays: usize) -> Result<()> {
        let body = self
            .mutations
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownMutation(name.to_string()))?;

        let parent = self.current_call();
        let dispatch = MutationDispatch {
            name: name.to_string(),
            payload: payload.clone(),
        };
        debug!(mutation = %dispatch.name, replays, nested = parent.is_some(), "mutation dispatched");
        self.dispatch.update(Some(dispatch.clone()));

        let call = Call {
            dispatch,
            replays: replays.max(parent.as_ref().map_or(0, |p| p.replays)),
            chain: parent
                .map(|p| Arc::clone(&p.chain))
                .unwrap_or_else(|| Arc::new(Chain::new())),
        };

        let _scope = self.open_scope();
        call.scope(self.id(), body(payload)).await
    }

    /// Apply one state change and run the commit hooks of the current call.
    pub(crate) async fn transaction<F>(self: &Arc<Self>, apply: F) -> Result<()>
    where
        F: FnOnce(S) -> Result<S> + Send,
    {
        let _scope = self.open_scope();
        let call = self.current_call();
        let span = tracing::debug_span!(
            "transaction",
            mutation = call.as_ref().map(|c| c.dispatch.name.as_str()).unwrap_or("<direct>")
        );

        async move {
            let chain = call
                .as_ref()
                .map(|c| Arc::clone(&c.chain))
                .unwrap_or_else(|| Arc::new(Chain::new()));
            if chain.capture(|| self.value.current()) {
                debug!("snapshot captured");
            }

            let replay = call.as_ref().map_or(false, |c| c.is_replay());
            let subscription = match (&call, replay) {
                (Some(call), false) => self.subscription(&call.dispatch.name),
                _ => None,
            };

            let next = apply(self.value.current())?;
            self.value.update(next);

            if replay {
                trace!("replay applied, commit hooks skipped");
                return Ok(());
            }

            let payload = call.map(|c| c.dispatch.payload.clone()).unwrap_or(Value::Null);
            if let Some(hook) = subscription.as_ref().and_then(|s| s.will_commit.clone()) {
                hook(payload.clone()).await?;
            }

            trace!("optimistic overlay cleared");
            chain.clear_overlay();

            if let Some(hook) = subscription.as_ref().and_then(|s| s.did_commit.clone()) {
                hook(payload).await?;
            }

            debug!("transaction committed");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Store a forwarded value and replay the current call's mutation.
    pub(crate) async fn forward(self: &Arc<Self>, key: &str, value: Value) -> Result<()> {
        let call = self.current_call().ok_or(StoreError::NoMutationInFlight)?;

        let depth = call.replays + 1;
        if depth > self.options.max_forward_depth {
            return Err(StoreError::ForwardDepthExceeded {
                name: call.dispatch.name.clone(),
                depth: self.options.max_forward_depth,
            });
        }

        let overlay = deep_set(Some(key), call.chain.overlay.current(), value);
        call.chain.overlay.update(overlay);

        debug!(mutation = %call.dispatch.name, key, depth, "replaying mutation with forwarded value");
        self.invoke(&call.dispatch.name, call.dispatch.payload.clone(), depth)
            .await
    }

    /// The current call's overlay, or `{}` outside a mutation.
    pub(crate) fn overlay(&self) -> Value {
        self.current_call()
            .map(|call| call.chain.overlay.current())
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    pub(crate) fn rollback(&self) {
        match self.current_call().and_then(|call| call.chain.snapshot()) {
            Some(snapshot) => {
                debug!("rolling back to snapshot");
                self.value.update(snapshot);
            }
            None => warn!("rollback requested with no snapshot held"),
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }
}

/// Closes a mutation scope when dropped.
struct ScopeGuard<S: StoreState> {
    engine: Arc<Engine<S>>,
}

impl<S: StoreState> Drop for ScopeGuard<S> {
    fn drop(&mut self) {
        self.engine.close_scope();
    }
}
