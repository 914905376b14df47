use crate::error::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A commit hook; receives the payload of the mutation being committed.
pub type HookFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Commit hooks attached to one mutation.
///
/// `will_commit` runs after the state change is applied and before the
/// optimistic overlay is cleared; `did_commit` runs after the clear.
#[derive(Clone, Default)]
pub struct Subscription {
    pub(crate) will_commit: Option<HookFn>,
    pub(crate) did_commit: Option<HookFn>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn will_commit<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.will_commit = Some(Arc::new(move |payload| hook(payload).boxed()));
        self
    }

    pub fn did_commit<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.did_commit = Some(Arc::new(move |payload| hook(payload).boxed()));
        self
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("will_commit", &self.will_commit.is_some())
            .field("did_commit", &self.did_commit.is_some())
            .finish()
    }
}

/// Subscriptions keyed by the mutation they follow.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionTable {
    entries: BTreeMap<String, Subscription>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, mutation: impl Into<String>, subscription: Subscription) -> Self {
        self.entries.insert(mutation.into(), subscription);
        self
    }

    pub fn get(&self, mutation: &str) -> Option<&Subscription> {
        self.entries.get(mutation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
