//! The mutation call that a piece of async code is running under.
//!
//! Every mutation invocation runs its body inside a task-local [`Call`]. The
//! transactions, `forward` and `rollback` issued from that body (or from the
//! commit hooks it triggers) read the call instead of store-wide state, so
//! mutations interleaved on one executor never see each other's dispatch,
//! snapshot or overlay.

use super::mutation::MutationDispatch;
use crate::signal::Observable;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static CURRENT: Frame;
}

/// The task-local slot. `store` is the address of the owning engine, so a
/// body of one store calling into another store does not leak its call.
struct Frame {
    store: usize,
    call: Arc<dyn Any + Send + Sync>,
}

/// One mutation invocation.
pub(crate) struct Call<S> {
    pub(crate) dispatch: MutationDispatch,
    /// Nested `forward` replays this call runs under; 0 outside a replay.
    pub(crate) replays: usize,
    pub(crate) chain: Arc<Chain<S>>,
}

impl<S: Clone + Send + Sync + 'static> Call<S> {
    /// The call running on this task for the store at `store`, if any.
    pub(crate) fn current(store: usize) -> Option<Arc<Self>> {
        CURRENT
            .try_with(|frame| (frame.store == store).then(|| Arc::clone(&frame.call)))
            .ok()
            .flatten()
            .and_then(|call| call.downcast::<Self>().ok())
    }

    pub(crate) fn is_replay(&self) -> bool {
        self.replays > 0
    }

    /// Run `body` with this call as the current one.
    pub(crate) fn scope<F: Future>(self, store: usize, body: F) -> impl Future<Output = F::Output> {
        CURRENT.scope(
            Frame {
                store,
                call: Arc::new(self),
            },
            body,
        )
    }
}

/// State shared by a mutation and every call nested inside it: the first
/// mutation of the chain owns the snapshot.
pub(crate) struct Chain<S> {
    snapshot: Mutex<Option<S>>,
    pub(crate) overlay: Observable<Value>,
}

impl<S: Clone + Send + Sync + 'static> Chain<S> {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: Mutex::new(None),
            overlay: Observable::new(empty_overlay()),
        }
    }

    /// Take a snapshot unless one is already held. Returns whether it did.
    pub(crate) fn capture(&self, state: impl FnOnce() -> S) -> bool {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return false;
        }
        *snapshot = Some(state());
        true
    }

    pub(crate) fn snapshot(&self) -> Option<S> {
        self.snapshot.lock().clone()
    }

    pub(crate) fn clear_overlay(&self) {
        self.overlay.update(empty_overlay());
    }
}

fn empty_overlay() -> Value {
    Value::Object(Map::new())
}
