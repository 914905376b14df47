use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalInner<T> {
    next_id: AtomicUsize,
    observers: Mutex<BTreeMap<usize, Observer<T>>>,
}

/// A broadcast registry that pushes values to every registered observer.
///
/// Signals hold no value of their own; see [`Observable`](super::Observable)
/// for the value-carrying wrapper.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no observers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                next_id: AtomicUsize::new(0),
                observers: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Register an observer.
    ///
    /// The returned handle removes exactly this observer when
    /// [`Unsubscribe::unsubscribe`] is called.
    pub fn observe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.observers.lock().insert(id, Arc::new(callback));

        let registry: Weak<SignalInner<T>> = Arc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.observers.lock().remove(&id);
            }
        })
    }

    /// Deliver `value` to every observer registered at the time of the call.
    ///
    /// A panicking observer is logged and skipped; the rest still run.
    pub fn emit(&self, value: &T) {
        // Snapshot the observers so callbacks may (un)subscribe re-entrantly.
        let observers: Vec<(usize, Observer<T>)> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        for (id, callback) in observers {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::error!(observer = id, "signal observer panicked");
            }
        }
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handle returned by [`Signal::observe`] and every `watch`/`subscribe` built on it.
///
/// Dropping the handle keeps the observer registered; call
/// [`unsubscribe`](Self::unsubscribe) or convert it with [`guard`](Self::guard).
pub struct Unsubscribe {
    remove: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Unsubscribe {
    fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Mutex::new(Some(Box::new(remove))),
        }
    }

    /// Remove the observer. Later calls do nothing.
    pub fn unsubscribe(&self) {
        let remove = self.remove.lock().take();
        if let Some(remove) = remove {
            remove();
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has already run.
    pub fn is_unsubscribed(&self) -> bool {
        self.remove.lock().is_none()
    }

    /// Turn this handle into an RAII guard that unsubscribes on drop.
    pub fn guard(self) -> WatchGuard {
        WatchGuard { handle: self }
    }
}

/// RAII guard for signal watchers.
pub struct WatchGuard {
    handle: Unsubscribe,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}
