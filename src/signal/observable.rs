use super::signal::{Signal, Unsubscribe};
use parking_lot::RwLock;
use std::sync::Arc;

/// A value holder that broadcasts every update to its watchers.
///
/// Cloning an `Observable` clones the handle; both clones share the value
/// and the watcher list.
pub struct Observable<T> {
    value: Arc<RwLock<T>>,
    signal: Signal<T>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Create an observable and immediately publish `initial`.
    ///
    /// The initial emission reaches nobody, but it keeps construction on the
    /// same path as every later [`update`](Self::update).
    pub fn new(initial: T) -> Self {
        let observable = Self {
            value: Arc::new(RwLock::new(initial.clone())),
            signal: Signal::new(),
        };
        observable.update(initial);
        observable
    }

    /// Store `value`, then emit it to all watchers.
    pub fn update(&self, value: T) {
        *self.value.write() = value.clone();
        self.signal.emit(&value);
    }

    /// Get a clone of the last value passed to [`update`](Self::update).
    pub fn current(&self) -> T {
        self.value.read().clone()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.value.read();
        f(&value)
    }

    /// Register a callback for every future update.
    pub fn watch<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.signal.observe(callback)
    }

    /// Number of active watchers.
    pub fn watcher_count(&self) -> usize {
        self.signal.observer_count()
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            signal: self.signal.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn current_returns_construction_value() {
        assert_eq!(Observable::new(7).current(), 7);
        assert_eq!(Observable::<Option<u8>>::new(None).current(), None);
    }

    #[test]
    fn watchers_see_updates_in_order() {
        let observable = Observable::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let _handle = observable.watch(move |v| seen_clone.lock().push(*v));

        observable.update(1);
        observable.update(2);
        observable.update(3);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(observable.current(), 3);
    }

    #[test]
    fn late_watcher_misses_earlier_updates() {
        let observable = Observable::new("a".to_string());
        observable.update("b".to_string());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _handle = observable.watch(move |v: &String| seen_clone.lock().push(v.clone()));

        assert!(seen.lock().is_empty());
        assert_eq!(observable.current(), "b");
    }

    #[test]
    fn watcher_can_read_current_during_emit() {
        let observable = Observable::new(1);
        let reader = observable.clone();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let _handle = observable.watch(move |_| {
            *seen_clone.lock() = Some(reader.current());
        });
        observable.update(5);

        assert_eq!(*seen.lock(), Some(5));
    }

    #[test]
    fn with_borrows_without_clone() {
        let observable = Observable::new(vec![1, 2, 3]);
        assert_eq!(observable.with(|v| v.len()), 3);
    }
}
