//! # Optimist
//!
//! An observable state store with deep merge/set mutations and an optimistic
//! commit/rollback protocol.
//!
//! Optimist provides two levels of abstraction for managing state:
//!
//! ## Observables (Low-level primitives)
//!
//! - `Signal<T>` - Broadcast registry of observer callbacks
//! - `Observable<T>` - A value that announces every update to its watchers
//! - `deep_merge` / `deep_set` - Recursive patching of JSON values
//!
//! ## Store (High-level state management)
//!
//! - `Store<S>` - State container with named mutations
//! - Transactions with snapshot, `will_commit`/`did_commit` hooks and rollback
//! - Optimistic values that are replaced once the real value is forwarded
//! - `StoreHook<S>` - Selector bindings for UI layers

pub mod config;
pub mod deep;
pub mod error;
pub mod hook;
pub mod signal;
pub mod store;

// Re-export main types for convenience
pub use config::StoreOptions;
pub use deep::{deep_merge, deep_set};
pub use error::{Result, StoreError};
pub use hook::{create_store_hook, Binding, StoreHook};
pub use signal::{Observable, Signal, Unsubscribe, WatchGuard};
pub use store::{
    create_store, MutationDispatch, MutationOps, MutationTable, Mutations, SetParams, Store, StoreConfig,
    StoreState, Subscription, SubscriptionOps, SubscriptionTable,
};
