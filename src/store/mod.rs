//! Stores: observable state plus named, transactional mutations.
//!
//! A store is configured with an initial state, a table of mutations built
//! from [`MutationOps`], and optionally a table of commit hooks built from
//! [`SubscriptionOps`]. Every `set`, `merge` and `reset` issued by a mutation
//! runs inside a transaction that snapshots the state, applies the change,
//! and runs the mutation's `will_commit`/`did_commit` hooks around the
//! clearing of the optimistic overlay.

mod context;
mod engine;
mod mutation;
mod ops;
mod store;
mod subscription;

pub use mutation::{MutationDispatch, MutationFn, MutationTable, Mutations};
pub use ops::{MutationOps, SetParams, SubscriptionOps};
pub use store::{create_store, Store, StoreConfig, StoreState};
pub use subscription::{HookFn, Subscription, SubscriptionTable};
