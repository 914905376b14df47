//! Selector binding for UI layers.
//!
//! A UI component mounts a [`Binding`] on render setup, reads
//! [`Binding::selection`], and drops the binding on teardown.

mod hook;

pub use hook::{create_store_hook, Binding, StoreHook};
