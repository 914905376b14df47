//! Observable primitives.
//!
//! This module provides the building blocks the store is made of:
//! - Signals: broadcast registries of observer callbacks
//! - Observables: a value plus the signal that announces its updates

mod observable;
mod signal;

pub use observable::Observable;
pub use signal::{Signal, Unsubscribe, WatchGuard};
