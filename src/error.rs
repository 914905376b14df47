//! Error types for the store engine.

use thiserror::Error;

/// Errors surfaced by store operations, mutations and subscription hooks.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown mutation: {0}")]
    UnknownMutation(String),

    #[error("forward called with no mutation in flight")]
    NoMutationInFlight,

    #[error("forward replay of `{name}` exceeded depth {depth}")]
    ForwardDepthExceeded { name: String, depth: usize },

    #[error("store has been dropped")]
    StoreDropped,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("state does not fit the store type: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Reject a mutation or hook with a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Wrap any error raised by user code.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
