//! Store tuning options.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Options applied to a single store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Maximum nesting of `forward` replays before giving up.
    #[serde(default = "default_max_forward_depth")]
    pub max_forward_depth: usize,
}

fn default_max_forward_depth() -> usize {
    8
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_forward_depth: default_max_forward_depth(),
        }
    }
}

impl StoreOptions {
    /// Parse options from a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(StoreError::InvalidJson)
    }

    pub fn with_max_forward_depth(mut self, depth: usize) -> Self {
        self.max_forward_depth = depth;
        self
    }
}
