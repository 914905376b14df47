//! Deep object-path utilities over JSON values.
//!
//! Both operations degrade silently on malformed input and hand the source
//! back unchanged; [`try_deep_set`] is the strict variant.

mod merge;
mod probe;
mod set;

pub use merge::deep_merge;
pub use probe::{is_array, is_composite, is_json, is_object, is_string};
pub use set::{deep_get, deep_set, try_deep_set, PathError};
