//! Opaque event metadata.
//!
//! Metadata is whatever JSON object the host application attaches to an
//! event. Nothing here inspects its shape; the only operation is the shallow
//! merge used to combine invocation-time and outcome-time fragments.

use serde_json::{Map, Value};

/// Arbitrary key-value annotation attached to an event.
pub type Metadata = Map<String, Value>;

/// Shallow union of two metadata fragments.
///
/// Keys from `overlay` replace keys from `base`. Nested objects are replaced
/// wholesale, never combined. Two absent fragments merge to an empty map.
pub fn merge(base: Option<&Metadata>, overlay: Option<&Metadata>) -> Metadata {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
