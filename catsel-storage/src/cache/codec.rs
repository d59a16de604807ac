//! Serialized form of a cached forest.
//!
//! Payloads are a JSON array of parent-linked nodes in pre-order (see
//! [`FlatNode`]), so payload nesting stays constant however deep the catalog
//! goes. An empty forest encodes as `[]`, so a stored payload is never empty;
//! an empty payload read back from a cache is a miss.

use catsel_core::{flatten_forest, unflatten_forest, CacheError, FlatNode, Forest};

/// Encode a forest for storage.
pub fn encode_forest(cache_id: &str, forest: &Forest) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(&flatten_forest(forest)).map_err(|e| CacheError::Serialization {
        cache_id: cache_id.to_string(),
        reason: e.to_string(),
    })
}

/// Decode a stored payload.
///
/// Returns `Ok(None)` for an empty payload (treated exactly like a miss) and
/// an error for a payload that is not a forest.
pub fn decode_forest(cache_id: &str, payload: &[u8]) -> Result<Option<Forest>, CacheError> {
    if payload.is_empty() {
        return Ok(None);
    }
    let flat: Vec<FlatNode> =
        serde_json::from_slice(payload).map_err(|e| CacheError::Deserialization {
            cache_id: cache_id.to_string(),
            reason: e.to_string(),
        })?;
    unflatten_forest(flat)
        .map(Some)
        .map_err(|position| CacheError::Deserialization {
            cache_id: cache_id.to_string(),
            reason: format!("node {} points at a later parent", position),
        })
}
