//! Tagged cache for serialized category trees.
//!
//! # Keys
//!
//! [`CategoryTreeKey`] cannot be constructed without a store id, a filter and
//! the (optional) requesting user, so a cache id always covers every input
//! the tree depends on.
//!
//! # Invalidation
//!
//! There is no expiry. Entries are written with [`TREE_CACHE_TAGS`] and
//! removed when one of those tags is cleaned through [`TaggedCache::clean_tags`].
//!
//! # Example
//!
//! ```ignore
//! let key = CategoryTreeKey::new(store_id, &filter, current_user);
//! let payload = encode_forest(&key.cache_id(), &forest)?;
//! cache.save(&payload, &key.cache_id(), &TREE_CACHE_TAGS).await?;
//!
//! // Later, after a category is saved:
//! cache.clean_tags(&[CATEGORY_CACHE_TAG]).await?;
//! ```

pub mod codec;
pub mod configured;
pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod traits;

pub use codec::{decode_forest, encode_forest};
pub use configured::ConfiguredCache;
pub use key::{build_cache_id, digest_cache_id, CategoryTreeKey, CATEGORY_TREE_ID};
pub use lmdb_backend::{LmdbCacheError, LmdbTaggedCache};
pub use memory::InMemoryTaggedCache;
pub use traits::{
    CacheEntryInfo, CacheStats, TaggedCache, BLOCK_HTML_CACHE_TAG, CATEGORY_CACHE_TAG,
    TREE_CACHE_TAGS,
};
