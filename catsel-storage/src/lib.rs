//! catsel Storage - Category Sources, Tree Caches and the Tree Provider
//!
//! Defines the read-only category source abstraction, the tagged cache that
//! stores serialized option trees, and [`CategoryTreeProvider`], which
//! composes the two into the read-through `get_categories_tree` operation.

pub mod cache;
pub mod provider;
pub mod source;

pub use cache::{
    build_cache_id, decode_forest, digest_cache_id, encode_forest, CacheEntryInfo, CacheStats,
    CategoryTreeKey, ConfiguredCache, InMemoryTaggedCache, LmdbCacheError, LmdbTaggedCache,
    TaggedCache, BLOCK_HTML_CACHE_TAG, CATEGORY_CACHE_TAG, CATEGORY_TREE_ID, TREE_CACHE_TAGS,
};
pub use provider::CategoryTreeProvider;
pub use source::{CategorySource, InMemoryCategorySource, StoreOverride};
