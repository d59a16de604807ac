//! Tagged cache trait and statistics.
//!
//! Cached trees are never expired by time. Every entry is written with a set
//! of tags, and whoever observes a change to tagged data cleans the tag,
//! dropping every entry that carries it.

use async_trait::async_trait;
use catsel_core::CatselResult;
use chrono::{DateTime, Utc};

/// Tag carried by everything derived from category data.
pub const CATEGORY_CACHE_TAG: &str = "catalog_category";

/// Tag carried by everything in the page-fragment (block HTML) cache.
pub const BLOCK_HTML_CACHE_TAG: &str = "BLOCK_HTML";

/// The tags every category tree entry is written with.
pub const TREE_CACHE_TAGS: [&str; 2] = [CATEGORY_CACHE_TAG, BLOCK_HTML_CACHE_TAG];

/// A string-keyed byte cache with tag-based invalidation.
///
/// Implementations must be safe for concurrent use. Concurrent saves of the
/// same id are allowed; the last one wins.
#[async_trait]
pub trait TaggedCache: Send + Sync {
    /// Read the payload stored under `cache_id`.
    async fn load(&self, cache_id: &str) -> CatselResult<Option<Vec<u8>>>;

    /// Store `data` under `cache_id` with `tags`, replacing any previous
    /// entry and its tags.
    async fn save(&self, data: &[u8], cache_id: &str, tags: &[&str]) -> CatselResult<()>;

    /// Remove one entry. Returns whether it existed.
    async fn remove(&self, cache_id: &str) -> CatselResult<bool>;

    /// Remove every entry carrying at least one of `tags`.
    async fn clean_tags(&self, tags: &[&str]) -> CatselResult<u64>;

    /// Metadata about one entry, without counting as a hit or miss.
    async fn inspect(&self, cache_id: &str) -> CatselResult<Option<CacheEntryInfo>>;

    /// Get cache statistics.
    async fn stats(&self) -> CatselResult<CacheStats>;
}

/// Metadata about a stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub tags: Vec<String>,
    pub cached_at: DateTime<Utc>,
    pub size_bytes: usize,
}

impl CacheEntryInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Approximate payload bytes held.
    pub memory_bytes: u64,
    /// Number of entries removed by tag cleaning.
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Deduplicated owned copy of a tag list, in first-seen order.
pub(crate) fn normalize_tags(tags: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.iter().any(|t| t == tag) {
            out.push((*tag).to_string());
        }
    }
    out
}
