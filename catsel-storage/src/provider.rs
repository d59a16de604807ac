//! Read-through provider for category trees.
//!
//! Resolves which categories a filter makes visible, builds the option forest
//! from the category source and keeps it in a [`TaggedCache`] keyed by
//! [`CategoryTreeKey`].

use std::sync::Arc;

use catsel_core::{
    AdminUser, CategoryTreeBuilder, CatselConfig, CatselResult, Forest, NameFilter, StoreId,
    VisibilitySet,
};

use crate::cache::{
    decode_forest, encode_forest, CategoryTreeKey, TaggedCache, BLOCK_HTML_CACHE_TAG,
    CATEGORY_CACHE_TAG, TREE_CACHE_TAGS,
};
use crate::source::CategorySource;

/// Cached category tree retrieval.
///
/// # Type Parameters
///
/// - `S`: the category source queried on a miss
/// - `C`: the tagged cache holding serialized forests
///
/// # Example
///
/// ```ignore
/// let provider = CategoryTreeProvider::with_defaults(source, cache);
///
/// // Anonymous request for everything named like "red".
/// let forest = provider.get_categories_tree(store_id, Some("red"), None).await?;
///
/// // After a category is saved elsewhere:
/// provider.invalidate_categories().await?;
/// ```
pub struct CategoryTreeProvider<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    source: Arc<S>,
    cache: Arc<C>,
    config: CatselConfig,
}

impl<S, C> CategoryTreeProvider<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    pub fn new(source: Arc<S>, cache: Arc<C>, config: CatselConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// Create a provider with default configuration.
    pub fn with_defaults(source: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(source, cache, CatselConfig::default())
    }

    pub fn config(&self) -> &CatselConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Ids that must appear in the tree for `filter`: every match plus every
    /// ancestor on its path. The root is never part of the set.
    pub async fn resolve_shown_ids(
        &self,
        store_id: StoreId,
        filter: &NameFilter,
    ) -> CatselResult<VisibilitySet> {
        let matches = self.source.find_by_name(store_id, filter).await?;
        let shown = VisibilitySet::from_paths(&matches);
        tracing::debug!(
            store_id,
            filter = filter.raw(),
            matched = matches.len(),
            shown = shown.len(),
            "Resolved visible categories"
        );
        Ok(shown)
    }

    /// Build the forest for `shown_ids` with store-scoped names and flags.
    ///
    /// Returns `None` when nothing hangs under the root.
    pub async fn build_tree(
        &self,
        store_id: StoreId,
        shown_ids: &VisibilitySet,
    ) -> CatselResult<Option<Forest>> {
        if shown_ids.is_empty() {
            return Ok(None);
        }

        let records = self.source.fetch_by_ids(store_id, shown_ids).await?;
        let builder = CategoryTreeBuilder::from_records(&records);
        tracing::debug!(
            store_id,
            requested = shown_ids.len(),
            fetched = builder.record_count(),
            "Built category tree"
        );
        Ok(builder.into_forest())
    }

    /// The option forest for a store and filter, as seen by `current_user`.
    ///
    /// A cached forest is returned without touching the source. On a miss the
    /// forest is rebuilt and written back with [`TREE_CACHE_TAGS`]. Cache
    /// failures never fail the call: a read failure is a miss and a write
    /// failure is logged.
    pub async fn get_categories_tree(
        &self,
        store_id: StoreId,
        filter: Option<&str>,
        current_user: Option<&AdminUser>,
    ) -> CatselResult<Forest> {
        let filter = NameFilter::new(filter);

        if !self.config.cache_enabled {
            return self.rebuild(store_id, &filter).await;
        }

        let key = CategoryTreeKey::new(store_id, &filter, current_user);
        let cache_id = key.cache_id();

        if let Some(forest) = self.load_cached(&cache_id).await {
            tracing::debug!(cache_id = %cache_id, store_id, "Category tree cache hit");
            return Ok(forest);
        }
        tracing::debug!(cache_id = %cache_id, store_id, "Category tree cache miss");

        let forest = self.rebuild(store_id, &filter).await?;
        self.store(&key, &cache_id, &forest).await;
        Ok(forest)
    }

    /// Drop every cached tree derived from category data.
    pub async fn invalidate_categories(&self) -> CatselResult<u64> {
        let removed = self.cache.clean_tags(&[CATEGORY_CACHE_TAG]).await?;
        tracing::info!(tag = CATEGORY_CACHE_TAG, removed, "Invalidated category trees");
        Ok(removed)
    }

    /// Drop everything tagged for the page-fragment cache.
    pub async fn flush_block_cache(&self) -> CatselResult<u64> {
        let removed = self.cache.clean_tags(&[BLOCK_HTML_CACHE_TAG]).await?;
        tracing::info!(tag = BLOCK_HTML_CACHE_TAG, removed, "Flushed block cache");
        Ok(removed)
    }

    async fn rebuild(&self, store_id: StoreId, filter: &NameFilter) -> CatselResult<Forest> {
        let shown = self.resolve_shown_ids(store_id, filter).await?;
        Ok(self.build_tree(store_id, &shown).await?.unwrap_or_default())
    }

    async fn load_cached(&self, cache_id: &str) -> Option<Forest> {
        let payload = match self.cache.load(cache_id).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(cache_id, error = %e, "Category tree cache read failed");
                return None;
            }
        };

        match decode_forest(cache_id, &payload) {
            Ok(forest) => forest,
            Err(e) => {
                tracing::warn!(cache_id, error = %e, "Discarding undecodable category tree");
                None
            }
        }
    }

    async fn store(&self, key: &CategoryTreeKey, cache_id: &str, forest: &Forest) {
        let payload = match encode_forest(cache_id, forest) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(cache_id, error = %e, "Category tree not cacheable");
                return;
            }
        };

        match self.cache.save(&payload, cache_id, &TREE_CACHE_TAGS).await {
            Ok(()) => tracing::debug!(
                cache_id,
                digest = %key.digest_hex(),
                bytes = payload.len(),
                "Cached category tree"
            ),
            Err(e) => tracing::warn!(cache_id, error = %e, "Category tree cache write failed"),
        }
    }
}

impl<S, C> Clone for CategoryTreeProvider<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}
