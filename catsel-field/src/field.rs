//! The category-select field.

use std::sync::Arc;

use catsel_core::{AdminUser, CatselConfig, CatselResult, Forest, StoreId};
use catsel_storage::{CategorySource, CategoryTreeProvider, ConfiguredCache, TaggedCache};

use crate::component::{ComponentJsConfig, FieldSettings};
use crate::error::FieldResult;

/// The form element a field is rendered for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldElement {
    pub html_id: String,
    /// Stored value: comma-separated category ids.
    pub value: Option<String>,
}

impl FieldElement {
    pub fn new(html_id: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            html_id: html_id.into(),
            value: value.map(str::to_string),
        }
    }
}

/// Admin field that offers the category tree as select options.
pub struct CategorySelectField<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    provider: CategoryTreeProvider<S, C>,
    settings: FieldSettings,
}

impl<S, C> CategorySelectField<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    pub fn new(provider: CategoryTreeProvider<S, C>, settings: FieldSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &CategoryTreeProvider<S, C> {
        &self.provider
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    /// The option forest for a store, optionally narrowed by a name filter.
    pub async fn get_categories_tree(
        &self,
        store_id: StoreId,
        filter: Option<&str>,
        current_user: Option<&AdminUser>,
    ) -> CatselResult<Forest> {
        self.provider
            .get_categories_tree(store_id, filter, current_user)
            .await
    }

    /// Widget configuration for `element`, with the unfiltered tree as
    /// options.
    pub async fn get_component_js_config(
        &self,
        element: &FieldElement,
        store_id: StoreId,
        current_user: Option<&AdminUser>,
    ) -> CatselResult<ComponentJsConfig> {
        let options = self
            .get_categories_tree(store_id, None, current_user)
            .await?;
        tracing::debug!(
            html_id = %element.html_id,
            store_id,
            options = options.len(),
            "Built category select config"
        );
        Ok(ComponentJsConfig::new(
            &self.settings,
            &element.html_id,
            element.value.as_deref(),
            options,
        ))
    }

    /// [`Self::get_component_js_config`] serialized for the UI layer.
    pub async fn component_js_json(
        &self,
        element: &FieldElement,
        store_id: StoreId,
        current_user: Option<&AdminUser>,
    ) -> FieldResult<String> {
        self.get_component_js_config(element, store_id, current_user)
            .await?
            .to_json()
    }
}

impl<S: CategorySource> CategorySelectField<S, ConfiguredCache> {
    /// Field over `source` with the cache backend `config` selects.
    pub fn from_config(
        source: Arc<S>,
        config: CatselConfig,
        settings: FieldSettings,
    ) -> CatselResult<Self> {
        let cache = ConfiguredCache::from_config(&config)?;
        tracing::info!(
            backend = cache.backend_name(),
            cache_enabled = config.cache_enabled,
            "Category select field ready"
        );
        let provider = CategoryTreeProvider::new(source, Arc::new(cache), config);
        Ok(Self::new(provider, settings))
    }
}

impl<S, C> Clone for CategorySelectField<S, C>
where
    S: CategorySource,
    C: TaggedCache,
{
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            settings: self.settings.clone(),
        }
    }
}
