//! Category source trait and in-memory implementation.
//!
//! The catalog that owns category data is an external system. Everything in
//! this workspace reads it through [`CategorySource`], which exposes exactly
//! the two queries the tree needs.

use std::collections::HashMap;

use async_trait::async_trait;
use catsel_core::{
    CategoryId, CategoryPath, CategoryRecord, CatselResult, NameFilter, StoreId, VisibilitySet,
    ADMIN_STORE_ID, ROOT_ID,
};
use tokio::sync::RwLock;

/// Read-only access to category records.
///
/// Implementations must resolve store-scoped values (name, active flag) for
/// the requested store, falling back to the global values.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Categories whose store-scoped name matches `filter`, root excluded.
    ///
    /// An empty filter matches every category.
    async fn find_by_name(
        &self,
        store_id: StoreId,
        filter: &NameFilter,
    ) -> CatselResult<Vec<CategoryPath>>;

    /// Records for every id in `ids` that exists, in the source's natural
    /// order.
    async fn fetch_by_ids(
        &self,
        store_id: StoreId,
        ids: &VisibilitySet,
    ) -> CatselResult<Vec<CategoryRecord>>;
}

/// Store-specific values layered over a category's global values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOverride {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl StoreOverride {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_active: None,
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            name: None,
            is_active: Some(is_active),
        }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    /// Global records in insertion order; this is the discovery order.
    records: Vec<CategoryRecord>,
    overrides: HashMap<(StoreId, CategoryId), StoreOverride>,
}

impl CatalogState {
    fn resolve(&self, store_id: StoreId, record: &CategoryRecord) -> CategoryRecord {
        let mut resolved = record.clone();
        if store_id == ADMIN_STORE_ID {
            return resolved;
        }
        if let Some(scoped) = self.overrides.get(&(store_id, record.id)) {
            if let Some(name) = &scoped.name {
                resolved.name = name.clone();
            }
            if let Some(is_active) = scoped.is_active {
                resolved.is_active = is_active;
            }
        }
        resolved
    }
}

/// Category source backed by process memory.
///
/// Uses `tokio::sync::RwLock` for safe async access. Intended for tests and
/// for embedding a catalog snapshot.
#[derive(Debug, Default)]
pub struct InMemoryCategorySource {
    state: RwLock<CatalogState>,
}

impl InMemoryCategorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-loaded with global records.
    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                records,
                overrides: HashMap::new(),
            }),
        }
    }

    /// Insert or replace a record. Replacing keeps the original position.
    pub async fn upsert(&self, record: CategoryRecord) {
        let mut state = self.state.write().await;
        match state.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => state.records.push(record),
        }
    }

    /// Remove a record and its store overrides.
    pub async fn remove(&self, id: CategoryId) -> bool {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        state.overrides.retain(|(_, category), _| *category != id);
        state.records.len() != before
    }

    /// Set store-scoped values for a category.
    pub async fn set_store_override(
        &self,
        store_id: StoreId,
        id: CategoryId,
        scoped: StoreOverride,
    ) {
        self.state
            .write()
            .await
            .overrides
            .insert((store_id, id), scoped);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}

#[async_trait]
impl CategorySource for InMemoryCategorySource {
    async fn find_by_name(
        &self,
        store_id: StoreId,
        filter: &NameFilter,
    ) -> CatselResult<Vec<CategoryPath>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| r.id != ROOT_ID)
            .map(|r| state.resolve(store_id, r))
            .filter(|r| filter.matches(&r.name))
            .map(|r| r.to_path())
            .collect())
    }

    async fn fetch_by_ids(
        &self,
        store_id: StoreId,
        ids: &VisibilitySet,
    ) -> CatselResult<Vec<CategoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| ids.contains(r.id))
            .map(|r| state.resolve(store_id, r))
            .collect())
    }
}
