//! catsel Test Utilities
//!
//! Shared test infrastructure for the catsel workspace:
//! - Instrumented and failing category sources and caches
//! - Proptest generators for catalogs, filters and users
//! - Catalog fixtures
//! - Tree assertions

pub use catsel_core::{
    AdminUser, CategoryId, CategoryPath, CategoryRecord, CatselError, CatselResult,
    DataAccessError, Forest, NameFilter, StorageError, StoreId, TreeNode, VisibilitySet,
    ADMIN_STORE_ID, ROOT_ID,
};
pub use catsel_storage::{
    CacheEntryInfo, CacheStats, CategorySource, InMemoryCategorySource, InMemoryTaggedCache,
    TaggedCache,
};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

// ============================================================================
// INSTRUMENTED COLLABORATORS
// ============================================================================

/// Wraps a category source and counts the queries made against it.
#[derive(Debug, Default)]
pub struct CountingCategorySource<S = InMemoryCategorySource> {
    inner: S,
    find_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl<S: CategorySource> CountingCategorySource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            find_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Total queries of either kind.
    pub fn total_calls(&self) -> usize {
        self.find_calls() + self.fetch_calls()
    }
}

impl CountingCategorySource<InMemoryCategorySource> {
    /// Counting source over an in-memory catalog.
    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        Self::new(InMemoryCategorySource::with_records(records))
    }
}

#[async_trait]
impl<S: CategorySource> CategorySource for CountingCategorySource<S> {
    async fn find_by_name(
        &self,
        store_id: StoreId,
        filter: &NameFilter,
    ) -> CatselResult<Vec<CategoryPath>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_name(store_id, filter).await
    }

    async fn fetch_by_ids(
        &self,
        store_id: StoreId,
        ids: &VisibilitySet,
    ) -> CatselResult<Vec<CategoryRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_by_ids(store_id, ids).await
    }
}

/// Category source whose every query fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingCategorySource {
    error: DataAccessError,
}

impl FailingCategorySource {
    pub fn new(error: DataAccessError) -> Self {
        Self { error }
    }

    /// A source that reports a query timeout.
    pub fn timeout() -> Self {
        Self::new(DataAccessError::Timeout { elapsed_ms: 5_000 })
    }
}

impl Default for FailingCategorySource {
    fn default() -> Self {
        Self::new(DataAccessError::Unavailable {
            reason: "catalog database unreachable".to_string(),
        })
    }
}

#[async_trait]
impl CategorySource for FailingCategorySource {
    async fn find_by_name(
        &self,
        _store_id: StoreId,
        _filter: &NameFilter,
    ) -> CatselResult<Vec<CategoryPath>> {
        Err(self.error.clone().into())
    }

    async fn fetch_by_ids(
        &self,
        _store_id: StoreId,
        _ids: &VisibilitySet,
    ) -> CatselResult<Vec<CategoryRecord>> {
        Err(self.error.clone().into())
    }
}

/// Tagged cache that fails every operation with a poisoned-lock error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCache;

#[async_trait]
impl TaggedCache for FailingCache {
    async fn load(&self, _cache_id: &str) -> CatselResult<Option<Vec<u8>>> {
        Err(StorageError::LockPoisoned.into())
    }

    async fn save(&self, _data: &[u8], _cache_id: &str, _tags: &[&str]) -> CatselResult<()> {
        Err(StorageError::LockPoisoned.into())
    }

    async fn remove(&self, _cache_id: &str) -> CatselResult<bool> {
        Err(StorageError::LockPoisoned.into())
    }

    async fn clean_tags(&self, _tags: &[&str]) -> CatselResult<u64> {
        Err(StorageError::LockPoisoned.into())
    }

    async fn inspect(&self, _cache_id: &str) -> CatselResult<Option<CacheEntryInfo>> {
        Err(StorageError::LockPoisoned.into())
    }

    async fn stats(&self) -> CatselResult<CacheStats> {
        Err(StorageError::LockPoisoned.into())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catsel inputs.

    use super::*;
    use proptest::prelude::*;
    use proptest::sample::Index;

    /// Words category names are assembled from, so generated filters hit.
    pub const NAME_WORDS: [&str; 8] = [
        "Shoes", "Red", "Hats", "Bags", "Sale", "Kids", "Winter", "Leather",
    ];

    pub fn arb_category_name() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(NAME_WORDS.to_vec()), 1..=2)
            .prop_map(|words| words.join(" "))
    }

    /// A well-formed catalog: the root record followed by up to `max_len`
    /// categories, each parented by the root or an earlier category, with a
    /// path consistent with its parent chain.
    pub fn arb_catalog(max_len: usize) -> impl Strategy<Value = Vec<CategoryRecord>> {
        prop::collection::vec(
            (any::<Index>(), arb_category_name(), any::<bool>()),
            0..=max_len,
        )
        .prop_map(|specs| {
            let mut records = vec![CategoryRecord::new(
                ROOT_ID,
                0,
                "Root Catalog",
                true,
                ROOT_ID.to_string(),
            )];
            for (offset, (parent_pick, name, is_active)) in specs.into_iter().enumerate() {
                let id = ROOT_ID + 1 + offset as CategoryId;
                let parent = &records[parent_pick.index(records.len())];
                let path = format!("{}/{}", parent.path, id);
                let parent_id = parent.id;
                records.push(CategoryRecord::new(id, parent_id, name, is_active, path));
            }
            records
        })
    }

    /// No filter, an empty filter, a word (in random case) or a random
    /// fragment.
    pub fn arb_filter() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            (prop::sample::select(NAME_WORDS.to_vec()), any::<bool>()).prop_map(
                |(word, upper)| Some(if upper {
                    word.to_uppercase()
                } else {
                    word.to_lowercase()
                })
            ),
            "[a-zA-Z _%]{1,3}".prop_map(Some),
        ]
    }

    /// Anonymous, or a signed-in user with a small numeric role.
    pub fn arb_user() -> impl Strategy<Value = Option<AdminUser>> {
        prop::option::of(("[a-z]{3,8}", "[0-9]{1,2}").prop_map(|(name, role)| {
            AdminUser::new(name, role)
        }))
    }

    pub fn arb_store_id() -> impl Strategy<Value = StoreId> {
        prop_oneof![Just(ADMIN_STORE_ID), 1u32..5]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Small catalogs with known trees.

    use super::*;

    pub fn root_record() -> CategoryRecord {
        CategoryRecord::new(ROOT_ID, 0, "Root Catalog", true, "1")
    }

    /// Root, Shoes, Red Shoes under Shoes, Hats.
    pub fn shoes_catalog() -> Vec<CategoryRecord> {
        vec![
            root_record(),
            CategoryRecord::new(2, ROOT_ID, "Shoes", true, "1/2"),
            CategoryRecord::new(3, 2, "Red Shoes", true, "1/2/3"),
            CategoryRecord::new(4, ROOT_ID, "Hats", true, "1/4"),
        ]
    }

    /// Root and a single Bags category.
    pub fn bags_catalog() -> Vec<CategoryRecord> {
        vec![
            root_record(),
            CategoryRecord::new(5, ROOT_ID, "Bags", true, "1/5"),
        ]
    }

    /// Three levels, with an inactive branch.
    pub fn apparel_catalog() -> Vec<CategoryRecord> {
        vec![
            root_record(),
            CategoryRecord::new(10, ROOT_ID, "Apparel", true, "1/10"),
            CategoryRecord::new(11, 10, "Winter Coats", true, "1/10/11"),
            CategoryRecord::new(12, 11, "Leather Coats", false, "1/10/11/12"),
            CategoryRecord::new(13, 10, "Kids", true, "1/10/13"),
            CategoryRecord::new(14, 13, "Kids Sale", true, "1/10/13/14"),
        ]
    }

    pub fn admin_user() -> AdminUser {
        AdminUser::new("admin", "1")
    }

    pub fn editor_user() -> AdminUser {
        AdminUser::new("editor", "7")
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Structural checks on returned forests.

    use super::*;
    use std::collections::{HashMap, HashSet};

    /// Values of every node in depth-first pre-order.
    pub fn forest_values(forest: &[TreeNode]) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = forest.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.value);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Assert every node appears once and hangs under its recorded parent,
    /// with top-level nodes parented by the root.
    ///
    /// # Panics
    /// Panics with the offending node when the forest is not connected.
    pub fn assert_forest_connected(forest: &[TreeNode], records: &[CategoryRecord]) {
        let parents: HashMap<CategoryId, CategoryId> =
            records.iter().map(|r| (r.id, r.parent_id)).collect();
        let mut seen = HashSet::new();
        let mut stack: Vec<(&TreeNode, CategoryId)> =
            forest.iter().map(|node| (node, ROOT_ID)).collect();

        while let Some((node, tree_parent)) = stack.pop() {
            assert_ne!(node.value, ROOT_ID, "root must not appear as an option");
            assert!(
                seen.insert(node.value),
                "category {} appears more than once",
                node.value
            );
            assert_eq!(
                parents.get(&node.value),
                Some(&tree_parent),
                "category {} is not under its recorded parent",
                node.value
            );
            stack.extend(node.children.iter().map(|child| (child, node.value)));
        }
    }

    /// Assert the result is a data access error.
    pub fn assert_data_access_error<T: std::fmt::Debug>(result: &CatselResult<T>) {
        match result {
            Err(CatselError::DataAccess(_)) => {}
            other => panic!("Expected DataAccess error, got {:?}", other),
        }
    }
}
