//! End-to-end tests for the category select field over both cache backends.

use std::sync::Arc;

use catsel_core::{CatselConfig, CatselError, DataAccessError, NameFilter, ADMIN_STORE_ID, ROOT_ID};
use catsel_field::{CategorySelectField, FieldElement, FieldSettings};
use catsel_storage::{
    build_cache_id, CategoryTreeProvider, ConfiguredCache, InMemoryCategorySource,
    InMemoryTaggedCache, StoreOverride, TaggedCache, CATEGORY_CACHE_TAG,
};
use catsel_test_utils::assertions::{assert_data_access_error, assert_forest_connected};
use catsel_test_utils::fixtures::{
    admin_user, apparel_catalog, bags_catalog, editor_user, shoes_catalog,
};
use catsel_test_utils::{CountingCategorySource, FailingCache, FailingCategorySource};
use tempfile::TempDir;

fn memory_provider(
    records: Vec<catsel_core::CategoryRecord>,
) -> CategoryTreeProvider<CountingCategorySource, InMemoryTaggedCache> {
    CategoryTreeProvider::with_defaults(
        Arc::new(CountingCategorySource::with_records(records)),
        Arc::new(InMemoryTaggedCache::new()),
    )
}

#[tokio::test]
async fn test_red_filter_keeps_shoes_branch() {
    let provider = memory_provider(shoes_catalog());

    let shown = provider
        .resolve_shown_ids(ADMIN_STORE_ID, &NameFilter::from("Red"))
        .await
        .unwrap();
    assert_eq!(shown.to_vec(), vec![2, 3]);

    let forest = provider
        .get_categories_tree(ADMIN_STORE_ID, Some("Red"), None)
        .await
        .unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].label.as_deref(), Some("Shoes"));
    assert_eq!(forest[0].children.len(), 1);
    assert_eq!(forest[0].children[0].label.as_deref(), Some("Red Shoes"));
    assert_forest_connected(&forest, &shoes_catalog());
}

#[tokio::test]
async fn test_empty_filter_lists_bags() {
    let provider = memory_provider(bags_catalog());
    let forest = provider
        .get_categories_tree(ADMIN_STORE_ID, None, None)
        .await
        .unwrap();

    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].value, 5);
    assert_eq!(forest[0].label.as_deref(), Some("Bags"));
    assert_eq!(forest[0].is_active, Some(true));
    assert!(forest[0].disable_tmpl);
}

#[tokio::test]
async fn test_filter_case_shares_contents_not_entries() {
    let provider = memory_provider(bags_catalog());

    let lower = provider.get_categories_tree(0, Some("a"), None).await.unwrap();
    let upper = provider.get_categories_tree(0, Some("A"), None).await.unwrap();
    assert_eq!(lower, upper);

    assert_ne!(build_cache_id(0, "a", None), build_cache_id(0, "A", None));
    assert_eq!(provider.cache().len(), 2);
}

#[tokio::test]
async fn test_inactive_categories_are_flagged_not_hidden() {
    let provider = memory_provider(apparel_catalog());
    let forest = provider
        .get_categories_tree(0, Some("leather"), None)
        .await
        .unwrap();

    let apparel = &forest[0];
    let coats = &apparel.children[0];
    let leather = &coats.children[0];
    assert_eq!(leather.value, 12);
    assert_eq!(leather.is_active, Some(false));
}

#[tokio::test]
async fn test_store_override_rename_is_cached_per_store() {
    let source = InMemoryCategorySource::with_records(shoes_catalog());
    source
        .set_store_override(2, 4, StoreOverride::name("Chapeaux"))
        .await;
    let provider = CategoryTreeProvider::with_defaults(
        Arc::new(source),
        Arc::new(InMemoryTaggedCache::new()),
    );

    let global = provider.get_categories_tree(0, Some("hat"), None).await.unwrap();
    let french = provider.get_categories_tree(2, Some("hat"), None).await.unwrap();
    assert_eq!(global.len(), 1);
    assert!(french.is_empty());

    let french = provider
        .get_categories_tree(2, Some("chapeau"), None)
        .await
        .unwrap();
    assert_eq!(french[0].label.as_deref(), Some("Chapeaux"));
}

#[tokio::test]
async fn test_roles_do_not_share_entries() {
    let provider = memory_provider(shoes_catalog());
    let admin = admin_user();
    let editor = editor_user();

    provider.get_categories_tree(0, None, Some(&admin)).await.unwrap();
    let calls = provider.source().total_calls();
    provider.get_categories_tree(0, None, Some(&editor)).await.unwrap();
    assert!(provider.source().total_calls() > calls);

    assert!(provider
        .cache()
        .inspect(&build_cache_id(0, "", Some(&admin)))
        .await
        .unwrap()
        .is_some());
    assert!(provider
        .cache()
        .inspect(&build_cache_id(0, "", Some(&editor)))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_invalidation_then_catalog_change_is_visible() {
    let source = Arc::new(InMemoryCategorySource::with_records(shoes_catalog()));
    let provider = CategoryTreeProvider::with_defaults(
        Arc::clone(&source),
        Arc::new(InMemoryTaggedCache::new()),
    );

    let before = provider.get_categories_tree(0, None, None).await.unwrap();
    source
        .upsert(catsel_core::CategoryRecord::new(9, ROOT_ID, "Sale", true, "1/9"))
        .await;

    let stale = provider.get_categories_tree(0, None, None).await.unwrap();
    assert_eq!(stale, before);

    assert_eq!(provider.invalidate_categories().await.unwrap(), 1);
    let fresh = provider.get_categories_tree(0, None, None).await.unwrap();
    assert_eq!(fresh.len(), before.len() + 1);
}

#[tokio::test]
async fn test_source_failure_surfaces() {
    let provider = CategoryTreeProvider::with_defaults(
        Arc::new(FailingCategorySource::timeout()),
        Arc::new(InMemoryTaggedCache::new()),
    );

    let result = provider.get_categories_tree(0, Some("Red"), None).await;
    assert_data_access_error(&result);
    assert!(matches!(
        result,
        Err(CatselError::DataAccess(DataAccessError::Timeout { .. }))
    ));
    assert!(provider.cache().is_empty());
}

#[tokio::test]
async fn test_failing_cache_still_serves_tree() {
    let provider = CategoryTreeProvider::with_defaults(
        Arc::new(CountingCategorySource::with_records(shoes_catalog())),
        Arc::new(FailingCache),
    );

    let forest = provider.get_categories_tree(0, None, None).await.unwrap();
    assert_eq!(forest.len(), 2);
}

#[tokio::test]
async fn test_field_over_lmdb_cache() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let config = CatselConfig {
        lmdb_path: Some(dir.path().join("tree-cache")),
        lmdb_max_size_mb: 8,
        ..Default::default()
    };
    let source = Arc::new(CountingCategorySource::with_records(shoes_catalog()));
    let field =
        CategorySelectField::from_config(Arc::clone(&source), config, FieldSettings::default())
            .unwrap();
    assert_eq!(field.provider().cache().backend_name(), "lmdb");

    let element = FieldElement::new("catalog_categories", Some("3,4"));
    let first = field
        .get_component_js_config(&element, 0, Some(&admin_user()))
        .await
        .unwrap();
    let calls = source.total_calls();
    let second = field
        .get_component_js_config(&element, 0, Some(&admin_user()))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(source.total_calls(), calls);
    assert_eq!(first.value, vec!["3", "4"]);
    assert_forest_connected(&first.options, &shoes_catalog());

    let cache: &ConfiguredCache = field.provider().cache();
    let info = cache
        .inspect(&build_cache_id(0, "", Some(&admin_user())))
        .await
        .unwrap()
        .unwrap();
    assert!(info.has_tag(CATEGORY_CACHE_TAG));

    assert_eq!(field.provider().flush_block_cache().await.unwrap(), 1);
    assert_eq!(cache.stats().await.unwrap().entry_count, 0);
}

#[tokio::test]
async fn test_disabled_cache_never_writes() {
    let config = CatselConfig {
        cache_enabled: false,
        ..Default::default()
    };
    let field = CategorySelectField::from_config(
        Arc::new(CountingCategorySource::with_records(bags_catalog())),
        config,
        FieldSettings::default(),
    )
    .unwrap();

    let element = FieldElement::new("f", None);
    field.get_component_js_config(&element, 0, None).await.unwrap();
    field.get_component_js_config(&element, 0, None).await.unwrap();

    assert_eq!(field.provider().source().find_calls(), 2);
    assert_eq!(
        field.provider().cache().stats().await.unwrap().entry_count,
        0
    );
}
