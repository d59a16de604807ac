//! Cache ids for category trees.
//!
//! A tree depends on the store (store-scoped names and flags), on the filter
//! text, and on who is asking (the ACL role can gate visibility). The key
//! captures all three, and [`CategoryTreeKey`] can only be built with all of
//! them in hand, so a tree cached for one context cannot be served to another.

use std::fmt;

use catsel_core::{AdminUser, NameFilter, StoreId};
use sha2::{Digest, Sha256};

/// Fixed prefix shared by every category tree cache id.
pub const CATEGORY_TREE_ID: &str = "CATALOG_PRODUCT_CATEGORY_TREE";

/// Separator between key segments.
const SEPARATOR: char = '_';

/// Escape character for separators inside free-form segments.
const ESCAPE: char = '\\';

/// Composite cache key for one category tree.
///
/// # Format
///
/// - With a signed-in user: `CATALOG_PRODUCT_CATEGORY_TREE_<store>_<role>_<filter>`
/// - Without: `CATALOG_PRODUCT_CATEGORY_TREE_<store>_<filter>`
///
/// The role and filter are written as given (the filter keeps its case), with
/// `\` and `_` inside them escaped by a backslash. Without the escaping, a
/// role of `"a"` with filter `"b_c"` and a role of `"a_b"` with filter `"c"`
/// would share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryTreeKey {
    inner: TreeKeyInner,
}

/// Private inner struct - prevents external construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TreeKeyInner {
    store_id: StoreId,
    role: Option<String>,
    filter: String,
}

impl CategoryTreeKey {
    /// Create the key for a store, filter and (optional) signed-in user.
    pub fn new(store_id: StoreId, filter: &NameFilter, current_user: Option<&AdminUser>) -> Self {
        Self {
            inner: TreeKeyInner {
                store_id,
                role: current_user.map(|user| user.acl_role().to_string()),
                filter: filter.raw().to_string(),
            },
        }
    }

    pub fn store_id(&self) -> StoreId {
        self.inner.store_id
    }

    /// ACL role of the requesting user, `None` when nobody is signed in.
    pub fn role(&self) -> Option<&str> {
        self.inner.role.as_deref()
    }

    pub fn filter(&self) -> &str {
        &self.inner.filter
    }

    /// The canonical string cache id.
    pub fn cache_id(&self) -> String {
        let mut id = String::with_capacity(
            CATEGORY_TREE_ID.len() + 16 + self.inner.filter.len() * 2,
        );
        id.push_str(CATEGORY_TREE_ID);
        id.push(SEPARATOR);
        id.push_str(&self.inner.store_id.to_string());
        if let Some(role) = &self.inner.role {
            id.push(SEPARATOR);
            push_escaped(&mut id, role);
        }
        id.push(SEPARATOR);
        push_escaped(&mut id, &self.inner.filter);
        id
    }

    /// SHA-256 digest of the cache id, for backends with key-length limits.
    pub fn digest(&self) -> [u8; 32] {
        digest_cache_id(&self.cache_id())
    }

    /// Hex form of [`Self::digest`], short enough for log fields.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

impl fmt::Display for CategoryTreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_id())
    }
}

/// Build the cache id for a store, raw filter and optional signed-in user.
pub fn build_cache_id(store_id: StoreId, filter: &str, current_user: Option<&AdminUser>) -> String {
    CategoryTreeKey::new(store_id, &NameFilter::from(filter), current_user).cache_id()
}

/// SHA-256 of an arbitrary cache id.
pub fn digest_cache_id(cache_id: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(cache_id.as_bytes());
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

fn push_escaped(out: &mut String, segment: &str) {
    for ch in segment.chars() {
        if ch == SEPARATOR || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn role_strategy() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z0-9_\\\\]{0,6}")
    }

    fn filter_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 _%\\\\]{0,8}"
    }

    fn key_for(store: StoreId, role: &Option<String>, filter: &str) -> String {
        let user = role.as_ref().map(|r| AdminUser::new("user", r.clone()));
        build_cache_id(store, filter, user.as_ref())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Property: identical triples give identical ids, and triples that
        /// differ in any field give different ids.
        #[test]
        fn prop_cache_id_is_injective(
            store1 in 0u32..4,
            store2 in 0u32..4,
            role1 in role_strategy(),
            role2 in role_strategy(),
            filter1 in filter_strategy(),
            filter2 in filter_strategy(),
        ) {
            let id1 = key_for(store1, &role1, &filter1);
            let id2 = key_for(store2, &role2, &filter2);

            if (store1, &role1, &filter1) == (store2, &role2, &filter2) {
                prop_assert_eq!(id1, id2);
            } else {
                prop_assert_ne!(id1, id2, "Different triples must not share a cache id");
            }
        }

        /// Property: every id starts with the fixed prefix and store segment.
        #[test]
        fn prop_prefix_and_store_leading(
            store in any::<u32>(),
            role in role_strategy(),
            filter in filter_strategy(),
        ) {
            let id = key_for(store, &role, &filter);
            let expected = format!("{}_{}_", CATEGORY_TREE_ID, store);
            prop_assert!(id.starts_with(&expected));
        }
    }
}
