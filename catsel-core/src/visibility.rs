//! Visibility sets: the category ids a filtered tree must contain.
//!
//! A category matching the filter is only useful in the tree if every one of
//! its ancestors is present too, so the set is built from materialized paths
//! rather than from the matched ids alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::category::CategoryPath;
use crate::identity::{CategoryId, ROOT_ID};

/// Ordered set of category ids to render, never containing [`ROOT_ID`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySet {
    ids: BTreeSet<CategoryId>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from the paths of every matched category.
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a CategoryPath>,
    {
        let mut set = Self::new();
        for path in paths {
            set.insert_path(path);
        }
        set
    }

    /// Add every id on `path`, the category itself included.
    ///
    /// Segments that are not valid ids are skipped. Returns the number of
    /// ids that were not already present.
    pub fn insert_path(&mut self, path: &CategoryPath) -> usize {
        let mut added = 0;
        for segment in path.segments() {
            match segment.trim().parse::<CategoryId>() {
                Ok(id) => {
                    if self.insert(id) {
                        added += 1;
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        category_id = path.id,
                        path = %path.path,
                        segment,
                        "Skipping malformed category path segment"
                    );
                }
            }
        }
        added
    }

    /// Insert a single id. The root id is ignored.
    pub fn insert(&mut self, id: CategoryId) -> bool {
        if id == ROOT_ID {
            return false;
        }
        self.ids.insert(id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<CategoryId> {
        self.iter().collect()
    }
}

impl FromIterator<CategoryId> for VisibilitySet {
    fn from_iter<T: IntoIterator<Item = CategoryId>>(iter: T) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every id on a matched path, except the root, is visible.
        #[test]
        fn prop_every_ancestor_visible(chain in prop::collection::vec(2u32..10_000, 1..8)) {
            let mut segments = vec![ROOT_ID.to_string()];
            segments.extend(chain.iter().map(|id| id.to_string()));
            let leaf = *chain.last().expect("non-empty chain");
            let path = CategoryPath::new(leaf, segments.join("/"));

            let set = VisibilitySet::from_paths(std::iter::once(&path));

            for id in &chain {
                prop_assert!(set.contains(*id));
            }
            prop_assert!(!set.contains(ROOT_ID));
        }
    }
}
