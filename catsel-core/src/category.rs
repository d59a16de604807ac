//! Category records as read from the catalog

use serde::{Deserialize, Serialize};

use crate::identity::{CategoryId, ROOT_ID};

/// Separator between ids in a materialized path.
pub const PATH_SEPARATOR: char = '/';

/// A category row, already resolved for one store scope.
///
/// Owned by the external catalog; nothing in this workspace mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub parent_id: CategoryId,
    pub name: String,
    pub is_active: bool,
    /// Materialized path from the root down to this category, e.g. `"1/2/7"`.
    pub path: String,
}

impl CategoryRecord {
    pub fn new(
        id: CategoryId,
        parent_id: CategoryId,
        name: impl Into<String>,
        is_active: bool,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            is_active,
            path: path.into(),
        }
    }

    /// Whether this record is the catalog root.
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    /// Projection used by name-match queries.
    pub fn to_path(&self) -> CategoryPath {
        CategoryPath {
            id: self.id,
            path: self.path.clone(),
        }
    }
}

/// The `(id, path)` projection returned by a name-match query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPath {
    pub id: CategoryId,
    pub path: String,
}

impl CategoryPath {
    pub fn new(id: CategoryId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Raw path segments, in root-to-leaf order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(PATH_SEPARATOR)
    }
}
