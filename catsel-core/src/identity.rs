//! Identity types for categories, stores and admin users

use serde::{Deserialize, Serialize};

/// Category identifier as stored by the catalog.
pub type CategoryId = u32;

/// Store (scope) identifier. Store-specific name and active-flag overrides
/// are resolved against this id.
pub type StoreId = u32;

/// Well-known id of the catalog tree root. Every materialized path starts
/// with it, and it is never offered as a selectable option.
pub const ROOT_ID: CategoryId = 1;

/// The global (admin) store scope.
pub const ADMIN_STORE_ID: StoreId = 0;

/// The signed-in admin user requesting the tree.
///
/// Passed explicitly to anything that varies by user; there is no ambient
/// session lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    /// ACL role identifier. May be empty for users without an assigned role.
    pub acl_role: String,
}

impl AdminUser {
    pub fn new(username: impl Into<String>, acl_role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            acl_role: acl_role.into(),
        }
    }

    pub fn acl_role(&self) -> &str {
        &self.acl_role
    }
}
