//! catsel Core - Category Tree Types
//!
//! Pure data structures and pure functions shared by every other crate:
//! category records, the option tree and its arena builder, visibility sets,
//! name filters, errors and configuration. No I/O lives here.

pub mod category;
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod tree;
pub mod visibility;

pub use category::{CategoryPath, CategoryRecord};
pub use config::CatselConfig;
pub use error::{
    CacheError, CatselError, CatselResult, ConfigError, DataAccessError, StorageError,
};
pub use filter::NameFilter;
pub use identity::{AdminUser, CategoryId, StoreId, ADMIN_STORE_ID, ROOT_ID};
pub use tree::{
    flatten_forest, unflatten_forest, CategoryTreeBuilder, FlatNode, Forest, TreeNode,
};
pub use visibility::VisibilitySet;
