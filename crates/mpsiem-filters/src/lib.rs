//! Event filters module
//!
//! Lists, creates and inspects saved event filters and the folders that
//! organize them:
//! - `FilterCatalog`: API operations with a lazily populated listing cache
//! - `hierarchy`: flattening of the nested filters hierarchy into lookup maps

pub mod catalog;
pub mod hierarchy;
mod wire;

pub use catalog::FilterCatalog;
pub use hierarchy::{Hierarchy, HierarchyNode, NodeKind, NodeMeta};
