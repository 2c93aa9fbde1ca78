//! Filter and folder data model
//!
//! These are the shapes handed back to callers. Wire formats of the SIEM
//! API live next to the code that talks to it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Folder discovered in the filters hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Enclosing folder, `None` for top-level folders
    pub parent_id: Option<String>,
    pub name: String,
    /// Content source reported in the node's `meta`
    pub source: Option<String>,
}

/// Filter discovered in the filters hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// Folder holding the filter, `None` for filters at the root
    pub folder_id: Option<String>,
    pub name: String,
    pub source: Option<String>,
}

/// Folders keyed by folder id
pub type FolderMap = BTreeMap<String, FolderEntry>;

/// Filters keyed by filter id
pub type FilterMap = BTreeMap<String, FilterEntry>;

/// Structured query of a filter.
///
/// Field shapes vary between SIEM releases, so values are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    pub select: Option<Value>,
    #[serde(rename = "where")]
    pub where_: Option<Value>,
    pub group: Option<Value>,
    pub order: Option<Value>,
    pub aggregate: Option<Value>,
    pub distribute: Option<Value>,
    pub top: Option<Value>,
    pub aliases: Option<Value>,
}

/// Filter details in the structured (v2) representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDetail {
    pub name: String,
    pub folder_id: Option<String>,
    pub removed: bool,
    pub source: Option<String>,
    pub query: FilterQuery,
}

/// Filter details in the PDQL (v3) representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDetailPdql {
    pub name: String,
    pub folder_id: Option<String>,
    pub removed: bool,
    pub source: Option<String>,
    #[serde(rename = "pdqlQuery")]
    pub pdql_query: Option<String>,
}
