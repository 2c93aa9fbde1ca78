//! Filters hierarchy flattening
//!
//! The hierarchy endpoint returns folders and filters as one nested tree:
//!
//! ```json
//! {"roots": [{"id": "f1", "type": "folder_node", "name": "Root",
//!             "children": [{"id": "x1", "type": "filter_node", "name": "Q",
//!                           "meta": {"source": "A"}}]}]}
//! ```
//!
//! `Hierarchy` turns that tree into two flat maps keyed by id. The walk uses
//! an explicit stack, so nesting depth does not grow the call stack.

use mpsiem_core::{Error, FilterEntry, FilterMap, FolderEntry, FolderMap, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

/// One node of the filters hierarchy as sent by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyNode {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub meta: Option<NodeMeta>,
    #[serde(default)]
    pub children: Option<Vec<HierarchyNode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMeta {
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Filter,
    /// Any other node type; skipped together with its subtree
    Other,
}

impl NodeKind {
    pub fn of(kind: Option<&str>) -> Self {
        match kind {
            Some("folder_node") => NodeKind::Folder,
            Some("filter_node") => NodeKind::Filter,
            _ => NodeKind::Other,
        }
    }
}

/// Flat view of the filters hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    pub folders: FolderMap,
    pub filters: FilterMap,
}

impl Hierarchy {
    /// Build from the hierarchy endpoint's JSON body
    pub fn from_response(mut body: Value) -> Result<Self> {
        let roots = match body.get_mut("roots").map(Value::take) {
            Some(Value::Null) | None => {
                return Err(Error::missing_field("roots", "filters hierarchy response"));
            }
            Some(roots) => roots,
        };

        // Derived deserializers recurse per level; let the stack grow with the tree.
        let roots = Vec::<HierarchyNode>::deserialize(serde_stacker::Deserializer::new(roots))
            .map_err(|e| Error::MalformedResponse(format!("invalid filters hierarchy: {}", e)))?;

        Self::flatten(roots)
    }

    /// Walk the tree depth-first in document order.
    ///
    /// Folder nodes record their nearest enclosing folder as parent and are
    /// descended into; filter nodes record it as their folder and are leaves.
    pub fn flatten(roots: Vec<HierarchyNode>) -> Result<Self> {
        let mut hierarchy = Hierarchy::default();
        let mut stack: Vec<(HierarchyNode, Option<String>)> =
            roots.into_iter().rev().map(|node| (node, None)).collect();

        while let Some((node, parent_id)) = stack.pop() {
            let source = node.meta.and_then(|meta| meta.source);

            match NodeKind::of(node.kind.as_deref()) {
                NodeKind::Filter => {
                    let id = node
                        .id
                        .ok_or_else(|| Error::missing_field("id", "filter node"))?;
                    let name = node
                        .name
                        .ok_or_else(|| Error::missing_field("name", "filter node"))?;
                    hierarchy.filters.insert(
                        id,
                        FilterEntry {
                            folder_id: parent_id,
                            name,
                            source,
                        },
                    );
                }
                NodeKind::Folder => {
                    let id = node
                        .id
                        .ok_or_else(|| Error::missing_field("id", "folder node"))?;
                    let name = node
                        .name
                        .ok_or_else(|| Error::missing_field("name", "folder node"))?;

                    if let Some(children) = node.children {
                        stack.extend(
                            children
                                .into_iter()
                                .rev()
                                .map(|child| (child, Some(id.clone()))),
                        );
                    }

                    hierarchy.folders.insert(
                        id,
                        FolderEntry {
                            parent_id,
                            name,
                            source,
                        },
                    );
                }
                NodeKind::Other => {
                    trace!(node_id = ?node.id, kind = ?node.kind, "Skipping hierarchy node");
                }
            }
        }

        Ok(hierarchy)
    }
}
