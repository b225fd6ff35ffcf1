//! Tree structures for hierarchical display.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two node kinds that share one sibling space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A dataroom folder.
    Folder,
    /// A document placement.
    Document,
}

impl NodeKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a rendered dataroom tree.
///
/// A tree is a flat list of these rows in depth-first pre-order, so a
/// parent always precedes its descendants. Nesting is carried by `depth`
/// and `parent_id` rather than by owned children, which keeps arbitrarily
/// deep trees cheap to drop and serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Folder or placement ID.
    pub id: Uuid,
    /// Node kind.
    pub kind: NodeKind,
    /// Containing folder, `None` at the dataroom root.
    pub parent_id: Option<Uuid>,
    /// Folder name or document name.
    pub name: String,
    /// Materialized path (folders only).
    pub path: Option<String>,
    /// Manual ordering override.
    pub order_index: Option<i32>,
    /// Dotted hierarchical index.
    pub hierarchical_index: String,
    /// Depth below the dataroom root, 1 for root-level rows.
    pub depth: usize,
}
