//! Dataroom folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::id::{DataroomFolderId, DataroomId};

/// A folder in a dataroom hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DataroomFolder {
    /// Unique folder identifier.
    pub id: DataroomFolderId,
    /// The dataroom this folder belongs to.
    pub dataroom_id: DataroomId,
    /// Parent folder ID (null for root-level folders).
    pub parent_id: Option<DataroomFolderId>,
    /// Folder name. Not unique among siblings.
    pub name: String,
    /// Full materialized path (e.g., `/finance/q1-reports`).
    pub path: String,
    /// Manual ordering override; `None` sorts by name after ordered siblings.
    pub order_index: Option<i32>,
    /// Derived dotted index (e.g., `"2.1"`), recomputed on demand.
    pub hierarchical_index: Option<String>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A folder row staged for insertion.
///
/// Identifiers are assigned up front so that a whole subtree can be built
/// in memory before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataroomFolder {
    /// Pre-assigned folder identifier.
    pub id: DataroomFolderId,
    /// The dataroom the folder is created in.
    pub dataroom_id: DataroomId,
    /// Parent folder (None for root).
    pub parent_id: Option<DataroomFolderId>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: String,
}
