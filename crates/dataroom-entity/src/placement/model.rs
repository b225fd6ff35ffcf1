//! Document placement entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId};

/// A document placed at one location inside one dataroom.
///
/// This is the join row, not the document itself: `id` identifies the
/// placement and `document_id` the underlying document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DataroomDocument {
    /// Unique placement identifier.
    pub id: DataroomDocumentId,
    /// The dataroom this placement belongs to.
    pub dataroom_id: DataroomId,
    /// The underlying document.
    pub document_id: DocumentId,
    /// Containing folder (null for root-level placements).
    pub folder_id: Option<DataroomFolderId>,
    /// Manual ordering override.
    pub order_index: Option<i32>,
    /// Derived dotted index.
    pub hierarchical_index: Option<String>,
    /// Name of the underlying document, joined in on load.
    pub document_name: String,
    /// When the placement was created.
    pub created_at: DateTime<Utc>,
    /// When the placement was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A placement row staged for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataroomDocument {
    /// Pre-assigned placement identifier.
    pub id: DataroomDocumentId,
    /// Target dataroom.
    pub dataroom_id: DataroomId,
    /// The underlying document (shared, never copied).
    pub document_id: DocumentId,
    /// Containing folder (None for root).
    pub folder_id: Option<DataroomFolderId>,
}
