//! Document and team folder models.
//!
//! Only the fields the tree indexer reads are modelled here; content,
//! versions and storage live elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::id::{DocumentId, FolderId, TeamId};

/// An uploaded document owned by a team.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: DocumentId,
    /// Owning team.
    pub team_id: TeamId,
    /// Regular folder the document lives in (outside any dataroom).
    pub folder_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// When the document was uploaded.
    pub created_at: DateTime<Utc>,
}

/// A regular (non-dataroom) folder in a team's document library.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamFolder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Owning team.
    pub team_id: TeamId,
    /// Parent folder (null for root-level folders).
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}
