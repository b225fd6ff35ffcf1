//! Document and team folder repository implementation.

use sqlx::PgPool;

use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DocumentId, FolderId, TeamId};
use dataroom_entity::document::{Document, TeamFolder};

use crate::error::map_db_error;
use crate::store::FolderSubtree;

/// Repository for the team document library.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find document", e))
    }

    /// Find a team folder by ID, scoped to its team.
    pub async fn find_folder(&self, team_id: TeamId, id: FolderId) -> AppResult<Option<TeamFolder>> {
        sqlx::query_as::<_, TeamFolder>("SELECT * FROM folders WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find folder", e))
    }

    /// Load a team folder, every folder below it, and all their documents.
    pub async fn load_subtree(
        &self,
        team_id: TeamId,
        folder_id: FolderId,
    ) -> AppResult<Option<FolderSubtree>> {
        let Some(root) = self.find_folder(team_id, folder_id).await? else {
            return Ok(None);
        };

        let folders = sqlx::query_as::<_, TeamFolder>(
            "WITH RECURSIVE tree AS ( \
                SELECT * FROM folders WHERE id = $1 \
                UNION ALL \
                SELECT f.* FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT * FROM tree WHERE id != $1 ORDER BY path ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load folder descendants", e))?;

        let mut folder_ids = vec![root.id.into_uuid()];
        folder_ids.extend(folders.iter().map(|f| f.id.into_uuid()));

        let documents = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE team_id = $1 AND folder_id = ANY($2) \
             ORDER BY name ASC",
        )
        .bind(team_id)
        .bind(&folder_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load folder documents", e))?;

        Ok(Some(FolderSubtree {
            root,
            folders,
            documents,
        }))
    }
}
