//! PostgreSQL implementation of the tree store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::types::id::{
    DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId, FolderId, TeamId,
};
use dataroom_entity::dataroom::{CreateDataroom, Dataroom};
use dataroom_entity::document::Document;
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder};
use dataroom_entity::placement::{DataroomDocument, NewDataroomDocument};

use super::{
    FolderRelocation, FolderSubtree, IndexWrite, IsolationLevel, OrderWrite, TreeStore,
    TreeTransaction,
};
use crate::error::map_db_error;
use crate::repositories::{DocumentRepository, dataroom, folder, placement};

/// Tree store backed by PostgreSQL.
///
/// Every transaction takes a transaction-scoped advisory lock keyed by the
/// dataroom ID, so structural mutations of one dataroom run one at a time
/// while different datarooms proceed independently. Every commit also
/// touches the dataroom row, which turns a REPEATABLE READ snapshot taken
/// before a concurrent commit into a retryable conflict.
#[derive(Debug, Clone)]
pub struct PgTreeStore {
    pool: PgPool,
    documents: DocumentRepository,
}

impl PgTreeStore {
    /// Create a store on top of a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: DocumentRepository::new(pool.clone()),
            pool,
        }
    }

    async fn open(&self, isolation: IsolationLevel) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        if isolation == IsolationLevel::RepeatableRead {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to set isolation level", e))?;
        }

        Ok(tx)
    }
}

#[async_trait]
impl TreeStore for PgTreeStore {
    async fn begin(
        &self,
        dataroom_id: DataroomId,
        isolation: IsolationLevel,
    ) -> AppResult<Box<dyn TreeTransaction>> {
        let mut tx = self.open(isolation).await?;

        // Under REPEATABLE READ the snapshot is taken by this statement, before
        // the lock is granted. Commits that land while we wait are caught by
        // the dataroom row touch in `commit`.
        dataroom::lock(&mut *tx, dataroom_id).await?;

        let dataroom = dataroom::fetch(&mut *tx, dataroom_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Dataroom {dataroom_id} not found")))?;

        debug!(dataroom_id = %dataroom_id, ?isolation, "Opened dataroom transaction");

        Ok(Box::new(PgTreeTransaction {
            tx,
            dataroom,
            path_constraint_deferred: false,
        }))
    }

    async fn begin_new_dataroom(
        &self,
        data: &CreateDataroom,
    ) -> AppResult<Box<dyn TreeTransaction>> {
        let mut tx = self.open(IsolationLevel::ReadCommitted).await?;
        dataroom::lock(&mut *tx, data.id).await?;
        let dataroom = dataroom::insert(&mut *tx, data).await?;

        Ok(Box::new(PgTreeTransaction {
            tx,
            dataroom,
            path_constraint_deferred: false,
        }))
    }

    async fn find_dataroom(&self, dataroom_id: DataroomId) -> AppResult<Option<Dataroom>> {
        dataroom::fetch(&self.pool, dataroom_id).await
    }

    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>> {
        self.documents.find_by_id(document_id).await
    }

    async fn load_team_folder_subtree(
        &self,
        team_id: TeamId,
        folder_id: FolderId,
    ) -> AppResult<Option<FolderSubtree>> {
        self.documents.load_subtree(team_id, folder_id).await
    }
}

/// An open PostgreSQL transaction scoped to one dataroom.
struct PgTreeTransaction {
    tx: Transaction<'static, Postgres>,
    dataroom: Dataroom,
    path_constraint_deferred: bool,
}

#[async_trait]
impl TreeTransaction for PgTreeTransaction {
    fn dataroom(&self) -> &Dataroom {
        &self.dataroom
    }

    async fn folders(&mut self) -> AppResult<Vec<DataroomFolder>> {
        folder::load_all(&mut *self.tx, self.dataroom.id).await
    }

    async fn placements(&mut self) -> AppResult<Vec<DataroomDocument>> {
        placement::load_all(&mut *self.tx, self.dataroom.id).await
    }

    async fn write_folder_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomFolderId>],
    ) -> AppResult<u64> {
        folder::write_indexes(&mut *self.tx, self.dataroom.id, batch).await
    }

    async fn write_document_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomDocumentId>],
    ) -> AppResult<u64> {
        placement::write_indexes(&mut *self.tx, self.dataroom.id, batch).await
    }

    async fn relocate_folders(&mut self, batch: &[FolderRelocation]) -> AppResult<u64> {
        if !self.path_constraint_deferred {
            folder::defer_path_constraint(&mut *self.tx).await?;
            self.path_constraint_deferred = true;
        }
        folder::relocate(&mut *self.tx, self.dataroom.id, batch).await
    }

    async fn write_folder_order(
        &mut self,
        batch: &[OrderWrite<DataroomFolderId>],
    ) -> AppResult<u64> {
        folder::write_order(&mut *self.tx, self.dataroom.id, batch).await
    }

    async fn write_document_order(
        &mut self,
        batch: &[OrderWrite<DataroomDocumentId>],
    ) -> AppResult<u64> {
        placement::write_order(&mut *self.tx, self.dataroom.id, batch).await
    }

    async fn insert_folders(&mut self, rows: &[NewDataroomFolder]) -> AppResult<u64> {
        folder::insert_batch(&mut *self.tx, rows).await
    }

    async fn insert_placements(&mut self, rows: &[NewDataroomDocument]) -> AppResult<u64> {
        placement::insert_batch(&mut *self.tx, rows).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut this = *self;
        dataroom::touch(&mut *this.tx, this.dataroom.id).await?;
        this.tx
            .commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))
    }
}
