//! Transactional access to one dataroom's tree.
//!
//! Every tree operation runs inside a [`TreeTransaction`] opened through a
//! [`TreeStore`]. A transaction is scoped to a single dataroom, holds that
//! dataroom's structural lock until it ends, and publishes nothing until
//! [`TreeTransaction::commit`] succeeds. Dropping a transaction rolls it back.

#[cfg(feature = "memory")]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dataroom_core::result::AppResult;
use dataroom_core::types::id::{
    DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId, FolderId, TeamId,
};
use dataroom_entity::dataroom::{CreateDataroom, Dataroom};
use dataroom_entity::document::{Document, TeamFolder};
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder};
use dataroom_entity::placement::{DataroomDocument, NewDataroomDocument};

#[cfg(feature = "memory")]
pub use memory::MemoryTreeStore;
pub use postgres::PgTreeStore;

/// Isolation requested when opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    /// Each statement sees the latest committed data.
    ReadCommitted,
    /// All statements see one snapshot; conflicting writes fail with a
    /// retryable transaction conflict.
    RepeatableRead,
}

/// A computed hierarchical index for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexWrite<Id> {
    /// Row identifier.
    pub id: Id,
    /// Dotted index to store, `None` to clear it.
    pub hierarchical_index: Option<String>,
}

/// A manual order override for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWrite<Id> {
    /// Row identifier.
    pub id: Id,
    /// New override, or `None` to fall back to name order.
    pub order_index: Option<i32>,
}

/// The new location of one folder after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRelocation {
    /// Folder identifier.
    pub id: DataroomFolderId,
    /// New parent. Only applied when `moved` is set.
    pub parent_id: Option<DataroomFolderId>,
    /// New materialized path.
    pub path: String,
    /// Whether this folder was moved itself (parent changes and manual
    /// order resets) rather than carried along as a descendant.
    pub moved: bool,
}

/// A regular team folder together with everything below it.
#[derive(Debug, Clone)]
pub struct FolderSubtree {
    /// The folder that was asked for.
    pub root: TeamFolder,
    /// All descendant folders.
    pub folders: Vec<TeamFolder>,
    /// Documents in the root folder and every descendant.
    pub documents: Vec<Document>,
}

/// Factory for dataroom-scoped transactions plus a few plain lookups.
#[async_trait]
pub trait TreeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Open a transaction on an existing dataroom, taking its structural lock.
    ///
    /// Fails with `NotFound` when the dataroom does not exist.
    async fn begin(
        &self,
        dataroom_id: DataroomId,
        isolation: IsolationLevel,
    ) -> AppResult<Box<dyn TreeTransaction>>;

    /// Insert a dataroom row and return a transaction scoped to it. The
    /// dataroom only becomes visible when the transaction commits.
    async fn begin_new_dataroom(&self, data: &CreateDataroom)
    -> AppResult<Box<dyn TreeTransaction>>;

    /// Look up a dataroom outside any transaction.
    async fn find_dataroom(&self, dataroom_id: DataroomId) -> AppResult<Option<Dataroom>>;

    /// Look up an underlying document.
    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>>;

    /// Load a team folder, its descendants, and their documents.
    async fn load_team_folder_subtree(
        &self,
        team_id: TeamId,
        folder_id: FolderId,
    ) -> AppResult<Option<FolderSubtree>>;
}

/// Reads and writes against one dataroom inside one transaction.
#[async_trait]
pub trait TreeTransaction: Send {
    /// The dataroom this transaction is scoped to.
    fn dataroom(&self) -> &Dataroom;

    /// All folders of the dataroom.
    async fn folders(&mut self) -> AppResult<Vec<DataroomFolder>>;

    /// All document placements of the dataroom, with document names.
    async fn placements(&mut self) -> AppResult<Vec<DataroomDocument>>;

    /// Store hierarchical indexes for a batch of folders.
    async fn write_folder_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomFolderId>],
    ) -> AppResult<u64>;

    /// Store hierarchical indexes for a batch of placements.
    async fn write_document_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomDocumentId>],
    ) -> AppResult<u64>;

    /// Apply new parents and paths. Path uniqueness is checked at commit.
    async fn relocate_folders(&mut self, batch: &[FolderRelocation]) -> AppResult<u64>;

    /// Store manual order overrides for folders.
    async fn write_folder_order(&mut self, batch: &[OrderWrite<DataroomFolderId>])
    -> AppResult<u64>;

    /// Store manual order overrides for placements.
    async fn write_document_order(
        &mut self,
        batch: &[OrderWrite<DataroomDocumentId>],
    ) -> AppResult<u64>;

    /// Insert staged folders. Parents must precede their children.
    async fn insert_folders(&mut self, rows: &[NewDataroomFolder]) -> AppResult<u64>;

    /// Insert staged placements.
    async fn insert_placements(&mut self, rows: &[NewDataroomDocument]) -> AppResult<u64>;

    /// Make every write of this transaction visible at once.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
