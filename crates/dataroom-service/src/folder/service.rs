//! Folder operations that change the shape or order of a dataroom tree.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use dataroom_core::config::IndexingConfig;
use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId};
use dataroom_database::store::{IsolationLevel, OrderWrite, TreeStore};
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder, NodeKind};

use crate::hierarchy::moves::{MoveFoldersRequest, plan_move};
use crate::hierarchy::path::folder_path;
use crate::hierarchy::service::{HierarchyService, write_indexes};

/// Maximum folder name length.
const MAX_NAME_LEN: usize = 255;

/// Manages folder creation, moves and manual ordering.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Transactional tree access.
    store: Arc<dyn TreeStore>,
    /// Index recomputation after moves.
    hierarchy: HierarchyService,
    /// Batching and follow-up settings.
    config: IndexingConfig,
}

/// Outcome of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    /// Number of folders moved.
    pub updated_count: usize,
    /// Path of the folder they were moved into, `"/"` for the root.
    pub new_path: String,
}

/// A manual order override for one folder or placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    /// Folder or placement ID.
    pub id: Uuid,
    /// Which of the two the ID refers to.
    pub kind: NodeKind,
    /// New override, `None` to fall back to name order.
    pub order_index: Option<i32>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        store: Arc<dyn TreeStore>,
        hierarchy: HierarchyService,
        config: IndexingConfig,
    ) -> Self {
        Self {
            store,
            hierarchy,
            config,
        }
    }

    /// Creates a folder under `parent_id`, or at the root.
    pub async fn create_folder(
        &self,
        dataroom_id: DataroomId,
        parent_id: Option<DataroomFolderId>,
        name: &str,
    ) -> AppResult<DataroomFolder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "Folder name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }

        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::ReadCommitted)
            .await?;
        let folders = tx.folders().await?;

        let parent_path = match parent_id {
            None => None,
            Some(id) => Some(
                folders
                    .iter()
                    .find(|f| f.id == id)
                    .ok_or_else(|| AppError::not_found("Parent folder not found"))?
                    .path
                    .as_str(),
            ),
        };
        let path = folder_path(parent_path, name);

        if folders.iter().any(|f| f.path == path) {
            return Err(AppError::conflict(format!(
                "A folder at path '{path}' already exists"
            )));
        }

        let row = NewDataroomFolder {
            id: DataroomFolderId::new(),
            dataroom_id,
            parent_id,
            name: name.to_string(),
            path,
        };
        tx.insert_folders(std::slice::from_ref(&row)).await?;
        let folder = tx
            .folders()
            .await?
            .into_iter()
            .find(|f| f.id == row.id)
            .ok_or_else(|| AppError::internal("Created folder could not be read back"))?;
        tx.commit().await?;

        info!(
            dataroom_id = %dataroom_id,
            folder_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );

        Ok(folder)
    }

    /// Moves folders, with everything below them, under a new parent.
    ///
    /// The whole move is rejected before any write when a name would be
    /// duplicated under the target. Indexes are recomputed afterwards in a
    /// separate transaction when configured; a failure there is logged and
    /// does not undo the move.
    pub async fn move_folders(
        &self,
        dataroom_id: DataroomId,
        request: MoveFoldersRequest,
    ) -> AppResult<MoveResult> {
        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::ReadCommitted)
            .await?;
        let folders = tx.folders().await?;
        let plan = plan_move(&folders, &request)?;

        for batch in plan.relocations.chunks(self.config.batch_size.max(1)) {
            tx.relocate_folders(batch).await?;
        }
        tx.commit().await?;

        info!(
            dataroom_id = %dataroom_id,
            moved = plan.moved,
            rows_rewritten = plan.relocations.len(),
            target = %plan.target_path,
            "Folders moved"
        );

        if self.config.reindex_after_move {
            if let Err(e) = self.hierarchy.recompute_hierarchical_indexes(dataroom_id).await {
                warn!(
                    dataroom_id = %dataroom_id,
                    error = %e,
                    "Index recomputation after move failed, indexes stay stale until the next rebuild"
                );
            }
        }

        Ok(MoveResult {
            updated_count: plan.moved,
            new_path: plan.target_path,
        })
    }

    /// Sets manual order overrides and renumbers the dataroom.
    ///
    /// Overrides and the new indexes are written in one transaction.
    pub async fn reorder(&self, dataroom_id: DataroomId, items: Vec<ReorderItem>) -> AppResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::ReadCommitted)
            .await?;
        let folder_ids: HashSet<Uuid> = tx
            .folders()
            .await?
            .iter()
            .map(|f| f.id.into_uuid())
            .collect();
        let placement_ids: HashSet<Uuid> = tx
            .placements()
            .await?
            .iter()
            .map(|p| p.id.into_uuid())
            .collect();

        let mut folder_writes = Vec::new();
        let mut document_writes = Vec::new();
        for item in &items {
            match item.kind {
                NodeKind::Folder if folder_ids.contains(&item.id) => folder_writes.push(OrderWrite {
                    id: DataroomFolderId::from_uuid(item.id),
                    order_index: item.order_index,
                }),
                NodeKind::Document if placement_ids.contains(&item.id) => {
                    document_writes.push(OrderWrite {
                        id: DataroomDocumentId::from_uuid(item.id),
                        order_index: item.order_index,
                    })
                }
                kind => {
                    return Err(AppError::not_found(format!(
                        "No {kind} {} in this dataroom",
                        item.id
                    )));
                }
            }
        }

        let batch_size = self.config.batch_size.max(1);
        for batch in folder_writes.chunks(batch_size) {
            tx.write_folder_order(batch).await?;
        }
        for batch in document_writes.chunks(batch_size) {
            tx.write_document_order(batch).await?;
        }
        let summary = write_indexes(tx.as_mut(), batch_size).await?;
        tx.commit().await?;

        info!(
            dataroom_id = %dataroom_id,
            items = items.len(),
            folders_updated = summary.folders_updated,
            documents_updated = summary.documents_updated,
            "Dataroom reordered"
        );

        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataroom_core::error::ErrorKind;
    use dataroom_core::types::id::TeamId;
    use dataroom_database::store::MemoryTreeStore;
    use dataroom_entity::dataroom::Dataroom;

    fn service(store: &MemoryTreeStore, reindex_after_move: bool) -> FolderService {
        let config = IndexingConfig {
            reindex_after_move,
            retry_backoff_ms: 1,
            ..IndexingConfig::default()
        };
        let store: Arc<dyn TreeStore> = Arc::new(store.clone());
        FolderService::new(
            store.clone(),
            HierarchyService::new(store, config.clone()),
            config,
        )
    }

    async fn setup() -> (MemoryTreeStore, Dataroom) {
        let store = MemoryTreeStore::new();
        let dataroom = store.seed_dataroom(TeamId::new(), "Deal").await;
        (store, dataroom)
    }

    fn find<'a>(folders: &'a [DataroomFolder], id: DataroomFolderId) -> &'a DataroomFolder {
        folders.iter().find(|f| f.id == id).unwrap()
    }

    #[tokio::test]
    async fn test_create_folder_builds_path_from_parent() {
        let (store, dataroom) = setup().await;
        let service = service(&store, false);

        let finance = service.create_folder(dataroom.id, None, "Finance").await.unwrap();
        let q1 = service
            .create_folder(dataroom.id, Some(finance.id), "Q1 Reports")
            .await
            .unwrap();
        assert_eq!(finance.path, "/finance");
        assert_eq!(q1.path, "/finance/q1-reports");
        assert_eq!(q1.order_index, None);

        let err = service
            .create_folder(dataroom.id, Some(finance.id), "q1 reports")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = service.create_folder(dataroom.id, None, "   ").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = service
            .create_folder(dataroom.id, Some(DataroomFolderId::new()), "Orphan")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_move_to_root_keeps_placements_and_resets_order() {
        let (store, dataroom) = setup().await;
        let a = store.seed_folder(dataroom.id, None, "A", "/a", None).await;
        let x = store.seed_folder(dataroom.id, Some(a.id), "X", "/a/x", Some(4)).await;
        let document = store.seed_document(dataroom.team_id, None, "Inside.pdf").await;
        let placement = store.seed_placement(dataroom.id, &document, Some(x.id), None).await;

        let result = service(&store, true)
            .move_folders(
                dataroom.id,
                MoveFoldersRequest {
                    folder_ids: vec![x.id],
                    target_parent_id: None,
                    target_path: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(result.updated_count, 1);
        assert_eq!(result.new_path, "/");

        let folders = store.folders(dataroom.id).await;
        let moved = find(&folders, x.id);
        assert_eq!(moved.path, "/x");
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.order_index, None);
        assert_eq!(moved.hierarchical_index.as_deref(), Some("2"));

        let placements = store.placements(dataroom.id).await;
        assert_eq!(placements[0].id, placement.id);
        assert_eq!(placements[0].folder_id, Some(x.id));
        assert_eq!(placements[0].hierarchical_index.as_deref(), Some("2.1"));
    }

    #[tokio::test]
    async fn test_move_rewrites_descendant_prefixes() {
        let (store, dataroom) = setup().await;
        let a = store.seed_folder(dataroom.id, None, "A", "/a", None).await;
        let b = store.seed_folder(dataroom.id, Some(a.id), "B", "/a/b", None).await;
        let c = store.seed_folder(dataroom.id, Some(b.id), "C", "/a/b/c", None).await;
        let d = store.seed_folder(dataroom.id, Some(c.id), "D d", "/a/b/c/d-d", None).await;
        let x = store.seed_folder(dataroom.id, None, "X", "/x", None).await;
        let before = store.folders(dataroom.id).await;

        service(&store, false)
            .move_folders(
                dataroom.id,
                MoveFoldersRequest {
                    folder_ids: vec![b.id],
                    target_parent_id: Some(x.id),
                    target_path: Some("/x".to_string()),
                },
            )
            .await
            .unwrap();

        let after = store.folders(dataroom.id).await;
        for id in [c.id, d.id] {
            let old = &find(&before, id).path;
            let new = &find(&after, id).path;
            assert_eq!(old.strip_prefix("/a/b"), new.strip_prefix("/x/b"));
            assert_eq!(find(&before, id).parent_id, find(&after, id).parent_id);
        }
        assert_eq!(find(&after, b.id).parent_id, Some(x.id));
        assert!(crate::hierarchy::check_paths(&after).is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_move_changes_nothing() {
        let (store, dataroom) = setup().await;
        let target = store.seed_folder(dataroom.id, None, "Archive", "/archive", None).await;
        store
            .seed_folder(dataroom.id, Some(target.id), "Reports", "/archive/reports", None)
            .await;
        let a = store.seed_folder(dataroom.id, None, "A", "/a", None).await;
        let first = store.seed_folder(dataroom.id, Some(a.id), "Reports", "/a/reports", Some(1)).await;
        let b = store.seed_folder(dataroom.id, None, "B", "/b", None).await;
        let second = store.seed_folder(dataroom.id, Some(b.id), "Reports", "/b/reports", None).await;
        let free = store.seed_folder(dataroom.id, None, "Free", "/free", None).await;
        let before = store.folders(dataroom.id).await;

        let err = service(&store, true)
            .move_folders(
                dataroom.id,
                MoveFoldersRequest {
                    folder_ids: vec![free.id, first.id, second.id],
                    target_parent_id: Some(target.id),
                    target_path: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.message.ends_with(": Reports"));

        let after = store.folders(dataroom.id).await;
        for folder in &before {
            let now = find(&after, folder.id);
            assert_eq!(now.parent_id, folder.parent_id);
            assert_eq!(now.path, folder.path);
            assert_eq!(now.order_index, folder.order_index);
        }
    }

    #[tokio::test]
    async fn test_reorder_updates_order_and_indexes() {
        let (store, dataroom) = setup().await;
        let alpha = store.seed_folder(dataroom.id, None, "Alpha", "/alpha", None).await;
        let beta = store.seed_folder(dataroom.id, None, "Beta", "/beta", None).await;
        let document = store.seed_document(dataroom.team_id, None, "Zed.pdf").await;
        let placement = store.seed_placement(dataroom.id, &document, None, None).await;

        let service = service(&store, false);
        let count = service
            .reorder(
                dataroom.id,
                vec![
                    ReorderItem {
                        id: placement.id.into_uuid(),
                        kind: NodeKind::Document,
                        order_index: Some(1),
                    },
                    ReorderItem {
                        id: beta.id.into_uuid(),
                        kind: NodeKind::Folder,
                        order_index: Some(2),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let folders = store.folders(dataroom.id).await;
        assert_eq!(find(&folders, beta.id).hierarchical_index.as_deref(), Some("2"));
        assert_eq!(find(&folders, alpha.id).hierarchical_index.as_deref(), Some("3"));
        let placements = store.placements(dataroom.id).await;
        assert_eq!(placements[0].hierarchical_index.as_deref(), Some("1"));

        let err = service
            .reorder(
                dataroom.id,
                vec![ReorderItem {
                    id: alpha.id.into_uuid(),
                    kind: NodeKind::Document,
                    order_index: Some(1),
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
