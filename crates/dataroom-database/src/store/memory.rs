//! In-memory tree store.
//!
//! Mirrors the PostgreSQL store's transaction semantics closely enough for
//! service tests: a per-dataroom mutex stands in for the advisory lock,
//! writes are staged on a private copy of the dataroom's rows and published
//! on commit, and a dropped transaction leaves nothing behind.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::types::id::{
    DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId, FolderId, TeamId,
};
use dataroom_entity::dataroom::{CreateDataroom, Dataroom};
use dataroom_entity::document::{Document, TeamFolder};
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder};
use dataroom_entity::placement::{DataroomDocument, NewDataroomDocument};

use super::{
    FolderRelocation, FolderSubtree, IndexWrite, IsolationLevel, OrderWrite, TreeStore,
    TreeTransaction,
};

#[derive(Debug, Default)]
struct MemoryState {
    datarooms: HashMap<DataroomId, Dataroom>,
    folders: HashMap<DataroomId, Vec<DataroomFolder>>,
    placements: HashMap<DataroomId, Vec<DataroomDocument>>,
    documents: HashMap<DocumentId, Document>,
    team_folders: HashMap<FolderId, TeamFolder>,
}

/// Tree store that keeps everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeStore {
    state: Arc<RwLock<MemoryState>>,
    locks: Arc<DashMap<DataroomId, Arc<Mutex<()>>>>,
    injected_conflicts: Arc<AtomicU32>,
}

impl MemoryTreeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail with a retryable transaction conflict.
    pub fn inject_commit_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Add a dataroom directly.
    pub async fn seed_dataroom(&self, team_id: TeamId, name: &str) -> Dataroom {
        let now = Utc::now();
        let dataroom = Dataroom {
            id: DataroomId::new(),
            team_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.datarooms.insert(dataroom.id, dataroom.clone());
        dataroom
    }

    /// Add a document to the team library directly.
    pub async fn seed_document(
        &self,
        team_id: TeamId,
        folder_id: Option<FolderId>,
        name: &str,
    ) -> Document {
        let document = Document {
            id: DocumentId::new(),
            team_id,
            folder_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.documents.insert(document.id, document.clone());
        document
    }

    /// Add a regular team folder directly.
    pub async fn seed_team_folder(
        &self,
        team_id: TeamId,
        parent: Option<&TeamFolder>,
        name: &str,
    ) -> TeamFolder {
        let segment = name.to_lowercase().replace(' ', "-");
        let path = match parent {
            Some(p) => format!("{}/{}", p.path, segment),
            None => format!("/{segment}"),
        };
        let folder = TeamFolder {
            id: FolderId::new(),
            team_id,
            parent_id: parent.map(|p| p.id),
            name: name.to_string(),
            path,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.team_folders.insert(folder.id, folder.clone());
        folder
    }

    /// Add a dataroom folder directly, bypassing every check.
    pub async fn seed_folder(
        &self,
        dataroom_id: DataroomId,
        parent_id: Option<DataroomFolderId>,
        name: &str,
        path: &str,
        order_index: Option<i32>,
    ) -> DataroomFolder {
        let now = Utc::now();
        let folder = DataroomFolder {
            id: DataroomFolderId::new(),
            dataroom_id,
            parent_id,
            name: name.to_string(),
            path: path.to_string(),
            order_index,
            hierarchical_index: None,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state
            .folders
            .entry(dataroom_id)
            .or_default()
            .push(folder.clone());
        folder
    }

    /// Place a seeded document directly, bypassing every check.
    pub async fn seed_placement(
        &self,
        dataroom_id: DataroomId,
        document: &Document,
        folder_id: Option<DataroomFolderId>,
        order_index: Option<i32>,
    ) -> DataroomDocument {
        let now = Utc::now();
        let placement = DataroomDocument {
            id: DataroomDocumentId::new(),
            dataroom_id,
            document_id: document.id,
            folder_id,
            order_index,
            hierarchical_index: None,
            document_name: document.name.clone(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state
            .placements
            .entry(dataroom_id)
            .or_default()
            .push(placement.clone());
        placement
    }

    /// Committed folders of a dataroom.
    pub async fn folders(&self, dataroom_id: DataroomId) -> Vec<DataroomFolder> {
        let state = self.state.read().await;
        state.folders.get(&dataroom_id).cloned().unwrap_or_default()
    }

    /// Committed placements of a dataroom.
    pub async fn placements(&self, dataroom_id: DataroomId) -> Vec<DataroomDocument> {
        let state = self.state.read().await;
        state.placements.get(&dataroom_id).cloned().unwrap_or_default()
    }

    /// Number of committed datarooms.
    pub async fn dataroom_count(&self) -> usize {
        self.state.read().await.datarooms.len()
    }

    async fn lock(&self, dataroom_id: DataroomId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(dataroom_id).or_default().clone();
        lock.lock_owned().await
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn begin(
        &self,
        dataroom_id: DataroomId,
        _isolation: IsolationLevel,
    ) -> AppResult<Box<dyn TreeTransaction>> {
        let guard = self.lock(dataroom_id).await;
        let state = self.state.read().await;
        let dataroom = state
            .datarooms
            .get(&dataroom_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Dataroom {dataroom_id} not found")))?;

        Ok(Box::new(MemoryTreeTransaction {
            _guard: guard,
            store: self.clone(),
            folders: state.folders.get(&dataroom_id).cloned().unwrap_or_default(),
            placements: state.placements.get(&dataroom_id).cloned().unwrap_or_default(),
            dataroom,
            is_new: false,
            path_check_deferred: false,
        }))
    }

    async fn begin_new_dataroom(
        &self,
        data: &CreateDataroom,
    ) -> AppResult<Box<dyn TreeTransaction>> {
        let guard = self.lock(data.id).await;
        if self.state.read().await.datarooms.contains_key(&data.id) {
            return Err(AppError::conflict(format!("Dataroom {} already exists", data.id)));
        }

        let now = Utc::now();
        Ok(Box::new(MemoryTreeTransaction {
            _guard: guard,
            store: self.clone(),
            dataroom: Dataroom {
                id: data.id,
                team_id: data.team_id,
                name: data.name.clone(),
                created_at: now,
                updated_at: now,
            },
            folders: Vec::new(),
            placements: Vec::new(),
            is_new: true,
            path_check_deferred: false,
        }))
    }

    async fn find_dataroom(&self, dataroom_id: DataroomId) -> AppResult<Option<Dataroom>> {
        Ok(self.state.read().await.datarooms.get(&dataroom_id).cloned())
    }

    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>> {
        Ok(self.state.read().await.documents.get(&document_id).cloned())
    }

    async fn load_team_folder_subtree(
        &self,
        team_id: TeamId,
        folder_id: FolderId,
    ) -> AppResult<Option<FolderSubtree>> {
        let state = self.state.read().await;
        let Some(root) = state
            .team_folders
            .get(&folder_id)
            .filter(|f| f.team_id == team_id)
            .cloned()
        else {
            return Ok(None);
        };

        let mut folders = Vec::new();
        let mut queue = VecDeque::from([root.id]);
        while let Some(parent) = queue.pop_front() {
            for child in state
                .team_folders
                .values()
                .filter(|f| f.parent_id == Some(parent))
            {
                queue.push_back(child.id);
                folders.push(child.clone());
            }
        }
        folders.sort_by(|a, b| a.path.cmp(&b.path));

        let mut in_subtree: HashSet<FolderId> = folders.iter().map(|f| f.id).collect();
        in_subtree.insert(root.id);
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|d| d.team_id == team_id && d.folder_id.is_some_and(|f| in_subtree.contains(&f)))
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(FolderSubtree {
            root,
            folders,
            documents,
        }))
    }
}

struct MemoryTreeTransaction {
    _guard: OwnedMutexGuard<()>,
    store: MemoryTreeStore,
    dataroom: Dataroom,
    is_new: bool,
    folders: Vec<DataroomFolder>,
    placements: Vec<DataroomDocument>,
    path_check_deferred: bool,
}

impl MemoryTreeTransaction {
    fn duplicate_path(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.folders
            .iter()
            .find(|f| !seen.insert(f.path.as_str()))
            .map(|f| f.path.as_str())
    }
}

fn path_conflict(path: &str) -> AppError {
    AppError::conflict(format!(
        "Folder path '{path}' already exists in this dataroom"
    ))
}

#[async_trait]
impl TreeTransaction for MemoryTreeTransaction {
    fn dataroom(&self) -> &Dataroom {
        &self.dataroom
    }

    async fn folders(&mut self) -> AppResult<Vec<DataroomFolder>> {
        Ok(self.folders.clone())
    }

    async fn placements(&mut self) -> AppResult<Vec<DataroomDocument>> {
        Ok(self.placements.clone())
    }

    async fn write_folder_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomFolderId>],
    ) -> AppResult<u64> {
        let wanted: HashMap<_, _> = batch
            .iter()
            .map(|w| (w.id, w.hierarchical_index.as_deref()))
            .collect();
        let mut updated = 0;
        for folder in &mut self.folders {
            if let Some(index) = wanted.get(&folder.id) {
                folder.hierarchical_index = (*index).map(str::to_string);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn write_document_indexes(
        &mut self,
        batch: &[IndexWrite<DataroomDocumentId>],
    ) -> AppResult<u64> {
        let wanted: HashMap<_, _> = batch
            .iter()
            .map(|w| (w.id, w.hierarchical_index.as_deref()))
            .collect();
        let mut updated = 0;
        for placement in &mut self.placements {
            if let Some(index) = wanted.get(&placement.id) {
                placement.hierarchical_index = (*index).map(str::to_string);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn relocate_folders(&mut self, batch: &[FolderRelocation]) -> AppResult<u64> {
        self.path_check_deferred = true;
        let wanted: HashMap<_, _> = batch.iter().map(|r| (r.id, r)).collect();
        let now = Utc::now();
        let mut updated = 0;
        for folder in &mut self.folders {
            if let Some(relocation) = wanted.get(&folder.id) {
                if relocation.moved {
                    folder.parent_id = relocation.parent_id;
                    folder.order_index = None;
                }
                folder.path = relocation.path.clone();
                folder.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn write_folder_order(
        &mut self,
        batch: &[OrderWrite<DataroomFolderId>],
    ) -> AppResult<u64> {
        let wanted: HashMap<_, _> = batch.iter().map(|w| (w.id, w.order_index)).collect();
        let mut updated = 0;
        for folder in &mut self.folders {
            if let Some(order_index) = wanted.get(&folder.id) {
                folder.order_index = *order_index;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn write_document_order(
        &mut self,
        batch: &[OrderWrite<DataroomDocumentId>],
    ) -> AppResult<u64> {
        let wanted: HashMap<_, _> = batch.iter().map(|w| (w.id, w.order_index)).collect();
        let mut updated = 0;
        for placement in &mut self.placements {
            if let Some(order_index) = wanted.get(&placement.id) {
                placement.order_index = *order_index;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn insert_folders(&mut self, rows: &[NewDataroomFolder]) -> AppResult<u64> {
        let now = Utc::now();
        for row in rows {
            if row.dataroom_id != self.dataroom.id {
                return Err(AppError::database(
                    "Failed to create folders: row belongs to another dataroom",
                ));
            }
            if let Some(parent) = row.parent_id {
                if !self.folders.iter().any(|f| f.id == parent) {
                    return Err(AppError::database(
                        "Failed to create folders: parent folder does not exist",
                    ));
                }
            }
            if !self.path_check_deferred && self.folders.iter().any(|f| f.path == row.path) {
                return Err(path_conflict(&row.path));
            }
            self.folders.push(DataroomFolder {
                id: row.id,
                dataroom_id: row.dataroom_id,
                parent_id: row.parent_id,
                name: row.name.clone(),
                path: row.path.clone(),
                order_index: None,
                hierarchical_index: None,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(rows.len() as u64)
    }

    async fn insert_placements(&mut self, rows: &[NewDataroomDocument]) -> AppResult<u64> {
        let now = Utc::now();
        let state = self.store.state.read().await;
        for row in rows {
            let document = state.documents.get(&row.document_id).ok_or_else(|| {
                AppError::database("Failed to create placements: document does not exist")
            })?;
            if let Some(folder) = row.folder_id {
                if !self.folders.iter().any(|f| f.id == folder) {
                    return Err(AppError::database(
                        "Failed to create placements: folder does not exist",
                    ));
                }
            }
            self.placements.push(DataroomDocument {
                id: row.id,
                dataroom_id: row.dataroom_id,
                document_id: row.document_id,
                folder_id: row.folder_id,
                order_index: None,
                hierarchical_index: None,
                document_name: document.name.clone(),
                created_at: now,
                updated_at: now,
            });
        }
        Ok(rows.len() as u64)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let pending = &self.store.injected_conflicts;
        if pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(AppError::transaction_conflict(
                "Failed to commit transaction: concurrent update detected",
            ));
        }

        if let Some(path) = self.duplicate_path() {
            return Err(path_conflict(path));
        }

        let this = *self;
        let mut state = this.store.state.write().await;
        let id = this.dataroom.id;
        if this.is_new {
            state.datarooms.insert(id, this.dataroom);
        }
        state.folders.insert(id, this.folders);
        state.placements.insert(id, this.placements);
        Ok(())
    }
}
