//! Materializing whole folder trees.
//!
//! Every operation stages its rows with a [`CopyPlan`] and inserts them in
//! a single transaction, so a failure leaves no partial copy behind.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use dataroom_core::config::IndexingConfig;
use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DataroomFolderId, DataroomId, FolderId, TeamId};
use dataroom_database::store::{IsolationLevel, TreeStore, TreeTransaction};
use dataroom_entity::dataroom::CreateDataroom;
use dataroom_entity::template::{TemplateFolder, builtin_template};

use crate::hierarchy::copy::CopyPlan;
use crate::hierarchy::service::HierarchyService;
use crate::hierarchy::tree::build_forest;

/// Suffix appended to the name of a duplicated dataroom.
const COPY_SUFFIX: &str = " (Copy)";

/// Creates datarooms and folder trees from existing structures.
#[derive(Debug, Clone)]
pub struct CopyService {
    /// Transactional tree access.
    store: Arc<dyn TreeStore>,
    /// Index recomputation after a copy.
    hierarchy: HierarchyService,
    /// Batching and follow-up settings.
    config: IndexingConfig,
}

impl CopyService {
    /// Creates a new copy service.
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

    /// Copies a dataroom with all its folders and placements.
    ///
    /// Placements of the copy point at the same documents as the source.
    /// Manual order and indexes are not carried over.
    pub async fn duplicate_dataroom(&self, source_id: DataroomId) -> AppResult<DataroomId> {
        let mut source = self
            .store
            .begin(source_id, IsolationLevel::RepeatableRead)
            .await?;
        let dataroom = source.dataroom().clone();
        let folders = source.folders().await?;
        let placements = source.placements().await?;
        // Read only: dropping rolls back and releases the source lock.
        drop(source);

        let forest = build_forest(&folders, &placements);
        if !forest.unreachable.is_empty() {
            warn!(
                dataroom_id = %source_id,
                skipped = forest.unreachable.len(),
                "Rows not reachable from the root are left out of the copy"
            );
        }
        let documents: HashMap<_, _> = placements
            .iter()
            .map(|p| (p.id.into_uuid(), p.document_id))
            .collect();

        let data = CreateDataroom::new(dataroom.team_id, format!("{}{COPY_SUFFIX}", dataroom.name));
        let plan = CopyPlan::from_forest(data.id, &forest, &documents);
        self.materialize_new(&data, plan).await?;

        info!(
            source_id = %source_id,
            dataroom_id = %data.id,
            "Dataroom duplicated"
        );
        Ok(data.id)
    }

    /// Creates template folders at the root of an existing dataroom.
    pub async fn apply_template(
        &self,
        dataroom_id: DataroomId,
        templates: &[TemplateFolder],
    ) -> AppResult<Vec<DataroomFolderId>> {
        validate_templates(templates)?;

        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::ReadCommitted)
            .await?;
        let existing = tx.folders().await?;
        let plan = CopyPlan::from_templates(dataroom_id, templates);

        let conflicts = plan.conflicts_with(&existing);
        if !conflicts.is_empty() {
            return Err(AppError::conflict(format!(
                "Folders already exist in this dataroom: {}",
                conflicts.join(", ")
            )));
        }

        let ids = plan.folders.iter().map(|f| f.id).collect();
        self.insert(tx.as_mut(), &plan).await?;
        tx.commit().await?;

        info!(
            dataroom_id = %dataroom_id,
            folders = plan.folders.len(),
            "Template applied"
        );
        self.reindex(dataroom_id).await;
        Ok(ids)
    }

    /// Creates a dataroom laid out by a built-in template.
    pub async fn create_from_template(
        &self,
        team_id: TeamId,
        name: &str,
        template_key: &str,
    ) -> AppResult<DataroomId> {
        let template = builtin_template(template_key)
            .ok_or_else(|| AppError::validation(format!("Unknown template '{template_key}'")))?;
        let name = dataroom_name(name)?;

        let data = CreateDataroom::new(team_id, name);
        let plan = CopyPlan::from_templates(data.id, &template.folders);
        self.materialize_new(&data, plan).await?;

        info!(
            dataroom_id = %data.id,
            template = template.key,
            "Dataroom created from template"
        );
        Ok(data.id)
    }

    /// Creates a dataroom from the contents of a regular team folder.
    ///
    /// The folder's subfolders become root folders of the new dataroom and
    /// its documents root placements, recursively. The dataroom is named
    /// after the folder unless a name is given.
    pub async fn create_from_folder(
        &self,
        team_id: TeamId,
        folder_id: FolderId,
        name: Option<&str>,
    ) -> AppResult<DataroomId> {
        let subtree = self
            .store
            .load_team_folder_subtree(team_id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        let name = dataroom_name(name.unwrap_or(&subtree.root.name))?;

        let data = CreateDataroom::new(team_id, name);
        let plan = CopyPlan::from_team_folder(data.id, &subtree);
        self.materialize_new(&data, plan).await?;

        info!(
            folder_id = %folder_id,
            dataroom_id = %data.id,
            "Dataroom created from folder"
        );
        Ok(data.id)
    }

    async fn materialize_new(&self, data: &CreateDataroom, plan: CopyPlan) -> AppResult<()> {
        let mut tx = self.store.begin_new_dataroom(data).await?;
        self.insert(tx.as_mut(), &plan).await?;
        tx.commit().await?;

        info!(
            dataroom_id = %data.id,
            folders = plan.folders.len(),
            placements = plan.placements.len(),
            "Dataroom materialized"
        );
        self.reindex(data.id).await;
        Ok(())
    }

    async fn insert(&self, tx: &mut dyn TreeTransaction, plan: &CopyPlan) -> AppResult<()> {
        let batch_size = self.config.batch_size.max(1);
        for batch in plan.folders.chunks(batch_size) {
            tx.insert_folders(batch).await?;
        }
        for batch in plan.placements.chunks(batch_size) {
            tx.insert_placements(batch).await?;
        }
        Ok(())
    }

    async fn reindex(&self, dataroom_id: DataroomId) {
        if !self.config.reindex_after_copy {
            return;
        }
        if let Err(e) = self.hierarchy.recompute_hierarchical_indexes(dataroom_id).await {
            warn!(
                dataroom_id = %dataroom_id,
                error = %e,
                "Index recomputation after copy failed"
            );
        }
    }
}

fn validate_templates(templates: &[TemplateFolder]) -> AppResult<()> {
    if templates.is_empty() {
        return Err(AppError::validation("Template has no folders"));
    }
    for template in templates {
        template
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid template folder: {e}")))?;
    }
    Ok(())
}

fn dataroom_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Dataroom name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataroom_core::error::ErrorKind;
    use dataroom_database::store::MemoryTreeStore;

    fn service(store: &MemoryTreeStore) -> CopyService {
        let config = IndexingConfig {
            retry_backoff_ms: 1,
            ..IndexingConfig::default()
        };
        let store: Arc<dyn TreeStore> = Arc::new(store.clone());
        CopyService::new(
            store.clone(),
            HierarchyService::new(store, config.clone()),
            config,
        )
    }

    #[tokio::test]
    async fn test_duplicate_preserves_shape_and_documents() {
        let store = MemoryTreeStore::new();
        let team = TeamId::new();
        let source = store.seed_dataroom(team, "Series A").await;
        let outer = store.seed_folder(source.id, None, "Outer", "/outer", Some(3)).await;
        let inner = store
            .seed_folder(source.id, Some(outer.id), "Inner", "/outer/inner", None)
            .await;
        let first = store.seed_document(team, None, "One.pdf").await;
        let second = store.seed_document(team, None, "Two.pdf").await;
        store.seed_placement(source.id, &first, Some(outer.id), Some(1)).await;
        store.seed_placement(source.id, &second, Some(inner.id), None).await;

        let copy_id = service(&store).duplicate_dataroom(source.id).await.unwrap();
        assert_ne!(copy_id, source.id);

        let copy = store.find_dataroom(copy_id).await.unwrap().unwrap();
        assert_eq!(copy.name, "Series A (Copy)");
        assert_eq!(copy.team_id, team);

        let folders = store.folders(copy_id).await;
        assert_eq!(folders.len(), 2);
        let new_outer = folders.iter().find(|f| f.path == "/outer").unwrap();
        let new_inner = folders.iter().find(|f| f.path == "/outer/inner").unwrap();
        assert_eq!(new_inner.parent_id, Some(new_outer.id));
        assert_ne!(new_outer.id, outer.id);
        assert_eq!(new_outer.order_index, None);

        let placements = store.placements(copy_id).await;
        assert_eq!(placements.len(), 2);
        let in_outer = placements.iter().find(|p| p.folder_id == Some(new_outer.id)).unwrap();
        let in_inner = placements.iter().find(|p| p.folder_id == Some(new_inner.id)).unwrap();
        assert_eq!(in_outer.document_id, first.id);
        assert_eq!(in_inner.document_id, second.id);
        assert_eq!(in_inner.hierarchical_index.as_deref(), Some("1.1.1"));

        assert_eq!(store.folders(source.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_duplicate_leaves_nothing() {
        let store = MemoryTreeStore::new();
        let team = TeamId::new();
        let source = store.seed_dataroom(team, "Deal").await;
        store.seed_folder(source.id, None, "Outer", "/outer", None).await;
        store.inject_commit_conflicts(1);

        let err = service(&store).duplicate_dataroom(source.id).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.dataroom_count().await, 1);
    }

    #[tokio::test]
    async fn test_apply_template_rejects_existing_root_paths() {
        let store = MemoryTreeStore::new();
        let dataroom = store.seed_dataroom(TeamId::new(), "Deal").await;
        store.seed_folder(dataroom.id, None, "Legal", "/legal", None).await;

        let templates = vec![
            TemplateFolder::leaf("Team"),
            TemplateFolder::with_children("Legal", vec![TemplateFolder::leaf("NDA")]),
        ];
        let err = service(&store)
            .apply_template(dataroom.id, &templates)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.message.ends_with(": Legal"));
        assert_eq!(store.folders(dataroom.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_template_creates_folders_in_order() {
        let store = MemoryTreeStore::new();
        let dataroom = store.seed_dataroom(TeamId::new(), "Deal").await;
        let templates = vec![TemplateFolder::with_children(
            "Finance",
            vec![TemplateFolder::leaf("Budgets"), TemplateFolder::leaf("Audits")],
        )];

        let ids = service(&store)
            .apply_template(dataroom.id, &templates)
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);

        let folders = store.folders(dataroom.id).await;
        let audits = folders.iter().find(|f| f.name == "Audits").unwrap();
        assert_eq!(audits.path, "/finance/audits");
        assert_eq!(audits.parent_id, Some(ids[0]));
        assert_eq!(audits.hierarchical_index.as_deref(), Some("1.1"));

        let err = service(&store)
            .apply_template(dataroom.id, &[TemplateFolder::leaf("")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_from_builtin_template() {
        let store = MemoryTreeStore::new();
        let team = TeamId::new();
        let service = service(&store);

        let id = service
            .create_from_template(team, "Project Atlas", "fundraising")
            .await
            .unwrap();
        let template = builtin_template("fundraising").unwrap();
        let expected: usize = template.folders.iter().map(TemplateFolder::folder_count).sum();
        assert_eq!(store.folders(id).await.len(), expected);
        assert!(crate::hierarchy::check_paths(&store.folders(id).await).is_empty());

        let err = service
            .create_from_template(team, "Project Atlas", "space-station")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_from_team_folder() {
        let store = MemoryTreeStore::new();
        let team = TeamId::new();
        let board = store.seed_team_folder(team, None, "Board").await;
        let minutes = store.seed_team_folder(team, Some(&board), "Minutes").await;
        let charter = store.seed_document(team, Some(board.id), "Charter.pdf").await;
        let january = store.seed_document(team, Some(minutes.id), "Jan.pdf").await;
        let service = service(&store);

        let id = service.create_from_folder(team, board.id, None).await.unwrap();
        let dataroom = store.find_dataroom(id).await.unwrap().unwrap();
        assert_eq!(dataroom.name, "Board");

        let folders = store.folders(id).await;
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, "/minutes");
        let placements = store.placements(id).await;
        let root = placements.iter().find(|p| p.folder_id.is_none()).unwrap();
        assert_eq!(root.document_id, charter.id);
        let nested = placements.iter().find(|p| p.folder_id == Some(folders[0].id)).unwrap();
        assert_eq!(nested.document_id, january.id);

        let err = service
            .create_from_folder(TeamId::new(), board.id, Some("Other"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
