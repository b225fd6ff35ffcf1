//! Hierarchical index recomputation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dataroom_core::config::IndexingConfig;
use dataroom_core::error::{AppError, ErrorKind};
use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId};
use dataroom_database::store::{IndexWrite, IsolationLevel, TreeStore, TreeTransaction};
use dataroom_entity::folder::{NodeKind, TreeNode};

use super::index::{assign_indexes, to_tree_nodes};
use super::path::{PathMismatch, check_paths};
use super::tree::{Forest, UnreachableNode, build_forest};

/// Message of the error returned when recomputation gives up.
pub const RECOMPUTE_FAILED: &str = "Failed to calculate and update hierarchical indexes";

/// Rows written by one recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexUpdateSummary {
    /// Folder rows updated.
    pub folders_updated: u64,
    /// Placement rows updated.
    pub documents_updated: u64,
}

/// Result of a read-only consistency check of one dataroom.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    /// Folders whose path disagrees with their parent chain.
    pub path_mismatches: Vec<PathMismatch>,
    /// Rows not reachable from the root.
    pub unreachable: Vec<UnreachableNode>,
    /// Reachable rows whose stored index differs from a fresh computation.
    pub stale_indexes: usize,
}

impl IntegrityReport {
    /// Whether nothing needs attention.
    pub fn is_clean(&self) -> bool {
        self.path_mismatches.is_empty() && self.unreachable.is_empty() && self.stale_indexes == 0
    }
}

/// Computes and stores hierarchical indexes.
#[derive(Debug, Clone)]
pub struct HierarchyService {
    /// Transactional tree access.
    store: Arc<dyn TreeStore>,
    /// Batching and retry settings.
    config: IndexingConfig,
}

impl HierarchyService {
    /// Creates a new hierarchy service.
    pub fn new(store: Arc<dyn TreeStore>, config: IndexingConfig) -> Self {
        Self { store, config }
    }

    /// Recompute and store the index of every folder and placement.
    ///
    /// Runs in one repeatable-read transaction under the dataroom lock. A
    /// snapshot conflict is retried with exponential backoff; any other
    /// failure, or running out of retries, rolls everything back and
    /// returns a generic internal error. A missing dataroom is `NotFound`.
    pub async fn recompute_hierarchical_indexes(
        &self,
        dataroom_id: DataroomId,
    ) -> AppResult<IndexUpdateSummary> {
        let mut retries = 0;
        loop {
            match self.recompute_once(dataroom_id).await {
                Ok(summary) => {
                    info!(
                        dataroom_id = %dataroom_id,
                        folders_updated = summary.folders_updated,
                        documents_updated = summary.documents_updated,
                        "Hierarchical indexes recomputed"
                    );
                    return Ok(summary);
                }
                Err(e) if e.kind == ErrorKind::NotFound => return Err(e),
                Err(e) if e.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    let backoff = self.config.backoff_for(retries);
                    warn!(
                        dataroom_id = %dataroom_id,
                        attempt = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Index recomputation conflicted, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!(dataroom_id = %dataroom_id, error = %e, "Index recomputation failed");
                    return Err(AppError::with_source(ErrorKind::Internal, RECOMPUTE_FAILED, e));
                }
            }
        }
    }

    async fn recompute_once(&self, dataroom_id: DataroomId) -> AppResult<IndexUpdateSummary> {
        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::RepeatableRead)
            .await?;
        let summary = write_indexes(tx.as_mut(), self.config.batch_size).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Pre-order rows of a dataroom with freshly computed indexes.
    pub async fn tree(&self, dataroom_id: DataroomId) -> AppResult<Vec<TreeNode>> {
        let (forest, _) = self.snapshot(dataroom_id).await?;
        Ok(to_tree_nodes(&forest))
    }

    /// Check paths, reachability and stored indexes without changing anything.
    pub async fn check_integrity(&self, dataroom_id: DataroomId) -> AppResult<IntegrityReport> {
        let (forest, path_mismatches) = self.snapshot(dataroom_id).await?;
        let stale_indexes = {
            let stored: HashMap<(Uuid, NodeKind), Option<&str>> = forest
                .nodes
                .iter()
                .map(|n| ((n.id, n.kind), n.stored_index.as_deref()))
                .collect();
            assign_indexes(&forest)
                .iter()
                .filter(|fresh| {
                    stored.get(&(fresh.id, fresh.kind)).copied().flatten()
                        != Some(fresh.hierarchical_index.as_str())
                })
                .count()
        };

        Ok(IntegrityReport {
            path_mismatches,
            unreachable: forest.unreachable,
            stale_indexes,
        })
    }

    async fn snapshot(&self, dataroom_id: DataroomId) -> AppResult<(Forest, Vec<PathMismatch>)> {
        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::RepeatableRead)
            .await?;
        let folders = tx.folders().await?;
        let placements = tx.placements().await?;
        drop(tx);

        Ok((build_forest(&folders, &placements), check_paths(&folders)))
    }
}

/// Recompute indexes inside an open transaction and write them in batches.
///
/// Every batch goes through the same transaction, so the rewrite becomes
/// visible all at once on commit or not at all.
pub async fn write_indexes(
    tx: &mut dyn TreeTransaction,
    batch_size: usize,
) -> AppResult<IndexUpdateSummary> {
    let dataroom_id = tx.dataroom().id;
    let folders = tx.folders().await?;
    let placements = tx.placements().await?;
    let forest = build_forest(&folders, &placements);

    for node in &forest.unreachable {
        warn!(
            dataroom_id = %dataroom_id,
            node_id = %node.id,
            kind = %node.kind,
            reason = ?node.reason,
            "Node is not reachable from the dataroom root, clearing its index"
        );
    }

    // Unreachable rows are cleared so a stale index never duplicates a live one.
    let fresh = assign_indexes(&forest)
        .into_iter()
        .map(|node| (node.id, node.kind, Some(node.hierarchical_index)));
    let cleared = forest.unreachable.iter().map(|node| (node.id, node.kind, None));

    let mut folder_writes = Vec::with_capacity(folders.len());
    let mut document_writes = Vec::with_capacity(placements.len());
    for (id, kind, hierarchical_index) in fresh.chain(cleared) {
        match kind {
            NodeKind::Folder => folder_writes.push(IndexWrite {
                id: DataroomFolderId::from_uuid(id),
                hierarchical_index,
            }),
            NodeKind::Document => document_writes.push(IndexWrite {
                id: DataroomDocumentId::from_uuid(id),
                hierarchical_index,
            }),
        }
    }

    let batch_size = batch_size.max(1);
    let mut summary = IndexUpdateSummary::default();
    for (number, batch) in folder_writes.chunks(batch_size).enumerate() {
        summary.folders_updated += tx.write_folder_indexes(batch).await?;
        debug!(dataroom_id = %dataroom_id, batch = number + 1, rows = batch.len(), "Folder index batch written");
    }
    for (number, batch) in document_writes.chunks(batch_size).enumerate() {
        summary.documents_updated += tx.write_document_indexes(batch).await?;
        debug!(dataroom_id = %dataroom_id, batch = number + 1, rows = batch.len(), "Document index batch written");
    }

    Ok(summary)
}
