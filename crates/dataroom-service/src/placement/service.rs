//! Adding documents to a dataroom.

use std::sync::Arc;

use tracing::{info, warn};

use dataroom_core::config::NotificationConfig;
use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::traits::job_trigger::{JobRequest, JobTrigger};
use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId, DocumentId};
use dataroom_database::store::{IsolationLevel, TreeStore};
use dataroom_entity::job::JobPayload;
use dataroom_entity::placement::{DataroomDocument, NewDataroomDocument};

use crate::context::RequestContext;

/// Places documents into datarooms and announces the change.
#[derive(Debug, Clone)]
pub struct PlacementService {
    /// Transactional tree access.
    store: Arc<dyn TreeStore>,
    /// Background job backend.
    jobs: Arc<dyn JobTrigger>,
    /// Change-notification settings.
    notifications: NotificationConfig,
}

impl PlacementService {
    /// Creates a new placement service.
    pub fn new(
        store: Arc<dyn TreeStore>,
        jobs: Arc<dyn JobTrigger>,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            store,
            jobs,
            notifications,
        }
    }

    /// Places a team document into a dataroom folder, or at the root.
    ///
    /// Once the placement is committed a delayed change notification is
    /// scheduled. The notification is best effort: if scheduling fails the
    /// placement still stands.
    pub async fn add_document(
        &self,
        dataroom_id: DataroomId,
        document_id: DocumentId,
        folder_id: Option<DataroomFolderId>,
        actor: &RequestContext,
    ) -> AppResult<DataroomDocument> {
        let document = self
            .store
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))?;

        let mut tx = self
            .store
            .begin(dataroom_id, IsolationLevel::ReadCommitted)
            .await?;
        if document.team_id != tx.dataroom().team_id {
            return Err(AppError::not_found("Document not found"));
        }
        if let Some(folder_id) = folder_id {
            if !tx.folders().await?.iter().any(|f| f.id == folder_id) {
                return Err(AppError::not_found("Folder not found in this dataroom"));
            }
        }

        let row = NewDataroomDocument {
            id: DataroomDocumentId::new(),
            dataroom_id,
            document_id,
            folder_id,
        };
        tx.insert_placements(std::slice::from_ref(&row)).await?;
        let placement = tx
            .placements()
            .await?
            .into_iter()
            .find(|p| p.id == row.id)
            .ok_or_else(|| AppError::internal("Created placement could not be read back"))?;
        tx.commit().await?;

        info!(
            dataroom_id = %dataroom_id,
            placement_id = %placement.id,
            document_id = %document_id,
            "Document added to dataroom"
        );

        self.notify(&placement, actor).await;
        Ok(placement)
    }

    async fn notify(&self, placement: &DataroomDocument, actor: &RequestContext) {
        if !self.notifications.enabled {
            return;
        }

        let payload = JobPayload::DataroomChangeNotification {
            dataroom_id: placement.dataroom_id,
            dataroom_document_id: placement.id,
            sender_user_id: actor.user_id,
        };
        let request = match serde_json::to_value(&payload) {
            Ok(value) => JobRequest {
                job_type: payload.job_type().to_string(),
                queue: self.notifications.queue.clone(),
                payload: value,
                delay: self.notifications.delay(),
                max_attempts: self.notifications.max_attempts,
            },
            Err(e) => {
                warn!(error = %e, "Failed to encode change notification payload");
                return;
            }
        };

        if let Err(e) = self.jobs.trigger(request).await {
            warn!(
                dataroom_id = %placement.dataroom_id,
                placement_id = %placement.id,
                error = %e,
                "Failed to schedule change notification"
            );
        }
    }
}
