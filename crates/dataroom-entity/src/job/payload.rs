//! Typed job payload definitions.

use serde::{Deserialize, Serialize};

use dataroom_core::types::id::{DataroomDocumentId, DataroomId, UserId};

/// Typed payloads for known job types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum JobPayload {
    /// Tell dataroom viewers that new content was added.
    #[serde(rename = "dataroom_change_notification")]
    DataroomChangeNotification {
        /// The dataroom that changed.
        dataroom_id: DataroomId,
        /// The placement that was added.
        dataroom_document_id: DataroomDocumentId,
        /// User who made the change, excluded from the recipients.
        sender_user_id: Option<UserId>,
    },
}

impl JobPayload {
    /// The job type string stored alongside the payload.
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::DataroomChangeNotification { .. } => "dataroom_change_notification",
        }
    }
}
