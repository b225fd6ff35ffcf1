//! Context carrying who performs an operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dataroom_core::types::id::UserId;

/// Context for the current operation.
///
/// Passed into service methods whose side effects depend on the actor,
/// such as change notifications that skip the user who made the change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Acting user, `None` for system and operator actions.
    pub user_id: Option<UserId>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context for an action taken by a user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            request_time: Utc::now(),
        }
    }

    /// Context for an action with no user behind it.
    pub fn system() -> Self {
        Self {
            user_id: None,
            request_time: Utc::now(),
        }
    }
}
