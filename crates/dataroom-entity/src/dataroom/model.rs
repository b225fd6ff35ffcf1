//! Dataroom entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::id::{DataroomId, TeamId};

/// A collection of folders and document placements shared as one unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dataroom {
    /// Unique dataroom identifier.
    pub id: DataroomId,
    /// Owning team.
    pub team_id: TeamId,
    /// Display name.
    pub name: String,
    /// When the dataroom was created.
    pub created_at: DateTime<Utc>,
    /// When the dataroom was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new dataroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDataroom {
    /// Pre-assigned identifier so staged folders can reference it.
    pub id: DataroomId,
    /// Owning team.
    pub team_id: TeamId,
    /// Display name.
    pub name: String,
}

impl CreateDataroom {
    /// Stage a dataroom with a fresh identifier.
    pub fn new(team_id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id: DataroomId::new(),
            team_id,
            name: name.into(),
        }
    }
}
