//! Dataroom repository implementation.

use sqlx::PgExecutor;

use dataroom_core::result::AppResult;
use dataroom_core::types::id::DataroomId;
use dataroom_entity::dataroom::{CreateDataroom, Dataroom};

use crate::error::map_db_error;

/// Fetch one dataroom row.
pub async fn fetch<'e, E>(executor: E, id: DataroomId) -> AppResult<Option<Dataroom>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Dataroom>("SELECT * FROM datarooms WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_db_error("Failed to find dataroom", e))
}

/// Insert a dataroom row with its pre-assigned ID.
pub async fn insert<'e, E>(executor: E, data: &CreateDataroom) -> AppResult<Dataroom>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Dataroom>(
        "INSERT INTO datarooms (id, team_id, name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(data.id)
    .bind(data.team_id)
    .bind(&data.name)
    .fetch_one(executor)
    .await
    .map_err(|e| map_db_error("Failed to create dataroom", e))
}

/// Block until this transaction holds the structural lock of a dataroom.
///
/// The lock is transaction-scoped and released on commit or rollback.
pub async fn lock<'e, E>(executor: E, id: DataroomId) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(id.to_string())
        .execute(executor)
        .await
        .map_err(|e| map_db_error("Failed to lock dataroom", e))?;
    Ok(())
}

/// Bump the dataroom row as the last write of a transaction.
///
/// Under REPEATABLE READ this fails with a serialization error when another
/// transaction on the same dataroom committed after this one took its
/// snapshot.
pub async fn touch<'e, E>(executor: E, id: DataroomId) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE datarooms SET updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| map_db_error("Failed to update dataroom", e))?;
    Ok(())
}
