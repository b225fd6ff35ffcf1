//! Dataroom folder repository implementation.

use sqlx::PgExecutor;
use uuid::Uuid;

use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DataroomFolderId, DataroomId};
use dataroom_entity::folder::{DataroomFolder, NewDataroomFolder};

use crate::error::map_db_error;
use crate::store::{FolderRelocation, IndexWrite, OrderWrite};

/// Load every folder of a dataroom.
pub async fn load_all<'e, E>(executor: E, dataroom_id: DataroomId) -> AppResult<Vec<DataroomFolder>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DataroomFolder>(
        "SELECT * FROM dataroom_folders WHERE dataroom_id = $1 ORDER BY path ASC",
    )
    .bind(dataroom_id)
    .fetch_all(executor)
    .await
    .map_err(|e| map_db_error("Failed to load dataroom folders", e))
}

/// Insert staged folders in one statement.
pub async fn insert_batch<'e, E>(executor: E, rows: &[NewDataroomFolder]) -> AppResult<u64>
where
    E: PgExecutor<'e>,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id.into_uuid()).collect();
    let dataroom_ids: Vec<Uuid> = rows.iter().map(|r| r.dataroom_id.into_uuid()).collect();
    let parent_ids: Vec<Option<Uuid>> = rows
        .iter()
        .map(|r| r.parent_id.map(DataroomFolderId::into_uuid))
        .collect();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();

    let result = sqlx::query(
        "INSERT INTO dataroom_folders (id, dataroom_id, parent_id, name, path) \
         SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[], $5::text[])",
    )
    .bind(&ids)
    .bind(&dataroom_ids)
    .bind(&parent_ids)
    .bind(&names)
    .bind(&paths)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to create folders", e))?;

    Ok(result.rows_affected())
}

/// Store hierarchical indexes for a batch of folders.
pub async fn write_indexes<'e, E>(
    executor: E,
    dataroom_id: DataroomId,
    batch: &[IndexWrite<DataroomFolderId>],
) -> AppResult<u64>
where
    E: PgExecutor<'e>,
{
    if batch.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = batch.iter().map(|w| w.id.into_uuid()).collect();
    let indexes: Vec<Option<&str>> = batch
        .iter()
        .map(|w| w.hierarchical_index.as_deref())
        .collect();

    let result = sqlx::query(
        "UPDATE dataroom_folders AS f SET hierarchical_index = u.hierarchical_index \
         FROM UNNEST($1::uuid[], $2::text[]) AS u(id, hierarchical_index) \
         WHERE f.id = u.id AND f.dataroom_id = $3",
    )
    .bind(&ids)
    .bind(&indexes)
    .bind(dataroom_id)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to update folder indexes", e))?;

    Ok(result.rows_affected())
}

/// Apply new parents and paths for moved folders and their descendants.
pub async fn relocate<'e, E>(
    executor: E,
    dataroom_id: DataroomId,
    batch: &[FolderRelocation],
) -> AppResult<u64>
where
    E: PgExecutor<'e>,
{
    if batch.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = batch.iter().map(|r| r.id.into_uuid()).collect();
    let parent_ids: Vec<Option<Uuid>> = batch
        .iter()
        .map(|r| r.parent_id.map(DataroomFolderId::into_uuid))
        .collect();
    let paths: Vec<&str> = batch.iter().map(|r| r.path.as_str()).collect();
    let moved: Vec<bool> = batch.iter().map(|r| r.moved).collect();

    let result = sqlx::query(
        "UPDATE dataroom_folders AS f SET \
             parent_id = CASE WHEN u.moved THEN u.parent_id ELSE f.parent_id END, \
             order_index = CASE WHEN u.moved THEN NULL ELSE f.order_index END, \
             path = u.path, \
             updated_at = NOW() \
         FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::bool[]) \
              AS u(id, parent_id, path, moved) \
         WHERE f.id = u.id AND f.dataroom_id = $5",
    )
    .bind(&ids)
    .bind(&parent_ids)
    .bind(&paths)
    .bind(&moved)
    .bind(dataroom_id)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to move folders", e))?;

    Ok(result.rows_affected())
}

/// Postpone the path uniqueness check to commit time.
pub async fn defer_path_constraint<'e, E>(executor: E) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SET CONSTRAINTS dataroom_folders_dataroom_id_path_key DEFERRED")
        .execute(executor)
        .await
        .map_err(|e| map_db_error("Failed to defer folder path constraint", e))?;
    Ok(())
}

/// Store manual order overrides for folders.
pub async fn write_order<'e, E>(
    executor: E,
    dataroom_id: DataroomId,
    batch: &[OrderWrite<DataroomFolderId>],
) -> AppResult<u64>
where
    E: PgExecutor<'e>,
{
    if batch.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = batch.iter().map(|w| w.id.into_uuid()).collect();
    let orders: Vec<Option<i32>> = batch.iter().map(|w| w.order_index).collect();

    let result = sqlx::query(
        "UPDATE dataroom_folders AS f SET order_index = u.order_index, updated_at = NOW() \
         FROM UNNEST($1::uuid[], $2::int4[]) AS u(id, order_index) \
         WHERE f.id = u.id AND f.dataroom_id = $3",
    )
    .bind(&ids)
    .bind(&orders)
    .bind(dataroom_id)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to reorder folders", e))?;

    Ok(result.rows_affected())
}
