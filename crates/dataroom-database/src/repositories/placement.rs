//! Document placement repository implementation.

use sqlx::PgExecutor;
use uuid::Uuid;

use dataroom_core::result::AppResult;
use dataroom_core::types::id::{DataroomDocumentId, DataroomFolderId, DataroomId};
use dataroom_entity::placement::{DataroomDocument, NewDataroomDocument};

use crate::error::map_db_error;
use crate::store::{IndexWrite, OrderWrite};

/// Placement columns joined with the underlying document's name.
const SELECT_PLACEMENTS: &str = "SELECT dd.id, dd.dataroom_id, dd.document_id, dd.folder_id, \
     dd.order_index, dd.hierarchical_index, d.name AS document_name, \
     dd.created_at, dd.updated_at \
     FROM dataroom_documents dd \
     INNER JOIN documents d ON d.id = dd.document_id";

/// Load every placement of a dataroom.
pub async fn load_all<'e, E>(executor: E, dataroom_id: DataroomId) -> AppResult<Vec<DataroomDocument>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DataroomDocument>(&format!(
        "{SELECT_PLACEMENTS} WHERE dd.dataroom_id = $1"
    ))
    .bind(dataroom_id)
    .fetch_all(executor)
    .await
    .map_err(|e| map_db_error("Failed to load dataroom documents", e))
}

/// Insert staged placements in one statement.
pub async fn insert_batch<'e, E>(executor: E, rows: &[NewDataroomDocument]) -> AppResult<u64>
where
    E: PgExecutor<'e>,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id.into_uuid()).collect();
    let dataroom_ids: Vec<Uuid> = rows.iter().map(|r| r.dataroom_id.into_uuid()).collect();
    let document_ids: Vec<Uuid> = rows.iter().map(|r| r.document_id.into_uuid()).collect();
    let folder_ids: Vec<Option<Uuid>> = rows
        .iter()
        .map(|r| r.folder_id.map(DataroomFolderId::into_uuid))
        .collect();

    let result = sqlx::query(
        "INSERT INTO dataroom_documents (id, dataroom_id, document_id, folder_id) \
         SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::uuid[])",
    )
    .bind(&ids)
    .bind(&dataroom_ids)
    .bind(&document_ids)
    .bind(&folder_ids)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to create placements", e))?;

    Ok(result.rows_affected())
}

/// Store hierarchical indexes for a batch of placements.
pub async fn write_indexes<'e, E>(
    executor: E,
    dataroom_id: DataroomId,
    batch: &[IndexWrite<DataroomDocumentId>],
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
        "UPDATE dataroom_documents AS dd SET hierarchical_index = u.hierarchical_index \
         FROM UNNEST($1::uuid[], $2::text[]) AS u(id, hierarchical_index) \
         WHERE dd.id = u.id AND dd.dataroom_id = $3",
    )
    .bind(&ids)
    .bind(&indexes)
    .bind(dataroom_id)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to update document indexes", e))?;

    Ok(result.rows_affected())
}

/// Store manual order overrides for placements.
pub async fn write_order<'e, E>(
    executor: E,
    dataroom_id: DataroomId,
    batch: &[OrderWrite<DataroomDocumentId>],
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
        "UPDATE dataroom_documents AS dd SET order_index = u.order_index, updated_at = NOW() \
         FROM UNNEST($1::uuid[], $2::int4[]) AS u(id, order_index) \
         WHERE dd.id = u.id AND dd.dataroom_id = $3",
    )
    .bind(&ids)
    .bind(&orders)
    .bind(dataroom_id)
    .execute(executor)
    .await
    .map_err(|e| map_db_error("Failed to reorder documents", e))?;

    Ok(result.rows_affected())
}
