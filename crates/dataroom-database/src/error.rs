//! Mapping of sqlx errors into [`AppError`].

use dataroom_core::error::{AppError, ErrorKind};

/// Unique constraint on `(dataroom_id, path)` for dataroom folders.
pub const FOLDER_PATH_CONSTRAINT: &str = "dataroom_folders_dataroom_id_path_key";

/// SQLSTATE codes PostgreSQL raises when a snapshot cannot be honoured.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a sqlx error and wrap it with `context`.
///
/// Serialization failures and deadlocks become retryable
/// [`ErrorKind::TransactionConflict`]; a violation of the folder path
/// constraint becomes [`ErrorKind::Conflict`].
pub fn map_db_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            if matches!(code.as_deref(), Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)) {
                ErrorKind::TransactionConflict
            } else if db_err.constraint() == Some(FOLDER_PATH_CONSTRAINT) {
                ErrorKind::Conflict
            } else {
                ErrorKind::Database
            }
        }
        _ => ErrorKind::Database,
    };

    let message = match kind {
        ErrorKind::TransactionConflict => format!("{context}: concurrent update detected"),
        ErrorKind::Conflict => format!("{context}: folder path already exists in this dataroom"),
        _ => context.to_string(),
    };
    AppError::with_source(kind, message, err)
}
