//! Classification of SQLx errors into store errors.

use crate::domain::errors::StoreError;

/// Name of the partial unique index guarding live short codes.
pub const SHORT_CODE_UNIQUE_INDEX: &str = "short_links_code_active_idx";

/// Returns true if `e` is a unique violation on the live short code index.
pub fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(SHORT_CODE_UNIQUE_INDEX))
}

/// Maps a SQLx error to a [`StoreError`], keeping short code collisions distinct.
pub fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if is_unique_violation_on_code(&e) {
        return StoreError::UniqueViolation {
            constraint: SHORT_CODE_UNIQUE_INDEX.to_string(),
        };
    }

    StoreError::Database(e)
}
