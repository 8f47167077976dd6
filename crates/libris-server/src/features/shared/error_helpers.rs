//! Database error handling utilities
//!
//! # Examples
//!
//! ```rust,ignore
//! use libris_server::features::shared::error_helpers::map_foreign_key_violation;
//!
//! sqlx::query_as(...)
//!     .fetch_one(&pool)
//!     .await
//!     .map_err(|e| map_foreign_key_violation(e, BookNotFound(id), Database))?;
//! ```

use sqlx::Error as SqlxError;

/// Check if the error is a foreign key violation
pub fn is_foreign_key_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_foreign_key_violation();
    }
    false
}

/// Map a foreign key violation to `fk_error`, wrapping anything else
///
/// Used when inserting a child row whose parent may have been deleted in the
/// meantime: the violation means the parent no longer exists.
pub fn map_foreign_key_violation<E, F>(error: SqlxError, fk_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_foreign_key_violation(&error) {
        fk_error
    } else {
        default_wrapper(error)
    }
}
