//! Get book file query
//!
//! Returns the stored row; the route uses its `path` to stream content.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::FILE_COLUMNS;
use crate::models::BookFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBookFileQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetBookFileError {
    #[error("Book file '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<BookFile, GetBookFileError>> for GetBookFileQuery {}

impl crate::cqrs::middleware::Query for GetBookFileQuery {}

#[tracing::instrument(skip(pool), fields(file_id = %query.id))]
pub async fn handle(pool: PgPool, query: GetBookFileQuery) -> Result<BookFile, GetBookFileError> {
    let sql = format!("SELECT {FILE_COLUMNS} FROM book_files WHERE id = $1");
    let file: Option<BookFile> = sqlx::query_as(&sql)
        .bind(query.id)
        .fetch_optional(&pool)
        .await?;

    file.ok_or(GetBookFileError::NotFound(query.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_handle_not_found(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool, GetBookFileQuery { id: Uuid::new_v4() }).await;
        assert!(matches!(result, Err(GetBookFileError::NotFound(_))));
        Ok(())
    }
}
