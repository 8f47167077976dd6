//! Delete book command
//!
//! Deleting a book cascades to its publishing houses and their files. The
//! on-disk paths of the removed files are returned so the caller can clean
//! up storage.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookResponse {
    pub id: Uuid,
    pub deleted_files: usize,
    /// Disk locations of the files removed with the book
    #[serde(skip)]
    pub file_paths: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteBookError {
    #[error("Book '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteBookResponse, DeleteBookError>> for DeleteBookCommand {}

impl crate::cqrs::middleware::Command for DeleteBookCommand {}

#[tracing::instrument(skip(pool), fields(book_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: DeleteBookCommand,
) -> Result<DeleteBookResponse, DeleteBookError> {
    let mut tx = pool.begin().await?;

    let file_paths: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT f.path
        FROM book_files f
        JOIN publishing_houses h ON h.id = f.publishing_house_id
        WHERE h.book_id = $1
        "#,
    )
    .bind(command.id)
    .fetch_all(&mut *tx)
    .await?;

    let deleted: Option<Uuid> = sqlx::query_scalar("DELETE FROM books WHERE id = $1 RETURNING id")
        .bind(command.id)
        .fetch_optional(&mut *tx)
        .await?;

    let id = deleted.ok_or(DeleteBookError::NotFound(command.id))?;
    tx.commit().await?;

    tracing::info!(deleted_files = file_paths.len(), "Book deleted");

    Ok(DeleteBookResponse {
        id,
        deleted_files: file_paths.len(),
        file_paths,
    })
}
