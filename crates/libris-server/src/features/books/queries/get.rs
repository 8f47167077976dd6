//! Get book query
//!
//! Returns a book together with its publishing houses and their files.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog;
use crate::models::{Book, BookDetails};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBookQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetBookError {
    #[error("Book '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<BookDetails, GetBookError>> for GetBookQuery {}

impl crate::cqrs::middleware::Query for GetBookQuery {}

#[tracing::instrument(skip(pool), fields(book_id = %query.id))]
pub async fn handle(pool: PgPool, query: GetBookQuery) -> Result<BookDetails, GetBookError> {
    let book: Option<Book> = sqlx::query_as(
        r#"
        SELECT id, title, author, description, page_count, created_at, updated_at
        FROM books
        WHERE id = $1
        "#,
    )
    .bind(query.id)
    .fetch_optional(&pool)
    .await?;

    let book = book.ok_or(GetBookError::NotFound(query.id))?;
    let publishing_houses = catalog::houses_for_book(&pool, book.id).await?;

    Ok(BookDetails {
        book,
        publishing_houses,
    })
}
