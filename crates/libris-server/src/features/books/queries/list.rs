//! List books query
//!
//! Paginated listing, newest first, with an optional case-insensitive
//! search over title and author.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::pagination::{Paginated, PaginationParams};
use crate::models::Book;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBooksQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    /// Substring matched against title or author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

pub type ListBooksResponse = Paginated<Book>;

#[derive(Debug, thiserror::Error)]
pub enum ListBooksError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListBooksResponse, ListBooksError>> for ListBooksQuery {}

impl crate::cqrs::middleware::Query for ListBooksQuery {}

impl ListBooksQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn validate(&self) -> Result<(), ListBooksError> {
        self.pagination()
            .validate()
            .map_err(ListBooksError::InvalidPagination)
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"))
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListBooksQuery,
) -> Result<ListBooksResponse, ListBooksError> {
    query.validate()?;

    let params = query.pagination();
    let pattern = query.search_pattern();

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM books
        WHERE $1::TEXT IS NULL OR title ILIKE $1 OR author ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;

    let books: Vec<Book> = sqlx::query_as(
        r#"
        SELECT id, title, author, description, page_count, created_at, updated_at
        FROM books
        WHERE $1::TEXT IS NULL OR title ILIKE $1 OR author ILIKE $1
        ORDER BY created_at DESC, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&pattern)
    .bind(params.per_page())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(books, &params, total))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_page_zero() {
        let query = ListBooksQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            query.validate(),
            Err(ListBooksError::InvalidPagination(_))
        ));
    }

    #[test]
    fn test_search_pattern() {
        let query = ListBooksQuery {
            search: Some("  le guin ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%le guin%"));

        let blank = ListBooksQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.search_pattern().is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_handle_paginates_and_filters(pool: PgPool) -> sqlx::Result<()> {
        for (title, author) in [
            ("Dune", "Frank Herbert"),
            ("Hyperion", "Dan Simmons"),
            ("Children of Dune", "Frank Herbert"),
        ] {
            sqlx::query("INSERT INTO books (title, author) VALUES ($1, $2)")
                .bind(title)
                .bind(author)
                .execute(&pool)
                .await?;
        }

        let page = handle(
            pool.clone(),
            ListBooksQuery {
                page: Some(1),
                per_page: Some(2),
                search: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert!(page.pagination.has_next);

        let filtered = handle(
            pool,
            ListBooksQuery {
                search: Some("herbert".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered.pagination.total, 2);
        Ok(())
    }
}
