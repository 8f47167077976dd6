//! List publishing houses query
//!
//! Paginated, newest first, optionally narrowed to one book or one language.
//! Each house carries its files.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::{self, HOUSE_COLUMNS};
use crate::features::shared::pagination::{Paginated, PaginationParams};
use crate::models::{PublishingHouse, PublishingHouseDetails};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPublishingHousesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<Uuid>,
    /// Exact language match, case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

pub type ListPublishingHousesResponse = Paginated<PublishingHouseDetails>;

#[derive(Debug, thiserror::Error)]
pub enum ListPublishingHousesError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListPublishingHousesResponse, ListPublishingHousesError>>
    for ListPublishingHousesQuery
{
}

impl crate::cqrs::middleware::Query for ListPublishingHousesQuery {}

impl ListPublishingHousesQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn validate(&self) -> Result<(), ListPublishingHousesError> {
        self.pagination()
            .validate()
            .map_err(ListPublishingHousesError::InvalidPagination)
    }
}

const FILTER: &str = "($1::UUID IS NULL OR book_id = $1) AND ($2::TEXT IS NULL OR LOWER(lang) = LOWER($2))";

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListPublishingHousesQuery,
) -> Result<ListPublishingHousesResponse, ListPublishingHousesError> {
    query.validate()?;

    let params = query.pagination();
    let lang = query.lang.as_deref().map(str::trim).filter(|l| !l.is_empty());

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM publishing_houses WHERE {FILTER}"))
            .bind(query.book_id)
            .bind(lang)
            .fetch_one(&pool)
            .await?;

    let sql = format!(
        "SELECT {HOUSE_COLUMNS} FROM publishing_houses \
         WHERE {FILTER} \
         ORDER BY created_at DESC, id \
         LIMIT $3 OFFSET $4"
    );
    let houses: Vec<PublishingHouse> = sqlx::query_as(&sql)
        .bind(query.book_id)
        .bind(lang)
        .bind(params.per_page())
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    let items = catalog::with_files(&pool, houses).await?;

    Ok(Paginated::from_items(items, &params, total))
}
