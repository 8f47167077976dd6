//! Get publishing house query

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::{self, HOUSE_COLUMNS};
use crate::models::{BookFileView, PublishingHouse, PublishingHouseDetails};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPublishingHouseQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetPublishingHouseError {
    #[error("Publishing house '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<PublishingHouseDetails, GetPublishingHouseError>> for GetPublishingHouseQuery {}

impl crate::cqrs::middleware::Query for GetPublishingHouseQuery {}

#[tracing::instrument(skip(pool), fields(house_id = %query.id))]
pub async fn handle(
    pool: PgPool,
    query: GetPublishingHouseQuery,
) -> Result<PublishingHouseDetails, GetPublishingHouseError> {
    let sql = format!("SELECT {HOUSE_COLUMNS} FROM publishing_houses WHERE id = $1");
    let house: Option<PublishingHouse> = sqlx::query_as(&sql)
        .bind(query.id)
        .fetch_optional(&pool)
        .await?;
    let house = house.ok_or(GetPublishingHouseError::NotFound(query.id))?;

    let files = catalog::files_by_house(&pool, &[house.id])
        .await?
        .remove(&house.id)
        .unwrap_or_default()
        .into_iter()
        .map(BookFileView::from)
        .collect();

    Ok(PublishingHouseDetails { house, files })
}
