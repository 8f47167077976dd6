//! Delete publishing house command
//!
//! Cascades to the house's files and hands back their disk paths.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePublishingHouseCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePublishingHouseResponse {
    pub id: Uuid,
    pub deleted_files: usize,
    #[serde(skip)]
    pub file_paths: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeletePublishingHouseError {
    #[error("Publishing house '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeletePublishingHouseResponse, DeletePublishingHouseError>>
    for DeletePublishingHouseCommand
{
}

impl crate::cqrs::middleware::Command for DeletePublishingHouseCommand {}

#[tracing::instrument(skip(pool), fields(house_id = %command.id))]
pub async fn handle(
    pool: PgPool,
    command: DeletePublishingHouseCommand,
) -> Result<DeletePublishingHouseResponse, DeletePublishingHouseError> {
    let mut tx = pool.begin().await?;

    let file_paths: Vec<String> =
        sqlx::query_scalar("SELECT path FROM book_files WHERE publishing_house_id = $1")
            .bind(command.id)
            .fetch_all(&mut *tx)
            .await?;

    let deleted: Option<Uuid> =
        sqlx::query_scalar("DELETE FROM publishing_houses WHERE id = $1 RETURNING id")
            .bind(command.id)
            .fetch_optional(&mut *tx)
            .await?;

    let id = deleted.ok_or(DeletePublishingHouseError::NotFound(command.id))?;
    tx.commit().await?;

    tracing::info!(deleted_files = file_paths.len(), "Publishing house deleted");

    Ok(DeletePublishingHouseResponse {
        id,
        deleted_files: file_paths.len(),
        file_paths,
    })
}
