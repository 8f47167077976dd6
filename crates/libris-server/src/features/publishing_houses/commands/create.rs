//! Create publishing house command
//!
//! A publishing house always belongs to a book; the owning book id comes from
//! the request path.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::HOUSE_COLUMNS;
use crate::features::shared::error_helpers::map_foreign_key_violation;
use crate::features::shared::validation::{
    validate_text, FieldValidationError, MAX_LANG_LENGTH, MAX_NAME_LENGTH,
};
use crate::models::PublishingHouse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePublishingHouseCommand {
    #[serde(skip)]
    pub book_id: Uuid,
    pub name: String,
    pub lang: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePublishingHouseError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),

    #[error("Book '{0}' not found")]
    BookNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<PublishingHouse, CreatePublishingHouseError>> for CreatePublishingHouseCommand {}

impl crate::cqrs::middleware::Command for CreatePublishingHouseCommand {}

impl CreatePublishingHouseCommand {
    pub fn validate(&self) -> Result<(), CreatePublishingHouseError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_text("lang", &self.lang, MAX_LANG_LENGTH)?;
        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, command),
    fields(book_id = %command.book_id, name = %command.name)
)]
pub async fn handle(
    pool: PgPool,
    command: CreatePublishingHouseCommand,
) -> Result<PublishingHouse, CreatePublishingHouseError> {
    command.validate()?;

    let sql = format!(
        "INSERT INTO publishing_houses (book_id, name, lang) \
         VALUES ($1, $2, $3) \
         RETURNING {HOUSE_COLUMNS}"
    );
    let house: PublishingHouse = sqlx::query_as(&sql)
        .bind(command.book_id)
        .bind(command.name.trim())
        .bind(command.lang.trim())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            map_foreign_key_violation(
                e,
                CreatePublishingHouseError::BookNotFound(command.book_id),
                CreatePublishingHouseError::Database,
            )
        })?;

    tracing::info!(house_id = %house.id, "Publishing house created");

    Ok(house)
}
