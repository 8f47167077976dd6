//! Update publishing house command
//!
//! Partial update. When `book_id` is given the house moves to that book;
//! otherwise it stays with its current one.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::HOUSE_COLUMNS;
use crate::features::shared::error_helpers::is_foreign_key_violation;
use crate::features::shared::validation::{
    validate_optional_text, FieldValidationError, MAX_LANG_LENGTH, MAX_NAME_LENGTH,
};
use crate::models::PublishingHouse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePublishingHouseCommand {
    #[serde(skip)]
    pub id: Uuid,
    /// Target book, taken from the `book_id` query parameter
    #[serde(skip)]
    pub book_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdatePublishingHouseError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error("{0}")]
    Validation(#[from] FieldValidationError),
    #[error("Publishing house '{0}' not found")]
    NotFound(Uuid),
    #[error("Book '{0}' not found")]
    BookNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<PublishingHouse, UpdatePublishingHouseError>> for UpdatePublishingHouseCommand {}

impl crate::cqrs::middleware::Command for UpdatePublishingHouseCommand {}

impl UpdatePublishingHouseCommand {
    pub fn validate(&self) -> Result<(), UpdatePublishingHouseError> {
        if self.book_id.is_none() && self.name.is_none() && self.lang.is_none() {
            return Err(UpdatePublishingHouseError::NoFieldsToUpdate);
        }
        validate_optional_text("name", self.name.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("lang", self.lang.as_deref(), MAX_LANG_LENGTH)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(house_id = %command.id, book_id = ?command.book_id))]
pub async fn handle(
    pool: PgPool,
    command: UpdatePublishingHouseCommand,
) -> Result<PublishingHouse, UpdatePublishingHouseError> {
    command.validate()?;

    let sql = format!(
        "UPDATE publishing_houses \
         SET book_id = COALESCE($2, book_id), \
             name = COALESCE($3, name), \
             lang = COALESCE($4, lang), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {HOUSE_COLUMNS}"
    );
    let house: Option<PublishingHouse> = sqlx::query_as(&sql)
        .bind(command.id)
        .bind(command.book_id)
        .bind(command.name.as_deref().map(str::trim))
        .bind(command.lang.as_deref().map(str::trim))
        .fetch_optional(&pool)
        .await
        .map_err(|e| match command.book_id {
            Some(book_id) if is_foreign_key_violation(&e) => {
                UpdatePublishingHouseError::BookNotFound(book_id)
            },
            _ => UpdatePublishingHouseError::Database(e),
        })?;

    let house = house.ok_or(UpdatePublishingHouseError::NotFound(command.id))?;
    tracing::info!("Publishing house updated");

    Ok(house)
}
