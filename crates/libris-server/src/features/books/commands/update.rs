//! Update book command
//!
//! Partially updates an existing book. Only the fields that are provided
//! will be updated; others remain unchanged.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{
    validate_non_negative, validate_optional_text, FieldValidationError, MAX_NAME_LENGTH,
};
use crate::models::Book;

/// Command to update an existing book
///
/// `id` comes from the request path; at least one other field must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookCommand {
    #[serde(skip)]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateBookError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error("{0}")]
    Validation(#[from] FieldValidationError),
    #[error("Book '{0}' not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Book, UpdateBookError>> for UpdateBookCommand {}

impl crate::cqrs::middleware::Command for UpdateBookCommand {}

impl UpdateBookCommand {
    pub fn validate(&self) -> Result<(), UpdateBookError> {
        if self.title.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.page_count.is_none()
        {
            return Err(UpdateBookError::NoFieldsToUpdate);
        }
        validate_optional_text("title", self.title.as_deref(), MAX_NAME_LENGTH)?;
        validate_optional_text("author", self.author.as_deref(), MAX_NAME_LENGTH)?;
        if let Some(pages) = self.page_count {
            validate_non_negative("page_count", pages)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(book_id = %command.id))]
pub async fn handle(pool: PgPool, command: UpdateBookCommand) -> Result<Book, UpdateBookError> {
    command.validate()?;

    let book: Option<Book> = sqlx::query_as(
        r#"
        UPDATE books
        SET title = COALESCE($2, title),
            author = COALESCE($3, author),
            description = COALESCE($4, description),
            page_count = COALESCE($5, page_count),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, author, description, page_count, created_at, updated_at
        "#,
    )
    .bind(command.id)
    .bind(command.title.as_deref().map(str::trim))
    .bind(command.author.as_deref().map(str::trim))
    .bind(&command.description)
    .bind(command.page_count)
    .fetch_optional(&pool)
    .await?;

    let book = book.ok_or(UpdateBookError::NotFound(command.id))?;
    tracing::info!("Book updated");

    Ok(book)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn empty(id: Uuid) -> UpdateBookCommand {
        UpdateBookCommand {
            id,
            title: None,
            author: None,
            description: None,
            page_count: None,
        }
    }

    #[test]
    fn test_validation_requires_a_field() {
        assert!(matches!(
            empty(Uuid::new_v4()).validate(),
            Err(UpdateBookError::NoFieldsToUpdate)
        ));
    }

    #[test]
    fn test_validation_blank_title() {
        let mut cmd = empty(Uuid::new_v4());
        cmd.title = Some(String::new());
        assert!(matches!(cmd.validate(), Err(UpdateBookError::Validation(_))));
    }

    #[test]
    fn test_validation_page_count_only() {
        let mut cmd = empty(Uuid::new_v4());
        cmd.page_count = Some(120);
        assert!(cmd.validate().is_ok());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_handle_missing_book(pool: PgPool) -> sqlx::Result<()> {
        let id = Uuid::new_v4();
        let mut cmd = empty(id);
        cmd.title = Some("Renamed".to_string());

        let result = handle(pool, cmd).await;
        assert!(matches!(result, Err(UpdateBookError::NotFound(missing)) if missing == id));
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_handle_keeps_unset_fields(pool: PgPool) -> sqlx::Result<()> {
        let created = super::super::create::handle(
            pool.clone(),
            super::super::create::CreateBookCommand {
                title: "Solaris".to_string(),
                author: "Stanisław Lem".to_string(),
                description: Some("Ocean".to_string()),
                page_count: Some(204),
            },
        )
        .await
        .unwrap();

        let mut cmd = empty(created.id);
        cmd.page_count = Some(210);
        let updated = handle(pool, cmd).await.unwrap();

        assert_eq!(updated.title, "Solaris");
        assert_eq!(updated.description.as_deref(), Some("Ocean"));
        assert_eq!(updated.page_count, Some(210));
        Ok(())
    }
}
