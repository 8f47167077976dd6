//! Create book command
//!
//! # Architecture
//!
//! - Command: Pure data structure (no behavior except validation)
//! - Handler: Standalone async function with all business logic and DB operations

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::validation::{
    validate_non_negative, validate_text, FieldValidationError, MAX_NAME_LENGTH,
};
use crate::models::Book;

/// Command to create a new book
///
/// # Examples
///
/// ```rust,ignore
/// use libris_server::features::books::commands::CreateBookCommand;
///
/// let command = CreateBookCommand {
///     title: "The Left Hand of Darkness".to_string(),
///     author: "Ursula K. Le Guin".to_string(),
///     description: None,
///     page_count: Some(304),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookCommand {
    pub title: String,

    pub author: String,

    /// Free-form description; `desc` is accepted as an alias
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
}

/// Errors that can occur when creating a book
#[derive(Debug, thiserror::Error)]
pub enum CreateBookError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Book, CreateBookError>> for CreateBookCommand {}

impl crate::cqrs::middleware::Command for CreateBookCommand {}

impl CreateBookCommand {
    /// Validates the command parameters
    ///
    /// # Errors
    ///
    /// - Title and author must be 1-255 characters
    /// - Page count must not be negative
    pub fn validate(&self) -> Result<(), CreateBookError> {
        validate_text("title", &self.title, MAX_NAME_LENGTH)?;
        validate_text("author", &self.author, MAX_NAME_LENGTH)?;
        if let Some(pages) = self.page_count {
            validate_non_negative("page_count", pages)?;
        }
        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, command),
    fields(title = %command.title, author = %command.author)
)]
pub async fn handle(pool: PgPool, command: CreateBookCommand) -> Result<Book, CreateBookError> {
    command.validate()?;

    let book: Book = sqlx::query_as(
        r#"
        INSERT INTO books (title, author, description, page_count)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, author, description, page_count, created_at, updated_at
        "#,
    )
    .bind(command.title.trim())
    .bind(command.author.trim())
    .bind(&command.description)
    .bind(command.page_count)
    .fetch_one(&pool)
    .await?;

    tracing::info!(book_id = %book.id, "Book created");

    Ok(book)
}
