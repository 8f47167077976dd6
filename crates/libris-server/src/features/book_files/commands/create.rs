//! Record a stored upload
//!
//! The bytes are already on disk when this runs; the command only persists
//! the metadata row that ties them to a publishing house.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::catalog::FILE_COLUMNS;
use crate::features::shared::error_helpers::map_foreign_key_violation;
use crate::features::shared::validation::{
    validate_text, FieldValidationError, MAX_LANG_LENGTH, MAX_NAME_LENGTH,
};
use crate::models::BookFile;

/// Longest accepted file extension; shares the column width of `lang`
pub const MAX_FILE_TYPE_LENGTH: usize = MAX_LANG_LENGTH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookFileCommand {
    pub publishing_house_id: Uuid,
    pub file_name: String,
    pub path: String,
    pub file_type: String,
    pub size: i64,
    /// Hex-encoded SHA-256 of the stored bytes
    pub checksum: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateBookFileError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),

    #[error("File type must be at most {} characters", MAX_FILE_TYPE_LENGTH)]
    FileTypeLength,

    #[error("Checksum must be 64 hexadecimal characters")]
    ChecksumFormat,

    #[error("Publishing house '{0}' not found")]
    HouseNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<BookFile, CreateBookFileError>> for CreateBookFileCommand {}

impl crate::cqrs::middleware::Command for CreateBookFileCommand {}

impl CreateBookFileCommand {
    pub fn validate(&self) -> Result<(), CreateBookFileError> {
        validate_text("file_name", &self.file_name, MAX_NAME_LENGTH)?;
        validate_text("path", &self.path, 1024)?;
        if self.size < 0 {
            return Err(FieldValidationError::Negative { field: "size" }.into());
        }
        if self.file_type.chars().count() > MAX_FILE_TYPE_LENGTH {
            return Err(CreateBookFileError::FileTypeLength);
        }
        if self.checksum.len() != 64 || !self.checksum.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CreateBookFileError::ChecksumFormat);
        }
        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, command),
    fields(house_id = %command.publishing_house_id, file_name = %command.file_name, size = command.size)
)]
pub async fn handle(
    pool: PgPool,
    command: CreateBookFileCommand,
) -> Result<BookFile, CreateBookFileError> {
    command.validate()?;

    let sql = format!(
        "INSERT INTO book_files (publishing_house_id, file_name, path, file_type, size, checksum) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {FILE_COLUMNS}"
    );
    let file: BookFile = sqlx::query_as(&sql)
        .bind(command.publishing_house_id)
        .bind(&command.file_name)
        .bind(&command.path)
        .bind(&command.file_type)
        .bind(command.size)
        .bind(&command.checksum)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            map_foreign_key_violation(
                e,
                CreateBookFileError::HouseNotFound(command.publishing_house_id),
                CreateBookFileError::Database,
            )
        })?;

    tracing::info!(file_id = %file.id, "Book file recorded");

    Ok(file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn command() -> CreateBookFileCommand {
        CreateBookFileCommand {
            publishing_house_id: Uuid::new_v4(),
            file_name: "walden.epub".to_string(),
            path: "./temp/3f1c.epub".to_string(),
            file_type: "epub".to_string(),
            size: 512,
            checksum: "ab".repeat(32),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_file_name() {
        let mut cmd = command();
        cmd.file_name = String::new();
        assert!(matches!(cmd.validate(), Err(CreateBookFileError::Validation(_))));
    }

    #[test]
    fn test_validation_file_type_too_long() {
        let mut cmd = command();
        cmd.file_type = "e".repeat(MAX_FILE_TYPE_LENGTH + 1);
        assert!(matches!(cmd.validate(), Err(CreateBookFileError::FileTypeLength)));
    }

    #[test]
    fn test_validation_empty_file_type_is_allowed() {
        let mut cmd = command();
        cmd.file_type = String::new();
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_validation_bad_checksum() {
        let mut cmd = command();
        cmd.checksum = "xyz".to_string();
        assert!(matches!(cmd.validate(), Err(CreateBookFileError::ChecksumFormat)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_handle_unknown_house(pool: PgPool) -> sqlx::Result<()> {
        let result = handle(pool, command()).await;
        assert!(matches!(result, Err(CreateBookFileError::HouseNotFound(_))));
        Ok(())
    }
}
