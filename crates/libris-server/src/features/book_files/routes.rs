//! Book file API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/book-files/:publishing_house_id` - Upload a file (multipart field `file`)
//! - `GET /api/v1/book-files/:id` - File metadata
//! - `GET /api/v1/book-files/:id/content` - Stream the stored bytes
//!
//! Uploads are written to disk chunk by chunk before the row is recorded;
//! if recording fails the stored bytes are removed again.

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::db::catalog;
use crate::error::internal_error;
use crate::features::FeatureState;
use crate::models::BookFileView;
use crate::storage::FileStore;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

use super::{
    commands::{CreateBookFileCommand, CreateBookFileError},
    queries::{GetBookFileError, GetBookFileQuery},
};
use crate::features::shared::validation::{validate_text, MAX_NAME_LENGTH};

/// Name of the multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

pub fn book_files_routes(max_upload_bytes: usize) -> Router<FeatureState> {
    Router::new()
        .route(
            "/:id",
            post(upload_book_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .get(get_book_file),
        )
        .route("/:id/content", get(download_book_file))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Upload a file for a publishing house
///
/// # Endpoint
///
/// `POST /api/v1/book-files/:publishing_house_id` with a `multipart/form-data`
/// body whose `file` field holds the content.
///
/// # Response
///
/// - `201 Created` - File stored and recorded
/// - `400 Bad Request` - Missing `file` field, missing file name, malformed body
/// - `404 Not Found` - Publishing house does not exist
#[tracing::instrument(skip(pool, store, multipart), fields(house_id = %house_id))]
async fn upload_book_file(
    State(pool): State<PgPool>,
    State(store): State<FileStore>,
    Path(house_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, BookFileApiError> {
    let exists = catalog::house_exists(&pool, house_id)
        .await
        .map_err(CreateBookFileError::Database)?;
    if !exists {
        return Err(CreateBookFileError::HouseNotFound(house_id).into());
    }

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|name| name.trim().to_string())
            .unwrap_or_default();
        validate_text("file_name", &file_name, MAX_NAME_LENGTH)
            .map_err(CreateBookFileError::Validation)?;

        let stored = store
            .save_stream(&file_name, field)
            .await
            .map_err(BookFileApiError::Storage)?;

        let command = CreateBookFileCommand {
            publishing_house_id: house_id,
            file_name,
            path: stored.path.to_string_lossy().into_owned(),
            file_type: stored.file_type.clone(),
            size: i64::try_from(stored.size).unwrap_or(i64::MAX),
            checksum: stored.checksum.clone(),
        };

        return match super::commands::create::handle(pool, command).await {
            Ok(file) => {
                tracing::info!(
                    file_id = %file.id,
                    size = file.size,
                    checksum = %file.checksum,
                    "Book file uploaded via API"
                );
                let view = BookFileView::from(file);
                Ok((StatusCode::CREATED, Json(ApiResponse::success(view))).into_response())
            },
            Err(e) => {
                store.remove_all(&[&stored.path]).await;
                Err(e.into())
            },
        };
    }

    Err(BookFileApiError::MissingFile)
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(pool), fields(file_id = %id))]
async fn get_book_file(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, BookFileApiError> {
    let file = super::queries::get::handle(pool, GetBookFileQuery { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(BookFileView::from(file)))).into_response())
}

/// Stream a stored file back to the client
///
/// `GET /api/v1/book-files/:id/content`. The body is sent in chunks of the
/// configured storage chunk size.
#[tracing::instrument(skip(pool, store), fields(file_id = %id))]
async fn download_book_file(
    State(pool): State<PgPool>,
    State(store): State<FileStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, BookFileApiError> {
    let file = super::queries::get::handle(pool, GetBookFileQuery { id }).await?;

    let path = PathBuf::from(&file.path);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(BookFileApiError::ContentMissing(id));
    }
    let stream = store.open(&path).await.map_err(BookFileApiError::Storage)?;

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file.file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// `attachment` disposition carrying the original file name
fn content_disposition(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{sanitized}\"")
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum BookFileApiError {
    Create(CreateBookFileError),
    Get(GetBookFileError),
    Multipart(MultipartError),
    MissingFile,
    ContentMissing(Uuid),
    Storage(anyhow::Error),
}

impl From<CreateBookFileError> for BookFileApiError {
    fn from(err: CreateBookFileError) -> Self {
        Self::Create(err)
    }
}

impl From<GetBookFileError> for BookFileApiError {
    fn from(err: GetBookFileError) -> Self {
        Self::Get(err)
    }
}

impl From<MultipartError> for BookFileApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl IntoResponse for BookFileApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            BookFileApiError::Create(CreateBookFileError::Validation(_))
            | BookFileApiError::Create(CreateBookFileError::FileTypeLength)
            | BookFileApiError::Create(CreateBookFileError::ChecksumFormat)
            | BookFileApiError::MissingFile => ErrorResponse::new("VALIDATION_ERROR", message)
                .into_response_with(StatusCode::BAD_REQUEST),
            BookFileApiError::Multipart(e) => {
                ErrorResponse::new("VALIDATION_ERROR", e.body_text()).into_response_with(e.status())
            },
            BookFileApiError::Create(CreateBookFileError::HouseNotFound(_))
            | BookFileApiError::Get(GetBookFileError::NotFound(_))
            | BookFileApiError::ContentMissing(_) => {
                ErrorResponse::new("NOT_FOUND", message).into_response_with(StatusCode::NOT_FOUND)
            },
            BookFileApiError::Create(CreateBookFileError::Database(e))
            | BookFileApiError::Get(GetBookFileError::Database(e)) => internal_error(&e),
            BookFileApiError::Storage(e) => internal_error(&format!("{e:#}")),
        }
    }
}

impl std::fmt::Display for BookFileApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create(e) => write!(f, "{}", e),
            Self::Get(e) => write!(f, "{}", e),
            Self::Multipart(e) => write!(f, "{}", e),
            Self::MissingFile => write!(f, "Multipart field '{}' is required", FILE_FIELD),
            Self::ContentMissing(id) => write!(f, "Content of book file '{}' is missing", id),
            Self::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(BookFileApiError::MissingFile.to_string().contains("'file'"));
    }

    #[test]
    fn test_error_status_codes() {
        let missing = BookFileApiError::MissingFile.into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let house = BookFileApiError::Create(CreateBookFileError::HouseNotFound(Uuid::nil()))
            .into_response();
        assert_eq!(house.status(), StatusCode::NOT_FOUND);

        let storage = BookFileApiError::Storage(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_content_disposition_strips_quotes() {
        assert_eq!(
            content_disposition("my \"best\" book.pdf"),
            "attachment; filename=\"my _best_ book.pdf\""
        );
    }

    #[test]
    fn test_routes_structure() {
        let router = book_files_routes(1024);
        assert!(format!("{:?}", router).contains("Router"));
    }
}
