//! Book API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/books` - Create a new book
//! - `GET /api/v1/books` - List books with pagination and search
//! - `GET /api/v1/books/:id` - Get a book with its publishing houses and files
//! - `PUT /api/v1/books/:id` - Update a book
//! - `DELETE /api/v1/books/:id` - Delete a book and everything it owns

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::error::internal_error;
use crate::features::FeatureState;
use crate::storage::FileStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    commands::{
        CreateBookCommand, CreateBookError, DeleteBookCommand, DeleteBookError,
        UpdateBookCommand, UpdateBookError,
    },
    queries::{GetBookError, GetBookQuery, ListBooksError, ListBooksQuery},
};

pub fn books_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/:id", get(get_book).put(update_book).delete(delete_book))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Create a new book
///
/// # Endpoint
///
/// `POST /api/v1/books`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Dune",
///   "author": "Frank Herbert",
///   "description": "Desert planet",
///   "page_count": 412
/// }
/// ```
///
/// # Response
///
/// - `201 Created` - Book created
/// - `400 Bad Request` - Validation error
#[tracing::instrument(skip(pool, command), fields(title = %command.title))]
async fn create_book(
    State(pool): State<PgPool>,
    Json(command): Json<CreateBookCommand>,
) -> Result<Response, BookApiError> {
    let book = super::commands::create::handle(pool, command).await?;

    tracing::info!(book_id = %book.id, "Book created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(book))).into_response())
}

/// Update an existing book
///
/// `PUT /api/v1/books/:id`. Only the fields present in the body change.
#[tracing::instrument(skip(pool, command), fields(book_id = %id))]
async fn update_book(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(mut command): Json<UpdateBookCommand>,
) -> Result<Response, BookApiError> {
    command.id = id;

    let book = super::commands::update::handle(pool, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(book))).into_response())
}

/// Delete a book
///
/// `DELETE /api/v1/books/:id`. Publishing houses and files go with it; the
/// stored files are removed from disk after the rows are gone.
#[tracing::instrument(skip(pool, store), fields(book_id = %id))]
async fn delete_book(
    State(pool): State<PgPool>,
    State(store): State<FileStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, BookApiError> {
    let response = super::commands::delete::handle(pool, DeleteBookCommand { id }).await?;
    store.remove_all(&response.file_paths).await;

    tracing::info!(deleted_files = response.deleted_files, "Book deleted via API");

    let body = json!({
        "id": response.id,
        "deleted_files": response.deleted_files,
        "message": format!("Book '{}' deleted", response.id),
    });
    Ok((StatusCode::OK, Json(ApiResponse::success(body))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// Get a book with its publishing houses and their files
#[tracing::instrument(skip(pool), fields(book_id = %id))]
async fn get_book(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, BookApiError> {
    let details = super::queries::get::handle(pool, GetBookQuery { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(details))).into_response())
}

/// List books
///
/// # Endpoint
///
/// `GET /api/v1/books?page=1&per_page=20&search=herbert`
#[tracing::instrument(
    skip(pool, query),
    fields(page = ?query.page, per_page = ?query.per_page)
)]
async fn list_books(
    State(pool): State<PgPool>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Response, BookApiError> {
    let response = super::queries::list::handle(pool, query).await?;

    tracing::debug!(
        count = response.items.len(),
        total = response.pagination.total,
        "Books listed via API"
    );

    let meta = json!({
        "pagination": response.pagination
    });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum BookApiError {
    Create(CreateBookError),
    Update(UpdateBookError),
    Delete(DeleteBookError),
    Get(GetBookError),
    List(ListBooksError),
}

impl From<CreateBookError> for BookApiError {
    fn from(err: CreateBookError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdateBookError> for BookApiError {
    fn from(err: UpdateBookError) -> Self {
        Self::Update(err)
    }
}

impl From<DeleteBookError> for BookApiError {
    fn from(err: DeleteBookError) -> Self {
        Self::Delete(err)
    }
}

impl From<GetBookError> for BookApiError {
    fn from(err: GetBookError) -> Self {
        Self::Get(err)
    }
}

impl From<ListBooksError> for BookApiError {
    fn from(err: ListBooksError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for BookApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            BookApiError::Create(CreateBookError::Validation(_))
            | BookApiError::Update(UpdateBookError::Validation(_))
            | BookApiError::Update(UpdateBookError::NoFieldsToUpdate)
            | BookApiError::List(ListBooksError::InvalidPagination(_)) => {
                ErrorResponse::new("VALIDATION_ERROR", message)
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            BookApiError::Update(UpdateBookError::NotFound(_))
            | BookApiError::Delete(DeleteBookError::NotFound(_))
            | BookApiError::Get(GetBookError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", message).into_response_with(StatusCode::NOT_FOUND)
            },
            BookApiError::Create(CreateBookError::Database(e))
            | BookApiError::Update(UpdateBookError::Database(e))
            | BookApiError::Delete(DeleteBookError::Database(e))
            | BookApiError::Get(GetBookError::Database(e))
            | BookApiError::List(ListBooksError::Database(e)) => internal_error(&e),
        }
    }
}

impl std::fmt::Display for BookApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create(e) => write!(f, "{}", e),
            Self::Update(e) => write!(f, "{}", e),
            Self::Delete(e) => write!(f, "{}", e),
            Self::Get(e) => write!(f, "{}", e),
            Self::List(e) => write!(f, "{}", e),
        }
    }
}
