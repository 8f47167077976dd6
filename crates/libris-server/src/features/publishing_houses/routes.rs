//! Publishing house API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/publishing-houses/:book_id` - Create a house for a book
//! - `GET /api/v1/publishing-houses` - List houses (filters: `book_id`, `lang`)
//! - `GET /api/v1/publishing-houses/:id` - Get a house with its files
//! - `PUT /api/v1/publishing-houses/:id?book_id=` - Update, optionally moving it to another book
//! - `DELETE /api/v1/publishing-houses/:id` - Delete a house and its files
//!
//! The whole router sits behind the per-client rate limiter.

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::error::internal_error;
use crate::features::FeatureState;
use crate::storage::FileStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    commands::{
        CreatePublishingHouseCommand, CreatePublishingHouseError, DeletePublishingHouseCommand,
        DeletePublishingHouseError, UpdatePublishingHouseCommand, UpdatePublishingHouseError,
    },
    queries::{
        GetPublishingHouseError, GetPublishingHouseQuery, ListPublishingHousesError,
        ListPublishingHousesQuery,
    },
};

pub fn publishing_houses_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_publishing_houses))
        .route(
            "/:id",
            post(create_publishing_house)
                .get(get_publishing_house)
                .put(update_publishing_house)
                .delete(delete_publishing_house),
        )
}

/// Query string of `PUT /publishing-houses/:id`
#[derive(Debug, Default, Deserialize)]
struct UpdateParams {
    book_id: Option<Uuid>,
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Create a publishing house
///
/// # Endpoint
///
/// `POST /api/v1/publishing-houses/:book_id`
///
/// # Request Body
///
/// ```json
/// { "name": "Penguin Classics", "lang": "en" }
/// ```
///
/// # Response
///
/// - `201 Created`
/// - `400 Bad Request` - Validation error
/// - `404 Not Found` - The book does not exist
#[tracing::instrument(skip(pool, command), fields(book_id = %book_id))]
async fn create_publishing_house(
    State(pool): State<PgPool>,
    Path(book_id): Path<Uuid>,
    Json(mut command): Json<CreatePublishingHouseCommand>,
) -> Result<Response, PublishingHouseApiError> {
    command.book_id = book_id;

    let house = super::commands::create::handle(pool, command).await?;

    tracing::info!(house_id = %house.id, "Publishing house created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(house))).into_response())
}

#[tracing::instrument(skip(pool, command), fields(house_id = %id))]
async fn update_publishing_house(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Query(params): Query<UpdateParams>,
    Json(mut command): Json<UpdatePublishingHouseCommand>,
) -> Result<Response, PublishingHouseApiError> {
    command.id = id;
    command.book_id = params.book_id;

    let house = super::commands::update::handle(pool, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(house))).into_response())
}

#[tracing::instrument(skip(pool, store), fields(house_id = %id))]
async fn delete_publishing_house(
    State(pool): State<PgPool>,
    State(store): State<FileStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, PublishingHouseApiError> {
    let response =
        super::commands::delete::handle(pool, DeletePublishingHouseCommand { id }).await?;
    store.remove_all(&response.file_paths).await;

    let body = json!({
        "id": response.id,
        "deleted_files": response.deleted_files,
        "message": format!("Publishing house '{}' deleted", response.id),
    });
    Ok((StatusCode::OK, Json(ApiResponse::success(body))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(pool), fields(house_id = %id))]
async fn get_publishing_house(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, PublishingHouseApiError> {
    let details = super::queries::get::handle(pool, GetPublishingHouseQuery { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(details))).into_response())
}

#[tracing::instrument(
    skip(pool, query),
    fields(page = ?query.page, per_page = ?query.per_page, book_id = ?query.book_id)
)]
async fn list_publishing_houses(
    State(pool): State<PgPool>,
    Query(query): Query<ListPublishingHousesQuery>,
) -> Result<Response, PublishingHouseApiError> {
    let response = super::queries::list::handle(pool, query).await?;

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
enum PublishingHouseApiError {
    Create(CreatePublishingHouseError),
    Update(UpdatePublishingHouseError),
    Delete(DeletePublishingHouseError),
    Get(GetPublishingHouseError),
    List(ListPublishingHousesError),
}

impl From<CreatePublishingHouseError> for PublishingHouseApiError {
    fn from(err: CreatePublishingHouseError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdatePublishingHouseError> for PublishingHouseApiError {
    fn from(err: UpdatePublishingHouseError) -> Self {
        Self::Update(err)
    }
}

impl From<DeletePublishingHouseError> for PublishingHouseApiError {
    fn from(err: DeletePublishingHouseError) -> Self {
        Self::Delete(err)
    }
}

impl From<GetPublishingHouseError> for PublishingHouseApiError {
    fn from(err: GetPublishingHouseError) -> Self {
        Self::Get(err)
    }
}

impl From<ListPublishingHousesError> for PublishingHouseApiError {
    fn from(err: ListPublishingHousesError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for PublishingHouseApiError {
    fn into_response(self) -> Response {
        use PublishingHouseApiError as E;

        let message = self.to_string();
        match self {
            E::Create(CreatePublishingHouseError::Validation(_))
            | E::Update(UpdatePublishingHouseError::Validation(_))
            | E::Update(UpdatePublishingHouseError::NoFieldsToUpdate)
            | E::List(ListPublishingHousesError::InvalidPagination(_)) => {
                ErrorResponse::new("VALIDATION_ERROR", message)
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            E::Create(CreatePublishingHouseError::BookNotFound(_))
            | E::Update(UpdatePublishingHouseError::BookNotFound(_))
            | E::Update(UpdatePublishingHouseError::NotFound(_))
            | E::Delete(DeletePublishingHouseError::NotFound(_))
            | E::Get(GetPublishingHouseError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", message).into_response_with(StatusCode::NOT_FOUND)
            },
            E::Create(CreatePublishingHouseError::Database(e))
            | E::Update(UpdatePublishingHouseError::Database(e))
            | E::Delete(DeletePublishingHouseError::Database(e))
            | E::Get(GetPublishingHouseError::Database(e))
            | E::List(ListPublishingHousesError::Database(e)) => internal_error(&e),
        }
    }
}

impl std::fmt::Display for PublishingHouseApiError {
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
