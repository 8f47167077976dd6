//! Feature modules implementing the Libris API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes, following the CQRS split used throughout the server.
//!
//! # Features
//!
//! - **books**: Book catalog CRUD
//! - **publishing_houses**: Editions of a book by a given house, in a given language
//! - **book_files**: Uploaded files of a publishing house, stored on local disk
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations (create, update, delete)
//! - `queries/` - Read operations (get, list)
//! - `routes.rs` - HTTP route definitions
//!
//! Commands and queries implement the mediator pattern using the `mediator` crate.

pub mod book_files;
pub mod books;
pub mod publishing_houses;
pub mod shared;

use axum::{extract::FromRef, middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::middleware::rate_limit::{rate_limit, SlidingWindowRateLimiter};
use crate::storage::FileStore;

/// Shared state for all feature routes
///
/// Handlers extract the part they need (`State<PgPool>`, `State<FileStore>`)
/// through `FromRef`.
#[derive(Clone, FromRef)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
    /// Local disk store for uploaded book files
    pub store: FileStore,
    /// Per-client quota shared by the limited routes
    pub limiter: Arc<SlidingWindowRateLimiter>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/books` - Book management
/// - `/publishing-houses` - Publishing house management (rate limited)
/// - `/book-files` - File upload and download (rate limited)
pub fn router(state: FeatureState) -> Router<()> {
    let limited = from_fn_with_state(state.limiter.clone(), rate_limit);

    Router::new()
        .nest("/books", books::books_routes())
        .nest(
            "/publishing-houses",
            publishing_houses::publishing_houses_routes().route_layer(limited.clone()),
        )
        .nest(
            "/book-files",
            book_files::book_files_routes(state.store.max_upload_bytes()).route_layer(limited),
        )
        .with_state(state)
}
