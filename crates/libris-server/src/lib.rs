//! Libris Server Library
//!
//! HTTP server for a small book catalog: books, the publishing houses that
//! print them, and the files each house publishes.
//!
//! # Overview
//!
//! - **API Endpoints**: REST API under `/api/v1`
//! - **Database Management**: PostgreSQL integration with SQLx
//! - **Storage Backend**: Uploaded files streamed to local disk
//! - **Configuration**: Environment-based configuration management
//! - **Middleware**: CORS, request tracing, panic recovery and per-client rate limiting
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)** layout:
//!
//! - **Commands** (Write Operations): create, update and delete books,
//!   publishing houses and files
//! - **Queries** (Read Operations): get and list, returning nested views
//!
//! Each feature is a vertical slice under [`features`]; handlers are plain
//! async functions taking a `PgPool`, registered with the mediator in [`cqrs`].
//!
//! # Example
//!
//! ```no_run
//! use libris_server::{api, config::Config, db, features::FeatureState, storage::FileStore};
//! use libris_server::middleware::rate_limit::SlidingWindowRateLimiter;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let state = FeatureState {
//!         db: db::create_pool(&config.database).await?,
//!         store: FileStore::new(&config.storage),
//!         limiter: Arc::new(SlidingWindowRateLimiter::new(config.rate_limit)),
//!     };
//!     let app = api::create_router(state, &config.cors);
//!     # let _ = app;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
