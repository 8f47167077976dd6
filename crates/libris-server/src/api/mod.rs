pub mod response;

use crate::config::CorsConfig;
use crate::db;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use self::response::ApiResponse;

/// Build the full application: service routes, `/api/v1` features and the
/// middleware stack
pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    let api_v1 = features::router(state.clone());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
        .nest("/api/v1", api_v1)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
        .layer(middleware::catch_panic_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Libris",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<FeatureState>) -> Result<impl IntoResponse, AppError> {
    db::health_check(&state.db).await.map_err(|e| {
        tracing::error!("Database health check failed: {}", e);
        AppError::Unavailable("database unreachable".to_string())
    })?;

    Ok(ApiResponse::success(json!({
        "status": "healthy",
        "database": "connected",
        "rate_limited_clients": state.limiter.tracked_keys(),
    })))
}
