//! Route definitions for the dashboard API.

pub mod dashboard;
pub mod health;
pub mod images;
pub mod settings;
pub mod users;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, url = %state.config.frontend_url, "Invalid FRONTEND_URL, CORS origin not set");
            CorsLayer::new()
        }
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let api = Router::new()
        .route("/settings", get(settings::get))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/export", get(dashboard::export))
        .route("/me/stats", get(dashboard::my_stats))
        .route("/images", get(images::list))
        .route("/images/generate", post(images::generate))
        .route("/users", get(users::list))
        .route("/users/{id}/role", patch(users::update_role));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
