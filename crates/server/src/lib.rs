//! HTTP API for HealthTrack
//!
//! Thin axum layer over `healthtrack_engine::Database`: each handler decodes
//! the JSON body, calls one service operation and shapes the response.
//! Errors leave as `{"error": message}` via [`ApiError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, Surface};
pub use state::AppState;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Text served at `/`.
pub const BANNER: &str = "Welcome to HealthTrack API";

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let mounts = [
        ("/api/patients", routes::patients::routes()),
        ("/api/records", routes::records::routes()),
        ("/api/users", routes::users::routes()),
    ];

    let mut app = Router::new().route("/", get(|| async { BANNER }));
    for (path, group) in mounts {
        app = app.nest(path, group);
        info!(target: "healthtrack::http", path, "Route mounted");
    }

    app.fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn route_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
