pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::header,
    routing::get,
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_LENGTH, header::ETAG, header::LAST_MODIFIED])
        .max_age(Duration::from_secs(86400));

    // Drive proxy routes
    let drive_routes = Router::new()
        .route(
            "/images",
            get(routes::images::list).post(routes::images::get_one),
        )
        .route(
            "/image/{id}",
            get(routes::image::content).options(routes::image::preflight),
        );

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/drive", drive_routes)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
