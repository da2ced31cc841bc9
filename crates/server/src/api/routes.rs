use axum::{
    http::{header::CONTENT_DISPOSITION, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, media, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Browsers need Content-Disposition exposed to read the file name
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION]);

    Router::new()
        // Liveness and observability
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Media
        .route("/api/info", get(media::info))
        .route("/api/download", get(media::download))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
