//! Router configuration for the HTTP API.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Build the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS; the dashboard front end is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route(
            "/dashboard",
            get(handlers::get_dashboard).post(handlers::post_dashboard),
        )
        .route("/dashboard/filters", get(handlers::get_filter_options))
        .route("/shipments", get(handlers::get_shipments))
        .route("/diagnostics", get(handlers::get_diagnostics))
        .route("/dataset/refresh", post(handlers::refresh_dataset))
        .route("/attendance/{month}", get(handlers::get_attendance_sheet))
        .route("/attendance/{month}/{plate}", put(handlers::put_attendance));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo, DashboardConfig::default());
        let _router = create_router(state);
    }
}
