// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    handlers::{health, leaderboard},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the leaderboard and health routes.
/// * Applies global middleware (Trace, CORS).
/// * Answers unknown paths with a JSON 404.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ]);

    let leaderboard_routes = Router::new()
        .route(
            "/leaderboard",
            get(leaderboard::get_leaderboard).post(leaderboard::submit_score),
        )
        .route(
            "/leaderboard/{topic_id}/users/{user_id}",
            get(leaderboard::get_standing),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(leaderboard_routes)
        .fallback(route_not_found)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
