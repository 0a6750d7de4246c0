pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Requirements API
        .route(
            "/api/v1/requirements",
            post(handlers::handle_structure_requirements),
        )
        // Screening API
        .route("/api/v1/screenings", post(handlers::handle_screen))
        .route(
            "/api/v1/screenings/batch",
            post(handlers::handle_screen_batch),
        )
        .route(
            "/api/v1/screenings/upload",
            post(handlers::handle_screen_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}
