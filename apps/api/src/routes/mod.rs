pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route("/api/v1/interviews", post(handlers::handle_start))
        .route(
            "/api/v1/interviews/:id/answer",
            post(handlers::handle_answer),
        )
        .route("/api/v1/interviews/:id", get(handlers::handle_status))
        .route(
            "/api/v1/interviews/:id/results",
            get(handlers::handle_results),
        )
        .route(
            "/api/v1/interviews/:id/report",
            get(handlers::handle_report),
        )
        .route("/api/v1/interviews/:id/ws", get(handlers::handle_ws))
        // Resume API
        .route(
            "/api/v1/resumes/extract",
            post(handlers::handle_extract_resume),
        )
        // Diagnostics
        .route("/api/v1/oracle/health", get(handlers::handle_oracle_health))
        .with_state(state)
}
