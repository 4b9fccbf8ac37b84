pub mod api;
pub mod health;
pub mod index;

use crate::middleware::rate_limit::{limit_generation, GenerationLimiter};
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Application routes. Only the POST endpoints that run the pipeline go
/// through the generation limiter.
pub fn router(state: AppState, limiter: GenerationLimiter) -> Router {
    let limit = from_fn_with_state(limiter, limit_generation);

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/",
            get(index::index).merge(post(index::submit).layer(limit.clone())),
        )
        .route("/api/mcqs", post(api::generate_mcqs).layer(limit))
        .with_state(state)
}
