use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "form_publishing": state.form_service.is_enabled(),
        "max_questions": state.max_questions,
    });
    (StatusCode::OK, Json(body))
}
