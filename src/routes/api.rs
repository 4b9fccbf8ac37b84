use crate::dto::mcq_dto::{GenerateMcqPayload, GenerateMcqResponse};
use crate::error::Result;
use crate::services::mcq_service::normalize_question_count;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

#[axum::debug_handler]
pub async fn generate_mcqs(
    State(state): State<AppState>,
    Json(payload): Json<GenerateMcqPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let requested = normalize_question_count(payload.num_questions).min(state.max_questions);
    let mcqs = state.mcq_service.get_mcqs(&payload.text, requested).await;

    Ok(Json(GenerateMcqResponse {
        requested,
        generated: mcqs.len(),
        mcqs,
    }))
}
