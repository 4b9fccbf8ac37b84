use crate::models::question::FinalMcq;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateMcqPayload {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
    pub num_questions: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateMcqResponse {
    pub requested: usize,
    pub generated: usize,
    pub mcqs: Vec<FinalMcq>,
}
