// src/models/placement.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::level::Level;

/// One question as served to a placement-test client: options already
/// shuffled, with the correct index in shuffled space. The placement run is
/// scored client-side, so the key ships with the question.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementItem {
    pub id: i64,
    pub level: Level,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// DTO wrapping the served placement sequence.
#[derive(Debug, Serialize)]
pub struct PlacementQuestionsResponse {
    pub questions: Vec<PlacementItem>,
}

/// One answer of a finished client-side placement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementAnswer {
    pub question_id: i64,
    pub selected_option: String,
    pub correct: bool,
    pub level: Level,
}

/// DTO for `POST /api/placement-test/results`. The client already holds the
/// authoritative result; persistence is best-effort.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPlacementRequest {
    #[validate(length(min = 1, max = 100))]
    pub answers: Vec<PlacementAnswer>,
    pub level: String,
    #[validate(range(min = 0))]
    pub score: i32,
    #[validate(range(min = 1))]
    pub total: i32,
}
