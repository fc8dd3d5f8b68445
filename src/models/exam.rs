// src/models/exam.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::level::{Category, Level};

/// Represents one row of the 'exam_attempts' table: a single scored
/// submission of a comprehensive exam. Insert-only, never mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub level: Level,

    /// Rounded percentage, 0..=100.
    pub score: i32,

    pub attempted_at: chrono::DateTime<chrono::Utc>,
    pub time_spent_seconds: Option<i32>,

    /// Full per-question answer detail, in submission order.
    pub answers: Json<Vec<AnswerDetail>>,
}

/// One graded answer inside an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub category: Category,
    /// -1 means the question was left unanswered.
    pub selected_index: i32,
    pub correct_index: i32,
    pub correct: bool,
}

/// Per-category correct/total tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: usize,
    pub total: usize,
}

impl Attempt {
    /// Category breakdown recomputed from the stored answer detail.
    pub fn category_breakdown(&self) -> HashMap<Category, CategoryScore> {
        let mut breakdown: HashMap<Category, CategoryScore> = HashMap::new();
        for answer in self.answers.iter() {
            let entry = breakdown.entry(answer.category).or_default();
            entry.total += 1;
            if answer.correct {
                entry.correct += 1;
            }
        }
        breakdown
    }

    /// Answers to review after the exam, in submission order.
    pub fn incorrect_answers(&self) -> Vec<&AnswerDetail> {
        self.answers.iter().filter(|a| !a.correct).collect()
    }
}

/// DTO for requesting a generated exam.
#[derive(Debug, Deserialize)]
pub struct GenerateExamRequest {
    pub level: String,
    pub locale: Option<String>,
}

/// DTO for submitting a completed exam.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    pub level: String,
    #[validate(length(max = 200))]
    pub answers: Vec<SubmittedAnswer>,
    #[validate(range(min = 0))]
    pub time_spent_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    /// Index into the question's options, or -1 for unanswered.
    pub selected_index: i32,
}

/// DTO returned after scoring a submission.
#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub exam_id: i64,
    pub score: i32,
    pub correct_count: usize,
    pub total_count: usize,
    pub passed: bool,
    pub category_breakdown: HashMap<Category, CategoryScore>,
}

/// Summary row for the metadata endpoint's attempt history.
#[derive(Debug, FromRow, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub score: i32,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
    pub time_spent_seconds: Option<i32>,
}

/// DTO for `GET /api/exam/new?level=X`.
#[derive(Debug, Serialize)]
pub struct ExamMetaResponse {
    pub level: Level,
    pub can_take_exam: bool,
    pub best_score: i32,
    pub attempt_count: i64,
    pub previous_attempts: Vec<AttemptSummary>,
}

/// Full attempt detail returned by `GET /api/exam/{id}/results`.
#[derive(Debug, Serialize)]
pub struct AttemptResultsResponse {
    pub id: i64,
    pub level: Level,
    pub score: i32,
    pub passed: bool,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
    pub time_spent_seconds: Option<i32>,
    pub category_breakdown: HashMap<Category, CategoryScore>,
    pub answers: Vec<AnswerDetail>,
    pub incorrect_answers: Vec<AnswerDetail>,
}
