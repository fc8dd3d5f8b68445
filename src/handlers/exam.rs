// src/handlers/exam.rs

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    bank::QuestionBank,
    config::{DEFAULT_LOCALE, EXAM_QUESTION_COUNT},
    engine::scoring::{ScoreError, score_submission},
    error::AppError,
    models::{
        exam::{
            AttemptResultsResponse, ExamMetaResponse, GenerateExamRequest, SubmitExamRequest,
            SubmitExamResponse,
        },
        level::Level,
        question::PublicQuestion,
    },
    store::AttemptStore,
    utils::jwt::Claims,
};

/// Attempt-history rows returned by the metadata endpoint.
const PREVIOUS_ATTEMPTS_LIMIT: i64 = 10;

fn parse_level(value: &str) -> Result<Level, AppError> {
    Level::from_str(value).map_err(|_| AppError::InvalidLevel(value.to_string()))
}

/// Generates a comprehensive exam: 35 distinct questions for the level,
/// sampled uniformly from the bank. Answer keys stay server-side.
pub async fn generate_exam(
    State(pool): State<PgPool>,
    Json(req): Json<GenerateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let level = parse_level(&req.level)?;
    let locale = req.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    let bank = QuestionBank::new(pool);
    // No category quota: the syntax/morphology mix emerges from the bank's
    // composition.
    let sample = bank.random_sample(level, EXAM_QUESTION_COUNT, None).await?;

    let questions = sample
        .iter()
        .map(|q| {
            let options = q.options_for(&locale, DEFAULT_LOCALE).ok_or_else(|| {
                // The insertion invariant guarantees the default locale; a
                // miss here means the bank data is corrupt.
                AppError::InternalServerError(format!(
                    "question {} has no options for locale '{}'",
                    q.id, locale
                ))
            })?;

            Ok(PublicQuestion {
                id: q.id,
                category: q.category,
                question: q.text.clone(),
                options: options.clone(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(serde_json::json!({ "questions": questions })))
}

/// Scores a submitted exam and persists the attempt.
///
/// Scoring and persistence are one step: nothing is written unless the whole
/// submission grades cleanly, and the attempt row is a single INSERT.
pub async fn submit_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let level = parse_level(&req.level)?;
    let user_id = claims.user_id();

    if req.answers.is_empty() {
        return Err(AppError::EmptyAnswers);
    }

    let question_ids: Vec<i64> = req.answers.iter().map(|a| a.question_id).collect();
    let bank = QuestionBank::new(pool.clone());
    let keys = bank.answer_keys(&question_ids).await?;

    let scored = match score_submission(&req.answers, &keys) {
        Ok(scored) => scored,
        Err(ScoreError::EmptyAnswers) => return Err(AppError::EmptyAnswers),
        Err(ScoreError::UnknownQuestion(id)) => return Err(AppError::UnknownQuestion(id)),
    };

    let store = AttemptStore::new(pool);
    let exam_id = store
        .insert_attempt(user_id, level, &scored, req.time_spent_seconds)
        .await?;

    // Module-completion signal for the external progress/achievement
    // tracker, which tails these events.
    if scored.passed {
        tracing::info!(
            target: "progress",
            user_id,
            level = %level,
            score = scored.score,
            exam_id,
            "comprehensive exam passed"
        );
    }

    Ok(Json(SubmitExamResponse {
        exam_id,
        score: scored.score,
        correct_count: scored.correct_count,
        total_count: scored.total_count,
        passed: scored.passed,
        category_breakdown: scored.category_breakdown,
    }))
}

/// Full results of one attempt, including the incorrect-answer review.
/// Only the owning user can read an attempt.
pub async fn exam_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let store = AttemptStore::new(pool);
    let attempt = store.get(attempt_id, claims.user_id()).await?;

    let category_breakdown = attempt.category_breakdown();
    let incorrect_answers = attempt
        .incorrect_answers()
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(AttemptResultsResponse {
        id: attempt.id,
        level: attempt.level,
        score: attempt.score,
        passed: attempt.score >= crate::config::PASSING_SCORE,
        attempted_at: attempt.attempted_at,
        time_spent_seconds: attempt.time_spent_seconds,
        category_breakdown,
        answers: attempt.answers.0.clone(),
        incorrect_answers,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExamMetaParams {
    pub level: String,
}

/// Pre-exam metadata: whether the bank can serve a full exam at this level,
/// plus the user's best score and attempt history.
pub async fn exam_meta(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ExamMetaParams>,
) -> Result<impl IntoResponse, AppError> {
    let level = parse_level(&params.level)?;
    let user_id = claims.user_id();

    let bank = QuestionBank::new(pool.clone());
    let store = AttemptStore::new(pool);

    let available = bank.count_for_level(level).await?;
    let best_score = store.best_score(user_id, level).await?;
    let attempt_count = store.attempt_count(user_id, level).await?;
    let previous_attempts = store
        .recent_attempts(user_id, level, PREVIOUS_ATTEMPTS_LIMIT)
        .await?;

    Ok(Json(ExamMetaResponse {
        level,
        can_take_exam: available >= EXAM_QUESTION_COUNT as i64,
        best_score,
        attempt_count,
        previous_attempts,
    }))
}
