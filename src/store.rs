// src/store.rs

use sqlx::PgPool;
use sqlx::types::Json;

use crate::engine::scoring::ScoredSubmission;
use crate::error::AppError;
use crate::models::exam::{Attempt, AttemptSummary};
use crate::models::level::Level;
use crate::models::placement::{PlacementAnswer, SubmitPlacementRequest};

/// Durable record of exam attempts, plus the best-effort placement log.
///
/// Attempts are insert-only; best score and attempt count are aggregates
/// computed on read, never cached fields, so concurrent submissions need no
/// locking.
#[derive(Clone)]
pub struct AttemptStore {
    pool: PgPool,
}

impl AttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a graded submission as one attempt row. A single INSERT, so
    /// a storage failure leaves nothing half-written.
    pub async fn insert_attempt(
        &self,
        user_id: i64,
        level: Level,
        scored: &ScoredSubmission,
        time_spent_seconds: Option<i32>,
    ) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO exam_attempts (user_id, level, score, time_spent_seconds, answers)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(scored.score)
        .bind(time_spent_seconds)
        .bind(Json(&scored.answers))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam attempt: {:?}", e);
            AppError::from(e)
        })?;

        Ok(id)
    }

    /// Highest score among the user's attempts at the level, or 0 if none.
    pub async fn best_score(&self, user_id: i64, level: Level) -> Result<i32, AppError> {
        let best = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(MAX(score), 0)
            FROM exam_attempts
            WHERE user_id = $1 AND level = $2
            "#,
        )
        .bind(user_id)
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        Ok(best)
    }

    pub async fn attempt_count(&self, user_id: i64, level: Level) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM exam_attempts
            WHERE user_id = $1 AND level = $2
            "#,
        )
        .bind(user_id)
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Most recent attempts first.
    pub async fn recent_attempts(
        &self,
        user_id: i64,
        level: Level,
        limit: i64,
    ) -> Result<Vec<AttemptSummary>, AppError> {
        let attempts = sqlx::query_as::<_, AttemptSummary>(
            r#"
            SELECT id, score, attempted_at, time_spent_seconds
            FROM exam_attempts
            WHERE user_id = $1 AND level = $2
            ORDER BY attempted_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    /// Fetches one attempt, enforcing ownership: a non-existent id and
    /// someone else's attempt are indistinguishable to the caller.
    pub async fn get(&self, attempt_id: i64, requesting_user_id: i64) -> Result<Attempt, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, user_id, level, score, attempted_at, time_spent_seconds, answers
            FROM exam_attempts
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(attempt_id)
        .bind(requesting_user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

        Ok(attempt)
    }

    /// Best-effort log of a client-scored placement run. The client already
    /// holds the authoritative result, so the caller may ignore failures.
    pub async fn record_placement_result(
        &self,
        user_id: i64,
        level: Level,
        req: &SubmitPlacementRequest,
    ) -> Result<i64, AppError> {
        let answers: &Vec<PlacementAnswer> = &req.answers;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO placement_results (user_id, level, score, total, answers)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(req.score)
        .bind(req.total)
        .bind(Json(answers))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
