// src/bank.rs

use std::collections::HashMap;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use sqlx::PgPool;
use sqlx::types::Json;
use validator::Validate;

use crate::engine::scoring::AnswerKey;
use crate::error::AppError;
use crate::models::level::{Category, Level};
use crate::models::question::{CreateQuestionRequest, PlacementQuestion, Question};

/// Read-side access to the leveled question bank.
///
/// Questions are immutable once seeded; the only write path is the validated
/// insert used by seeding and tests.
#[derive(Clone)]
pub struct QuestionBank {
    pool: PgPool,
}

/// Shuffle-and-take-prefix sampling without replacement.
/// Returns `None` when fewer than `n` items are eligible.
fn take_random<T, R: Rng>(mut items: Vec<T>, n: usize, rng: &mut R) -> Option<Vec<T>> {
    if items.len() < n {
        return None;
    }
    items.shuffle(rng);
    items.truncate(n);
    Some(items)
}

/// Applies the optional category filter, then samples. On an undersized pool
/// the error carries the eligible count *after* filtering, so the caller can
/// report how many questions actually qualified.
fn sample_questions<R: Rng>(
    mut eligible: Vec<Question>,
    n: usize,
    category: Option<Category>,
    rng: &mut R,
) -> Result<Vec<Question>, i64> {
    if let Some(category) = category {
        eligible.retain(|q| q.category == category);
    }
    let available = eligible.len() as i64;
    take_random(eligible, n, rng).ok_or(available)
}

impl QuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every exam question seeded for the level.
    pub async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, level, category, text, options, correct_index, explanation, created_at
            FROM questions
            WHERE level = $1
            "#,
        )
        .bind(level)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for level {}: {:?}", level, e);
            AppError::from(e)
        })?;

        Ok(questions)
    }

    /// `n` distinct questions for the level, uniformly sampled without
    /// replacement and independent of insertion order. An optional category
    /// filter narrows the eligible set before sampling.
    pub async fn random_sample(
        &self,
        level: Level,
        n: usize,
        category: Option<Category>,
    ) -> Result<Vec<Question>, AppError> {
        let eligible = self.questions_for_level(level).await?;

        sample_questions(eligible, n, category, &mut rand::thread_rng()).map_err(|available| {
            AppError::InsufficientQuestions {
                level,
                available,
                required: n as i64,
            }
        })
    }

    /// Number of exam questions seeded for the level.
    pub async fn count_for_level(&self, level: Level) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE level = $1")
            .bind(level)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Answer keys for the given question ids, keyed by id. Missing ids are
    /// simply absent from the map; the scorer decides what that means.
    pub async fn answer_keys(&self, ids: &[i64]) -> Result<HashMap<i64, AnswerKey>, AppError> {
        #[derive(sqlx::FromRow)]
        struct KeyRow {
            id: i64,
            category: Category,
            correct_index: i32,
        }

        let rows = sqlx::query_as::<_, KeyRow>(
            "SELECT id, category, correct_index FROM questions WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch answer keys: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    AnswerKey {
                        category: row.category,
                        correct_index: row.correct_index,
                    },
                )
            })
            .collect())
    }

    /// The full placement corpus across all levels.
    pub async fn placement_corpus(&self) -> Result<Vec<PlacementQuestion>, AppError> {
        let questions = sqlx::query_as::<_, PlacementQuestion>(
            r#"
            SELECT id, level, text, options, correct_index, source_question_id
            FROM placement_questions
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch placement corpus: {:?}", e);
            AppError::from(e)
        })?;

        Ok(questions)
    }

    /// Validated insert for seeding and tests. Rejects any locale whose
    /// option list is not exactly 4 entries long.
    pub async fn insert_question(&self, payload: &CreateQuestionRequest) -> Result<i64, AppError> {
        if let Err(validation_errors) = payload.validate() {
            return Err(AppError::BadRequest(validation_errors.to_string()));
        }

        let level = Level::from_str(&payload.level)
            .map_err(|_| AppError::InvalidLevel(payload.level.clone()))?;
        let category = Category::from_str(&payload.category)
            .map_err(|_| AppError::BadRequest(format!("unknown category '{}'", payload.category)))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions (level, category, text, options, correct_index, explanation)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(level)
        .bind(category)
        .bind(&payload.text)
        .bind(Json(&payload.options))
        .bind(payload.correct_index)
        .bind(&payload.explanation)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::from(e)
        })?;

        Ok(id)
    }
}
