// src/engine/scoring.rs

use std::collections::HashMap;

use crate::config::PASSING_SCORE;
use crate::models::exam::{AnswerDetail, CategoryScore, SubmittedAnswer};
use crate::models::level::Category;

/// Sentinel for a question left unanswered; always graded incorrect.
pub const UNANSWERED: i32 = -1;

/// Ground truth for one question, resolved from the bank at scoring time.
#[derive(Debug, Clone, Copy)]
pub struct AnswerKey {
    pub category: Category,
    pub correct_index: i32,
}

/// Grading failures. Both are caller mistakes, surfaced once, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// Zero submitted answers.
    EmptyAnswers,
    /// A submitted question id is missing from the bank. Indicates a
    /// client/server mismatch; generator output should round-trip unchanged.
    UnknownQuestion(i64),
}

/// A fully graded submission, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSubmission {
    /// Rounded percentage, 0..=100.
    pub score: i32,
    pub correct_count: usize,
    pub total_count: usize,
    pub passed: bool,
    pub answers: Vec<AnswerDetail>,
    pub category_breakdown: HashMap<Category, CategoryScore>,
}

/// Grades a submitted answer sheet against the bank's answer keys.
///
/// Pure: resolution of keys and persistence both live with the caller.
pub fn score_submission(
    submitted: &[SubmittedAnswer],
    keys: &HashMap<i64, AnswerKey>,
) -> Result<ScoredSubmission, ScoreError> {
    if submitted.is_empty() {
        return Err(ScoreError::EmptyAnswers);
    }

    let mut answers = Vec::with_capacity(submitted.len());
    let mut breakdown: HashMap<Category, CategoryScore> = HashMap::new();
    let mut correct_count = 0;

    for answer in submitted {
        let key = keys
            .get(&answer.question_id)
            .ok_or(ScoreError::UnknownQuestion(answer.question_id))?;

        let correct = answer.selected_index != UNANSWERED
            && answer.selected_index == key.correct_index;

        let entry = breakdown.entry(key.category).or_default();
        entry.total += 1;
        if correct {
            entry.correct += 1;
            correct_count += 1;
        }

        answers.push(AnswerDetail {
            question_id: answer.question_id,
            category: key.category,
            selected_index: answer.selected_index,
            correct_index: key.correct_index,
            correct,
        });
    }

    let total_count = answers.len();
    let score = (100.0 * correct_count as f64 / total_count as f64).round() as i32;

    Ok(ScoredSubmission {
        score,
        correct_count,
        total_count,
        passed: score >= PASSING_SCORE,
        answers,
        category_breakdown: breakdown,
    })
}
