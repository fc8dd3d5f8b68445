// src/models/question.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::level::{Category, Level};

/// Every locale must ship exactly this many options per question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Represents the 'questions' table: the comprehensive-exam question bank.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub level: Level,

    /// Grammatical category: syntax or morphology.
    pub category: Category,

    /// The question prompt.
    pub text: String,

    /// Locale code -> ordered list of exactly 4 option strings.
    /// Stored as a JSONB object in the database.
    pub options: Json<HashMap<String, Vec<String>>>,

    /// Index of the correct option, 0..=3, shared across locales.
    pub correct_index: i32,

    /// Optional explanation shown during answer review.
    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// Option list for `locale`, falling back to `fallback` when the
    /// requested locale is not seeded for this question.
    pub fn options_for<'a>(&'a self, locale: &str, fallback: &str) -> Option<&'a Vec<String>> {
        self.options
            .get(locale)
            .or_else(|| self.options.get(fallback))
    }
}

/// Represents the 'placement_questions' table. Same shape as `Question`
/// minus the category, mirrored from a canonical exam question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlacementQuestion {
    pub id: i64,
    pub level: Level,
    pub text: String,
    pub options: Json<HashMap<String, Vec<String>>>,
    pub correct_index: i32,

    /// Id of the canonical exam question this one mirrors.
    pub source_question_id: Option<i64>,
}

impl PlacementQuestion {
    pub fn options_for<'a>(&'a self, locale: &str, fallback: &str) -> Option<&'a Vec<String>> {
        self.options
            .get(locale)
            .or_else(|| self.options.get(fallback))
    }
}

/// DTO for sending an exam question to the client (hides the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub category: Category,
    pub question: String,
    pub options: Vec<String>,
}

/// DTO for seeding a new exam question into the bank.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub level: String,
    pub category: String,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: HashMap<String, Vec<String>>,
    #[validate(range(min = 0, max = 3))]
    pub correct_index: i32,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// Insertion invariant: at least one locale, and every locale carries
/// exactly 4 non-empty options.
pub fn validate_options(
    options: &HashMap<String, Vec<String>>,
) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for (locale, opts) in options {
        if opts.len() != OPTIONS_PER_QUESTION {
            let mut err = validator::ValidationError::new("locale_needs_exactly_four_options");
            err.add_param("locale".into(), locale);
            return Err(err);
        }
        for opt in opts {
            if opt.is_empty() || opt.len() > 500 {
                return Err(validator::ValidationError::new("option_length_invalid"));
            }
        }
    }
    Ok(())
}
