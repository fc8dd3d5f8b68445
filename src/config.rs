// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Fixed length of a comprehensive exam.
pub const EXAM_QUESTION_COUNT: usize = 35;

/// Rounded percentage needed to pass a comprehensive exam.
pub const PASSING_SCORE: i32 = 70;

/// Target length of a placement-test run.
pub const PLACEMENT_QUESTION_COUNT: usize = 20;

/// The placement test climbs one tier after this many slots.
pub const PLACEMENT_ADVANCE_INTERVAL: usize = 4;

/// Locale used when a request does not name one, and as the per-question
/// fallback when the requested locale is not seeded.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            rust_log,
        }
    }
}
