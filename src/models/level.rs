// src/models/level.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five proficiency tiers, ordered lowest to highest.
/// Mapped to the Postgres `level` enum type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "level")]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1];

    /// The next tier up, saturating at C1.
    pub fn next(self) -> Level {
        match self {
            Level::A1 => Level::A2,
            Level::A2 => Level::B1,
            Level::B1 => Level::B2,
            Level::B2 => Level::C1,
            Level::C1 => Level::C1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ();

    /// Case-insensitive parse; anything outside the five tiers is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            _ => Err(()),
        }
    }
}

/// Grammatical classification of an exam question.
/// Mapped to the Postgres `category` enum type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Morphology,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Syntax => f.write_str("syntax"),
            Category::Morphology => f.write_str("morphology"),
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "syntax" => Ok(Category::Syntax),
            "morphology" => Ok(Category::Morphology),
            _ => Err(()),
        }
    }
}
