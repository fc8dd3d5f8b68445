// src/engine/classify.rs

use crate::models::level::Level;

/// Maps a correctness ratio to a proficiency tier.
///
/// Pure and total: zero answered questions classifies as A1.
pub fn classify(correct_count: usize, total_count: usize) -> Level {
    if total_count == 0 {
        return Level::A1;
    }

    let percentage = 100.0 * correct_count as f64 / total_count as f64;

    if percentage >= 90.0 {
        Level::C1
    } else if percentage >= 75.0 {
        Level::B2
    } else if percentage >= 60.0 {
        Level::B1
    } else if percentage >= 40.0 {
        Level::A2
    } else {
        Level::A1
    }
}
