// src/engine/placement.rs

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::{PLACEMENT_ADVANCE_INTERVAL, PLACEMENT_QUESTION_COUNT};
use crate::engine::shuffle::shuffle_options;
use crate::models::level::Level;
use crate::models::placement::{PlacementAnswer, PlacementItem};
use crate::models::question::PlacementQuestion;

use super::classify::classify;

/// One run of the adaptive placement test.
///
/// Owns the per-level question pools for the duration of the run; the caller
/// holds the session rather than any process-wide state, so concurrent runs
/// never share cursors.
pub struct PlacementSession {
    pools: HashMap<Level, Vec<PlacementQuestion>>,
}

impl PlacementSession {
    /// Partitions the placement corpus by level and shuffles each pool once.
    pub fn new<R: Rng>(corpus: Vec<PlacementQuestion>, rng: &mut R) -> Self {
        let mut pools: HashMap<Level, Vec<PlacementQuestion>> = HashMap::new();
        for question in corpus {
            pools.entry(question.level).or_default().push(question);
        }
        for pool in pools.values_mut() {
            pool.shuffle(rng);
            // Consumption pops from the back; reverse so the shuffled front
            // is consumed first.
            pool.reverse();
        }
        Self { pools }
    }

    /// Builds the 20-question adaptive sequence.
    ///
    /// Difficulty starts at A1 and advances one tier after every 4th slot,
    /// unconditionally, saturating at C1. An exhausted pool skips its slots,
    /// so the result may hold fewer than 20 items; that is an accepted
    /// boundary condition, not an error.
    pub fn select_questions<R: Rng>(
        &mut self,
        rng: &mut R,
        locale: &str,
        fallback: &str,
    ) -> Vec<PlacementItem> {
        let mut selected = Vec::with_capacity(PLACEMENT_QUESTION_COUNT);
        let mut current_level = Level::A1;

        for i in 0..PLACEMENT_QUESTION_COUNT {
            if let Some(item) = self.next_item(rng, current_level, locale, fallback) {
                selected.push(item);
            }

            if (i + 1) % PLACEMENT_ADVANCE_INTERVAL == 0 {
                current_level = current_level.next();
            }
        }

        selected
    }

    /// Takes the next unconsumed question from the level's pool and shuffles
    /// its options. Questions lacking both the requested and the fallback
    /// locale are dropped from the pool.
    fn next_item<R: Rng>(
        &mut self,
        rng: &mut R,
        level: Level,
        locale: &str,
        fallback: &str,
    ) -> Option<PlacementItem> {
        let pool = self.pools.get_mut(&level)?;

        while let Some(question) = pool.pop() {
            let Some(options) = question.options_for(locale, fallback) else {
                tracing::warn!(
                    question_id = question.id,
                    locale,
                    "placement question has no options for locale, skipping"
                );
                continue;
            };

            let (options, correct_index) =
                shuffle_options(rng, options, question.correct_index as usize);

            return Some(PlacementItem {
                id: question.id,
                level: question.level,
                question: question.text.clone(),
                options,
                correct_index,
            });
        }

        None
    }
}

/// Classifies a finished run from its answer sheet.
pub fn classify_run(answers: &[PlacementAnswer]) -> Level {
    let correct = answers.iter().filter(|a| a.correct).count();
    classify(correct, answers.len())
}
