// src/engine/shuffle.rs

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffles a question's options with a uniform Fisher–Yates permutation and
/// reports where the correct answer landed.
///
/// Called once per question per test session and never cached, so repeated
/// attempts see different orderings.
pub fn shuffle_options<R: Rng>(
    rng: &mut R,
    options: &[String],
    correct_index: usize,
) -> (Vec<String>, usize) {
    let mut order: Vec<usize> = (0..options.len()).collect();
    order.shuffle(rng);

    let shuffled = order.iter().map(|&i| options[i].clone()).collect();

    // The original index is always present in the permutation; the fallback
    // only triggers on an out-of-range correct_index, which insertion-time
    // validation rules out.
    let new_correct = order
        .iter()
        .position(|&i| i == correct_index)
        .unwrap_or(correct_index);

    (shuffled, new_correct)
}
