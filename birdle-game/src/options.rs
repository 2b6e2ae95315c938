//! Multiple-choice option generation.
//!
//! Distractors are biased toward the correct bird's taxonomic family so the
//! wrong choices stay plausible, and both the distractor draw and the final
//! ordering are seeded from the puzzle key so every player sees the same
//! choice set in the same positions.

use smallvec::SmallVec;

use crate::data::Bird;
use crate::seed::{deterministic_shuffle, hash_string};

/// Default number of choices shown per puzzle.
pub const ANSWER_OPTION_COUNT: usize = 4;

/// Option sets are at most a handful of birds; keep them inline.
pub type AnswerOptions = SmallVec<[Bird; ANSWER_OPTION_COUNT]>;

/// Build the choice set for a puzzle.
///
/// `puzzle_key` scopes the seeds: `"{region}-{date}"` for the daily game,
/// `"practice-{region}-{round}"` for practice rounds. The result contains
/// the correct bird exactly once with no duplicates. When the catalog holds
/// fewer than `option_count` birds, every catalog bird is returned rather
/// than erroring.
#[must_use]
pub fn generate_answer_options(
    puzzle_key: &str,
    catalog: &[Bird],
    correct: &Bird,
    option_count: usize,
) -> AnswerOptions {
    if option_count == 0 {
        return AnswerOptions::new();
    }

    let seed = hash_string(&format!("{puzzle_key}-{}-options", correct.id));

    let available: Vec<Bird> = catalog
        .iter()
        .filter(|bird| bird.id != correct.id)
        .cloned()
        .collect();
    let (same_family, other_family): (Vec<Bird>, Vec<Bird>) = available
        .into_iter()
        .partition(|bird| bird.family == correct.family);

    let wanted_distractors = option_count - 1;
    let mut distractors: Vec<Bird> = deterministic_shuffle(&same_family, seed)
        .into_iter()
        .take(wanted_distractors)
        .collect();
    if distractors.len() < wanted_distractors {
        let still_needed = wanted_distractors - distractors.len();
        distractors.extend(
            deterministic_shuffle(&other_family, seed)
                .into_iter()
                .take(still_needed),
        );
    }

    let mut combined = Vec::with_capacity(distractors.len() + 1);
    combined.push(correct.clone());
    combined.append(&mut distractors);

    // Second independent seed so the correct answer is not always first.
    let final_seed = hash_string(&format!("{puzzle_key}-{}-final", correct.id));
    deterministic_shuffle(&combined, final_seed).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Bird> {
        vec![
            Bird::stub("robin", "American Robin", "Turdidae"),
            Bird::stub("cardinal", "Northern Cardinal", "Cardinalidae"),
            Bird::stub("bluejay", "Blue Jay", "Corvidae"),
            Bird::stub("sparrow", "House Sparrow", "Passeridae"),
            Bird::stub("thrush", "Wood Thrush", "Turdidae"),
            Bird::stub("veery", "Veery", "Turdidae"),
            Bird::stub("solitaire", "Townsend's Solitaire", "Turdidae"),
        ]
    }

    fn assert_valid_options(options: &AnswerOptions, correct: &Bird, expected_len: usize) {
        assert_eq!(options.len(), expected_len);
        let correct_count = options.iter().filter(|b| b.id == correct.id).count();
        assert_eq!(correct_count, 1, "correct bird must appear exactly once");
        for (i, a) in options.iter().enumerate() {
            for b in options.iter().skip(i + 1) {
                assert_ne!(a.id, b.id, "options must be distinct");
            }
        }
    }

    #[test]
    fn produces_requested_count_with_correct_present() {
        let birds = catalog();
        let correct = birds[0].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_valid_options(&options, &correct, 4);
    }

    #[test]
    fn same_key_is_reproducible_and_keys_differ() {
        let birds = catalog();
        let correct = birds[0].clone();
        let a = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        let b = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_eq!(a, b);

        let ids = |opts: &AnswerOptions| opts.iter().map(|b| b.id.clone()).collect::<Vec<_>>();
        let different_days: Vec<Vec<String>> = (9..=14)
            .map(|day| {
                let key = format!("us-2025-06-{day:02}");
                ids(&generate_answer_options(&key, &birds, &correct, 4))
            })
            .collect();
        assert!(
            different_days.iter().any(|order| *order != ids(&a)),
            "distinct keys should move the options around"
        );
    }

    #[test]
    fn prefers_same_family_distractors() {
        let birds = catalog();
        // Turdidae has three other members, enough to fill every slot.
        let correct = birds[0].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        for bird in options.iter().filter(|b| b.id != correct.id) {
            assert_eq!(bird.family, "Turdidae");
        }
    }

    #[test]
    fn tops_up_from_other_families_when_needed() {
        let birds = catalog();
        // Corvidae has no other members; all distractors come from elsewhere.
        let correct = birds[2].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_valid_options(&options, &correct, 4);
    }

    #[test]
    fn short_catalog_returns_what_exists() {
        let birds = vec![
            Bird::stub("robin", "American Robin", "Turdidae"),
            Bird::stub("cardinal", "Northern Cardinal", "Cardinalidae"),
        ];
        let correct = birds[0].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_valid_options(&options, &correct, 2);
    }

    #[test]
    fn single_bird_catalog_yields_only_the_answer() {
        let birds = vec![Bird::stub("robin", "American Robin", "Turdidae")];
        let correct = birds[0].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_valid_options(&options, &correct, 1);
    }

    #[test]
    fn full_catalog_request_returns_every_bird() {
        let birds = vec![
            Bird::stub("robin", "American Robin", "A"),
            Bird::stub("cardinal", "Northern Cardinal", "B"),
            Bird::stub("bluejay", "Blue Jay", "A"),
            Bird::stub("sparrow", "House Sparrow", "C"),
        ];
        let correct = birds[1].clone();
        let options = generate_answer_options("us-2025-06-08", &birds, &correct, 4);
        assert_valid_options(&options, &correct, 4);
        for bird in &birds {
            assert!(options.iter().any(|b| b.id == bird.id));
        }
    }
}
