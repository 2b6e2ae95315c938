//! Practice mode.
//!
//! An ephemeral session that cycles through a region's catalog in a
//! seed-derived order, one round at a time. Nothing here touches the
//! persisted ledger or the aggregate statistics; closing practice discards
//! the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Bird;
use crate::options::{ANSWER_OPTION_COUNT, AnswerOptions, generate_answer_options};
use crate::seed::{deterministic_shuffle, hash_string};
use crate::state::{Guess, GuessList, MAX_GUESSES};

/// The bird for a practice round.
///
/// The round index both walks the cycle and seeds its order, so the
/// sequence is an infinite, restartable walk through the whole catalog,
/// ordered differently from the daily selection.
#[must_use]
pub fn practice_bird(region: &str, catalog: &[Bird], round: u32) -> Option<Bird> {
    if catalog.is_empty() {
        return None;
    }
    let seed = hash_string(&format!("practice-{region}-{round}"));
    let shuffled = deterministic_shuffle(catalog, seed);
    shuffled.get(round as usize % shuffled.len()).cloned()
}

/// One in-progress practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub region: String,
    pub round: u32,
    pub current_bird: Option<Bird>,
    pub options: AnswerOptions,
    pub guesses: GuessList,
    pub completed: bool,
    pub won: bool,
    pub max_guesses: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl PracticeSession {
    /// Start a session on round 0.
    ///
    /// An empty catalog yields a session with no current bird; the caller
    /// should treat that as unplayable, same as the daily game.
    #[must_use]
    pub fn new(region: &str, catalog: &[Bird], now: DateTime<Utc>) -> Self {
        let mut session = Self {
            region: region.to_string(),
            round: 0,
            current_bird: None,
            options: AnswerOptions::new(),
            guesses: GuessList::new(),
            completed: false,
            won: false,
            max_guesses: MAX_GUESSES,
            start_time: now,
            end_time: None,
        };
        session.draw(catalog, now);
        session
    }

    fn puzzle_key(&self) -> String {
        format!("practice-{}-{}", self.region, self.round)
    }

    /// (Re)generate the current round's bird and option set.
    fn draw(&mut self, catalog: &[Bird], now: DateTime<Utc>) {
        self.current_bird = practice_bird(&self.region, catalog, self.round);
        self.options = self.current_bird.as_ref().map_or_else(AnswerOptions::new, |bird| {
            generate_answer_options(&self.puzzle_key(), catalog, bird, ANSWER_OPTION_COUNT)
        });
        self.guesses.clear();
        self.completed = false;
        self.won = false;
        self.start_time = now;
        self.end_time = None;
    }

    /// Apply a guess; mirrors the daily rules without the stats side effect.
    pub fn process_guess(&mut self, guessed_bird_id: &str, now: DateTime<Utc>) {
        let Some(current) = &self.current_bird else {
            return;
        };
        if self.completed || self.guesses.len() as u32 >= self.max_guesses {
            return;
        }

        let correct = guessed_bird_id == current.id;
        self.guesses.push(Guess {
            bird_id: guessed_bird_id.to_string(),
            correct,
            timestamp: Some(now),
        });

        if correct || self.guesses.len() as u32 >= self.max_guesses {
            self.completed = true;
            self.won = correct;
            self.end_time = Some(now);
        }
    }

    /// Advance to the next round and redraw. No-op on an empty catalog.
    pub fn next_round(&mut self, catalog: &[Bird], now: DateTime<Utc>) {
        if catalog.is_empty() {
            return;
        }
        self.round += 1;
        self.draw(catalog, now);
    }

    /// Replay the current round from scratch.
    ///
    /// The option order is a pure function of region, round, and bird, so a
    /// retry shows the same set in the same positions.
    pub fn retry_round(&mut self, catalog: &[Bird], now: DateTime<Utc>) {
        self.draw(catalog, now);
    }
}
