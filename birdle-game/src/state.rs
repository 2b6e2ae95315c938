//! Per-day game records, aggregate statistics, and the persisted ledger.
//!
//! The ledger is the sole owner of every daily record and all statistics;
//! callers read snapshots and submit guess events. Core operations take the
//! current time as an argument so tests control every timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Guesses allowed per daily puzzle.
pub const MAX_GUESSES: u32 = 4;

/// Persisted-format version written by this build.
pub const LEDGER_VERSION: u32 = 2;

/// Guess lists never exceed the guess limit; keep them inline.
pub type GuessList = SmallVec<[Guess; 4]>;

/// One submitted guess.
///
/// The timestamp is optional on the wire so records migrated from the
/// legacy format (which never stamped guesses) round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub bird_id: String,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Play record for one (region, date) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGameRecord {
    pub region: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub guesses: GuessList,
    pub completed: bool,
    pub won: bool,
    pub max_guesses: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Resolved answer for the day; set on the first processed guess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_bird_id: Option<String>,
}

impl DailyGameRecord {
    /// Fresh, unplayed record for a region-date.
    #[must_use]
    pub fn new(region: &str, date: &str, now: DateTime<Utc>) -> Self {
        Self {
            region: region.to_string(),
            date: date.to_string(),
            guesses: GuessList::new(),
            completed: false,
            won: false,
            max_guesses: MAX_GUESSES,
            start_time: Some(now),
            end_time: None,
            answer_bird_id: None,
        }
    }

    /// Guess slots still open on this record.
    #[must_use]
    pub fn guesses_remaining(&self) -> u32 {
        self.max_guesses.saturating_sub(self.guesses.len() as u32)
    }

    #[must_use]
    pub fn guess_count(&self) -> u32 {
        self.guesses.len() as u32
    }
}

/// Aggregate counters kept both overall and per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsBucket {
    pub games_played: u32,
    pub games_won: u32,
    /// Running mean of guesses used per completed game.
    pub average_guesses: f64,
    pub current_streak: u32,
    pub max_streak: u32,
}

impl StatsBucket {
    /// Fold one completed game into the counters.
    fn record_completion(&mut self, won: bool, guess_count: u32) {
        let prior_sum = self.average_guesses * f64::from(self.games_played);
        self.games_played += 1;
        if won {
            self.games_won += 1;
            self.current_streak += 1;
        } else {
            self.current_streak = 0;
        }
        self.max_streak = self.max_streak.max(self.current_streak);
        self.average_guesses = (prior_sum + f64::from(guess_count)) / f64::from(self.games_played);
    }

    /// Win rate as a whole percentage, 0 when nothing has been played.
    #[must_use]
    pub fn win_rate_pct(&self) -> u32 {
        if self.games_played == 0 {
            return 0;
        }
        let rate = f64::from(self.games_won) * 100.0 / f64::from(self.games_played);
        rate.round() as u32
    }
}

/// Overall statistics plus the per-region breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    #[serde(flatten)]
    pub overall: StatsBucket,
    #[serde(default)]
    pub by_region: BTreeMap<String, StatsBucket>,
}

impl AggregateStats {
    fn record_completion(&mut self, region: &str, won: bool, guess_count: u32) {
        self.overall.record_completion(won, guess_count);
        self.by_region
            .entry(region.to_string())
            .or_default()
            .record_completion(won, guess_count);
    }
}

/// Pointer to the most recently touched puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPlayed {
    pub region: String,
    pub date: String,
}

/// Root persisted object: every daily record ever started on this device
/// plus the aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateLedger {
    pub version: u32,
    #[serde(default)]
    pub daily_games: BTreeMap<String, DailyGameRecord>,
    #[serde(default)]
    pub stats: AggregateStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<LastPlayed>,
}

impl Default for GameStateLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Map key for a region-date record.
#[must_use]
pub fn record_key(region: &str, date: &str) -> String {
    format!("{region}-{date}")
}

impl GameStateLedger {
    /// Empty ledger at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: LEDGER_VERSION,
            daily_games: BTreeMap::new(),
            stats: AggregateStats::default(),
            last_played: None,
        }
    }

    #[must_use]
    pub fn daily_record(&self, region: &str, date: &str) -> Option<&DailyGameRecord> {
        self.daily_games.get(&record_key(region, date))
    }

    /// Record for the key, created zeroed if absent. Idempotent.
    pub fn get_or_create_daily_record(
        &mut self,
        region: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> &DailyGameRecord {
        self.daily_games
            .entry(record_key(region, date))
            .or_insert_with(|| DailyGameRecord::new(region, date, now))
    }

    /// True when the region-date has at least one recorded guess.
    #[must_use]
    pub fn has_played(&self, region: &str, date: &str) -> bool {
        self.daily_record(region, date)
            .is_some_and(|record| !record.guesses.is_empty())
    }

    /// Apply one guess to the region-date record.
    ///
    /// A completed (or out-of-guesses) record is left unchanged. Otherwise
    /// the guess is appended, the answer id is stored, and a correct guess
    /// or the final slot completes the record and folds it into the
    /// aggregate statistics. The last-played pointer moves to (region,
    /// date) in every case, including the no-op one.
    pub fn process_guess(
        &mut self,
        region: &str,
        date: &str,
        guessed_bird_id: &str,
        correct_bird_id: &str,
        now: DateTime<Utc>,
    ) -> &DailyGameRecord {
        self.last_played = Some(LastPlayed {
            region: region.to_string(),
            date: date.to_string(),
        });

        let record = self
            .daily_games
            .entry(record_key(region, date))
            .or_insert_with(|| DailyGameRecord::new(region, date, now));

        if record.completed || record.guess_count() >= record.max_guesses {
            return record;
        }

        let correct = guessed_bird_id == correct_bird_id;
        record.guesses.push(Guess {
            bird_id: guessed_bird_id.to_string(),
            correct,
            timestamp: Some(now),
        });
        record.answer_bird_id = Some(correct_bird_id.to_string());

        if correct || record.guess_count() >= record.max_guesses {
            record.completed = true;
            record.won = correct;
            record.end_time = Some(now);
            let guess_count = record.guess_count();
            self.stats.record_completion(region, correct, guess_count);
        }

        record
    }

    /// Delete one region-date record; history and statistics stay as-is.
    pub fn reset_record(&mut self, region: &str, date: &str) {
        self.daily_games.remove(&record_key(region, date));
    }

    /// Replace the whole ledger with a fresh one.
    pub fn reset_all(&mut self) {
        *self = Self::new();
    }

    /// Presentation figures for the stats view.
    #[must_use]
    pub fn performance_summary(&self) -> PerformanceSummary {
        let overall = &self.stats.overall;
        PerformanceSummary {
            total_games: overall.games_played,
            total_wins: overall.games_won,
            win_rate_pct: overall.win_rate_pct(),
            average_guesses: round_to_tenth(overall.average_guesses),
            current_streak: overall.current_streak,
            max_streak: overall.max_streak,
            region_breakdown: self
                .stats
                .by_region
                .iter()
                .map(|(region, bucket)| RegionSummary {
                    region: region.clone(),
                    games_played: bucket.games_played,
                    games_won: bucket.games_won,
                    win_rate_pct: bucket.win_rate_pct(),
                    max_streak: bucket.max_streak,
                })
                .collect(),
        }
    }
}

/// Stats-view row for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub region: String,
    pub games_played: u32,
    pub games_won: u32,
    pub win_rate_pct: u32,
    pub max_streak: u32,
}

/// Display-ready statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_games: u32,
    pub total_wins: u32,
    pub win_rate_pct: u32,
    /// Rounded to one decimal for display.
    pub average_guesses: f64,
    pub current_streak: u32,
    pub max_streak: u32,
    pub region_breakdown: Vec<RegionSummary>,
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
