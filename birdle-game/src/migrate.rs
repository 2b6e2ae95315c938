//! Persisted-state versioning.
//!
//! Two shapes have ever been written to storage: the original
//! single-record object (no version field, one day's guesses at the root)
//! and the current keyed ledger. Classification is an explicit tagged
//! variant rather than ad hoc field probing, and migration is best-effort:
//! anything the legacy shape lacks gets fresh defaults, and nothing here is
//! allowed to fail the caller.

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::state::{
    AggregateStats, DailyGameRecord, GameStateLedger, GuessList, LEDGER_VERSION, LastPlayed,
    MAX_GUESSES, record_key,
};

/// The legacy single-record persisted shape.
///
/// Every field is optional: old builds wrote slightly different subsets,
/// and migration takes whatever is structurally present.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStateV1 {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub guesses: Option<GuessList>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub max_guesses: Option<u32>,
    #[serde(default)]
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub stats: Option<AggregateStats>,
}

/// A classified persisted blob.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedState {
    LegacyV1(LegacyStateV1),
    LedgerV2(GameStateLedger),
}

/// Region the legacy shape implicitly belonged to (it predates regions).
const LEGACY_REGION: &str = "us";

impl PersistedState {
    /// Classify a raw persisted value.
    ///
    /// Current-format blobs carry `version >= 2` and the keyed record map;
    /// everything else is treated as legacy. A blob that deserializes as
    /// neither becomes an empty legacy state, which migrates to a fresh
    /// ledger.
    #[must_use]
    pub fn classify(raw: &Value) -> Self {
        let version = raw.get("version").and_then(Value::as_u64).unwrap_or(0);
        let has_record_map = raw.get("dailyGames").is_some_and(Value::is_object);

        if version >= u64::from(LEDGER_VERSION) && has_record_map {
            match GameStateLedger::deserialize(raw) {
                Ok(ledger) => return Self::LedgerV2(ledger),
                Err(err) => {
                    warn!("persisted ledger failed to deserialize, treating as legacy: {err}");
                }
            }
        }

        match LegacyStateV1::deserialize(raw) {
            Ok(legacy) => Self::LegacyV1(legacy),
            Err(err) => {
                warn!("persisted state unreadable, starting fresh: {err}");
                Self::LegacyV1(LegacyStateV1::default())
            }
        }
    }
}

/// Bring a raw persisted value up to the current ledger format.
///
/// `today` keys a dateless legacy record; a legacy record that knows its
/// own date keeps it.
#[must_use]
pub fn migrate_if_needed(raw: &Value, today: &str) -> GameStateLedger {
    match PersistedState::classify(raw) {
        PersistedState::LedgerV2(mut ledger) => {
            ledger.version = LEDGER_VERSION;
            ledger
        }
        PersistedState::LegacyV1(legacy) => migrate_legacy(legacy, today),
    }
}

fn migrate_legacy(legacy: LegacyStateV1, today: &str) -> GameStateLedger {
    let mut ledger = GameStateLedger::new();

    if let Some(stats) = legacy.stats {
        ledger.stats = stats;
    }

    // Only a blob that actually looks like a day's record becomes one.
    if let Some(guesses) = legacy.guesses {
        let date = legacy.date.unwrap_or_else(|| today.to_string());
        let won = legacy.won;
        let record = DailyGameRecord {
            region: LEGACY_REGION.to_string(),
            date: date.clone(),
            guesses,
            completed: legacy.completed,
            won,
            max_guesses: legacy.max_guesses.unwrap_or(MAX_GUESSES),
            start_time: legacy.start_time,
            end_time: legacy.end_time,
            answer_bird_id: None,
        };
        info!("migrated legacy game record into {}", record_key(LEGACY_REGION, &date));
        ledger.last_played = Some(LastPlayed {
            region: LEGACY_REGION.to_string(),
            date: date.clone(),
        });
        ledger
            .daily_games
            .insert(record_key(LEGACY_REGION, &date), record);
    }

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_current_format() {
        let raw = serde_json::to_value(GameStateLedger::new()).unwrap();
        assert!(matches!(
            PersistedState::classify(&raw),
            PersistedState::LedgerV2(_)
        ));
    }

    #[test]
    fn classifies_versionless_blob_as_legacy() {
        let raw = json!({
            "date": "2025-01-01",
            "guesses": [],
            "completed": false,
            "won": false,
            "maxGuesses": 4
        });
        assert!(matches!(
            PersistedState::classify(&raw),
            PersistedState::LegacyV1(_)
        ));
    }

    #[test]
    fn old_version_number_is_legacy_even_with_map() {
        let raw = json!({ "version": 1, "dailyGames": {} });
        assert!(matches!(
            PersistedState::classify(&raw),
            PersistedState::LegacyV1(_)
        ));
    }

    #[test]
    fn migrates_legacy_single_record() {
        let raw = json!({
            "date": "2025-01-01",
            "guesses": [{ "birdId": "x", "correct": false }],
            "completed": false,
            "won": false,
            "maxGuesses": 4
        });

        let ledger = migrate_if_needed(&raw, "2025-06-08");
        assert_eq!(ledger.version, LEDGER_VERSION);
        assert_eq!(ledger.daily_games.len(), 1);

        let record = &ledger.daily_games["us-2025-01-01"];
        assert_eq!(record.region, "us");
        assert_eq!(record.date, "2025-01-01");
        assert_eq!(record.guesses.len(), 1);
        assert_eq!(record.guesses[0].bird_id, "x");
        assert!(!record.guesses[0].correct);
        assert!(record.guesses[0].timestamp.is_none());
        assert!(!record.completed);
        assert!(!record.won);
        assert_eq!(record.max_guesses, 4);
    }

    #[test]
    fn dateless_legacy_record_lands_on_today() {
        let raw = json!({
            "guesses": [{ "birdId": "robin", "correct": true }],
            "completed": true,
            "won": true
        });

        let ledger = migrate_if_needed(&raw, "2025-06-08");
        assert!(ledger.daily_games.contains_key("us-2025-06-08"));
    }

    #[test]
    fn legacy_stats_survive_when_structurally_matched() {
        let raw = json!({
            "guesses": [],
            "stats": {
                "gamesPlayed": 7,
                "gamesWon": 5,
                "averageGuesses": 2.4,
                "currentStreak": 2,
                "maxStreak": 3
            }
        });

        let ledger = migrate_if_needed(&raw, "2025-06-08");
        assert_eq!(ledger.stats.overall.games_played, 7);
        assert_eq!(ledger.stats.overall.games_won, 5);
        assert_eq!(ledger.stats.overall.max_streak, 3);
    }

    #[test]
    fn garbage_becomes_a_fresh_ledger() {
        let raw = json!("not even an object");
        let ledger = migrate_if_needed(&raw, "2025-06-08");
        assert_eq!(ledger, GameStateLedger::new());
    }

    #[test]
    fn current_format_passes_through_unchanged() {
        let mut original = GameStateLedger::new();
        original.process_guess(
            "us",
            "2025-06-08",
            "robin",
            "robin",
            chrono::Utc::now(),
        );
        let raw = serde_json::to_value(&original).unwrap();
        let migrated = migrate_if_needed(&raw, "2025-06-09");
        assert_eq!(migrated, original);
    }
}
