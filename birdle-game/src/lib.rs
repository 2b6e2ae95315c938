//! Audio-Birdle Game Engine
//!
//! Platform-agnostic core logic for the Audio-Birdle daily bird-call quiz.
//! This crate provides deterministic daily selection, answer-option
//! generation, the persisted game-state ledger, and practice mode without
//! UI or platform-specific dependencies. The UI layer supplies data
//! loading, storage, and share delivery through the traits defined here.

use chrono::Utc;
use log::{debug, warn};

pub mod daily;
pub mod data;
pub mod dates;
pub mod migrate;
pub mod options;
pub mod practice;
pub mod seed;
pub mod share;
pub mod state;

// Re-export commonly used types
pub use daily::{
    ANSWER_HASH_LEN, DailyBird, DailyConfig, DailySource, fallback_daily_bird, find_bird_by_hash,
    generate_daily_entry, hash_bird_id, resolve_daily_bird,
};
pub use data::{Bird, CatalogSet, DailyAnswerEntry, DailyAnswerTable, Region};
pub use dates::{format_for_display, parse_day, today_string};
pub use migrate::{LegacyStateV1, PersistedState, migrate_if_needed};
pub use options::{ANSWER_OPTION_COUNT, AnswerOptions, generate_answer_options};
pub use practice::{PracticeSession, practice_bird};
pub use seed::{SeededRng, deterministic_shuffle, hash_string};
pub use share::{ShareDelivery, ShareSink, deliver_share, share_text};
pub use state::{
    AggregateStats, DailyGameRecord, GameStateLedger, Guess, GuessList, LEDGER_VERSION,
    LastPlayed, MAX_GUESSES, PerformanceSummary, RegionSummary, StatsBucket, record_key,
};

/// Trait for abstracting static-data fetches (region list, bird catalogs,
/// published answer table). Platform-specific implementations should
/// provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the region list.
    ///
    /// # Errors
    ///
    /// Returns an error if the region list cannot be loaded.
    fn load_regions(&self) -> Result<Vec<Region>, Self::Error>;

    /// Load every region's bird catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs cannot be loaded.
    fn load_catalogs(&self) -> Result<CatalogSet, Self::Error>;

    /// Load the published answer table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unreachable or malformed. The
    /// engine treats this as a silent fallback trigger, never a failure.
    fn load_daily_table(&self) -> Result<DailyAnswerTable, Self::Error>;
}

/// Trait for abstracting the local key-value persistence the ledger and
/// region preference live in.
pub trait LedgerStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw persisted ledger blob, if any. The engine migrates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn load_raw_ledger(&self) -> Result<Option<serde_json::Value>, Self::Error>;

    /// Persist the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_ledger(&self, ledger: &GameStateLedger) -> Result<(), Self::Error>;

    /// Remove the persisted ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn clear_ledger(&self) -> Result<(), Self::Error>;

    /// Read the remembered region selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn load_selected_region(&self) -> Result<Option<String>, Self::Error>;

    /// Persist the region selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_selected_region(&self, region: &str) -> Result<(), Self::Error>;
}

/// Engine-surfaced failures. Almost everything degrades instead of
/// failing; an unplayable region is the one condition the UI must handle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("region {0} has no playable catalog")]
    UnplayableRegion(String),
}

/// Handle for an in-flight catalog reload; see
/// [`GameEngine::begin_catalog_reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Main engine tying the selection core to the platform collaborators.
///
/// Owns the ledger exclusively: the UI reads snapshots and submits guess
/// events, and every mutation is written back through storage before the
/// call returns (write failures are logged and ignored so the session
/// stays playable).
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: LedgerStorage,
{
    loader: L,
    storage: S,
    config: DailyConfig,
    regions: Vec<Region>,
    catalogs: CatalogSet,
    daily_table: Option<DailyAnswerTable>,
    daily_table_checked: bool,
    ledger: GameStateLedger,
    selected_region: Option<String>,
    load_generation: u64,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: LedgerStorage,
{
    /// Create an engine with no data loaded yet.
    pub fn new(loader: L, storage: S, config: DailyConfig) -> Self {
        Self {
            loader,
            storage,
            config,
            regions: Vec::new(),
            catalogs: CatalogSet::empty(),
            daily_table: None,
            daily_table_checked: false,
            ledger: GameStateLedger::new(),
            selected_region: None,
            load_generation: 0,
        }
    }

    /// Load reference data and rehydrate persisted state.
    ///
    /// Catalog and region-list failures propagate — without them nothing
    /// is playable. A broken or unreadable persisted ledger never fails
    /// the session; it degrades to a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the region list or catalogs cannot be loaded.
    pub fn bootstrap(&mut self) -> Result<(), anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        self.regions = self.loader.load_regions().map_err(Into::into)?;
        self.catalogs = self.loader.load_catalogs().map_err(Into::into)?;

        self.ledger = match self.storage.load_raw_ledger() {
            Ok(Some(raw)) => migrate_if_needed(&raw, &today_string()),
            Ok(None) => GameStateLedger::new(),
            Err(err) => {
                warn!("persisted ledger unreadable, starting fresh: {err}");
                GameStateLedger::new()
            }
        };

        self.selected_region = match self.storage.load_selected_region() {
            Ok(region) => region,
            Err(err) => {
                warn!("stored region preference unreadable: {err}");
                None
            }
        };

        Ok(())
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn catalog(&self, region: &str) -> &[Bird] {
        self.catalogs.catalog_or_empty(region)
    }

    #[must_use]
    pub fn is_playable(&self, region: &str) -> bool {
        self.catalogs.is_playable(region)
    }

    #[must_use]
    pub fn ledger(&self) -> &GameStateLedger {
        &self.ledger
    }

    #[must_use]
    pub fn selected_region(&self) -> Option<&str> {
        self.selected_region.as_deref()
    }

    /// Remember the player's region choice.
    pub fn select_region(&mut self, region: &str) {
        self.selected_region = Some(region.to_string());
        if let Err(err) = self.storage.save_selected_region(region) {
            warn!("failed to persist region selection: {err}");
        }
    }

    /// Fetch the published answer table once per session; a failed fetch
    /// just means every resolution uses the deterministic fallback.
    fn ensure_daily_table(&mut self) {
        if self.daily_table_checked {
            return;
        }
        self.daily_table_checked = true;
        self.daily_table = match self.loader.load_daily_table() {
            Ok(table) => Some(table),
            Err(err) => {
                warn!("published answer table unavailable: {err}");
                None
            }
        };
    }

    /// Resolve the day's answer for a region.
    pub fn todays_bird(&mut self, region: &str, date: &str) -> Option<DailyBird> {
        self.ensure_daily_table();
        resolve_daily_bird(
            &self.config,
            region,
            self.catalogs.catalog_or_empty(region),
            date,
            self.daily_table.as_ref(),
        )
    }

    /// The day's multiple-choice set for a region.
    pub fn answer_options(&mut self, region: &str, date: &str) -> AnswerOptions {
        let Some(resolved) = self.todays_bird(region, date) else {
            return AnswerOptions::new();
        };
        generate_answer_options(
            &format!("{region}-{date}"),
            self.catalogs.catalog_or_empty(region),
            &resolved.bird,
            ANSWER_OPTION_COUNT,
        )
    }

    /// Submit a guess for the day's puzzle and persist the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnplayableRegion`] when the region has no
    /// catalog to resolve an answer from.
    pub fn submit_guess(
        &mut self,
        region: &str,
        date: &str,
        guessed_bird_id: &str,
    ) -> Result<DailyGameRecord, EngineError> {
        let resolved = self
            .todays_bird(region, date)
            .ok_or_else(|| EngineError::UnplayableRegion(region.to_string()))?;

        let record = self
            .ledger
            .process_guess(region, date, guessed_bird_id, &resolved.bird.id, Utc::now())
            .clone();
        self.persist_ledger();
        Ok(record)
    }

    #[must_use]
    pub fn has_played(&self, region: &str, date: &str) -> bool {
        self.ledger.has_played(region, date)
    }

    /// Share text for a completed daily record.
    #[must_use]
    pub fn share_text(&self, region: &str, date: &str, url: &str) -> Option<String> {
        self.ledger
            .daily_record(region, date)
            .filter(|record| record.completed)
            .map(|record| share_text(record, url))
    }

    #[must_use]
    pub fn performance_summary(&self) -> PerformanceSummary {
        self.ledger.performance_summary()
    }

    /// Drop one day's record (explicit user reset) and persist.
    pub fn reset_record(&mut self, region: &str, date: &str) {
        self.ledger.reset_record(region, date);
        self.persist_ledger();
    }

    /// Wipe everything and persist the fresh ledger.
    pub fn reset_all(&mut self) {
        self.ledger.reset_all();
        if let Err(err) = self.storage.clear_ledger() {
            warn!("failed to clear persisted ledger: {err}");
        }
        self.persist_ledger();
    }

    /// Start a catalog reload, superseding any in-flight one.
    ///
    /// The returned ticket must be presented when the load completes;
    /// a ticket from a superseded load is ignored, so a slow response for
    /// an abandoned region change cannot clobber a newer selection.
    pub fn begin_catalog_reload(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Apply a completed catalog reload. Returns false for stale tickets.
    pub fn complete_catalog_reload(&mut self, ticket: LoadTicket, catalogs: CatalogSet) -> bool {
        if ticket.0 != self.load_generation {
            debug!("ignoring stale catalog load (generation {})", ticket.0);
            return false;
        }
        self.catalogs = catalogs;
        true
    }

    fn persist_ledger(&self) {
        if let Err(err) = self.storage.save_ledger(&self.ledger) {
            warn!("failed to persist ledger: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FixtureLoader {
        daily_table: Option<DailyAnswerTable>,
    }

    fn fixture_catalogs() -> CatalogSet {
        let mut catalogs = CatalogSet::empty();
        catalogs.insert(
            "us",
            vec![
                Bird::stub("robin", "American Robin", "Turdidae"),
                Bird::stub("cardinal", "Northern Cardinal", "Cardinalidae"),
                Bird::stub("bluejay", "Blue Jay", "Corvidae"),
                Bird::stub("sparrow", "House Sparrow", "Passeridae"),
            ],
        );
        catalogs
    }

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_regions(&self) -> Result<Vec<Region>, Self::Error> {
            Ok(vec![Region {
                id: "us".to_string(),
                name: "United States".to_string(),
            }])
        }

        fn load_catalogs(&self) -> Result<CatalogSet, Self::Error> {
            Ok(fixture_catalogs())
        }

        fn load_daily_table(&self) -> Result<DailyAnswerTable, Self::Error> {
            Ok(self.daily_table.clone().unwrap_or_default())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        ledger: Rc<RefCell<Option<serde_json::Value>>>,
        region: Rc<RefCell<Option<String>>>,
        fail_writes: bool,
    }

    impl LedgerStorage for MemoryStorage {
        type Error = std::io::Error;

        fn load_raw_ledger(&self) -> Result<Option<serde_json::Value>, Self::Error> {
            Ok(self.ledger.borrow().clone())
        }

        fn save_ledger(&self, ledger: &GameStateLedger) -> Result<(), Self::Error> {
            if self.fail_writes {
                return Err(std::io::Error::other("storage full"));
            }
            *self.ledger.borrow_mut() = Some(serde_json::to_value(ledger)?);
            Ok(())
        }

        fn clear_ledger(&self) -> Result<(), Self::Error> {
            *self.ledger.borrow_mut() = None;
            Ok(())
        }

        fn load_selected_region(&self) -> Result<Option<String>, Self::Error> {
            Ok(self.region.borrow().clone())
        }

        fn save_selected_region(&self, region: &str) -> Result<(), Self::Error> {
            *self.region.borrow_mut() = Some(region.to_string());
            Ok(())
        }
    }

    fn engine_with(storage: MemoryStorage) -> GameEngine<FixtureLoader, MemoryStorage> {
        let mut engine = GameEngine::new(
            FixtureLoader::default(),
            storage,
            DailyConfig::default(),
        );
        engine.bootstrap().unwrap();
        engine
    }

    #[test]
    fn engine_resolves_options_and_records_guesses() {
        let storage = MemoryStorage::default();
        let mut engine = engine_with(storage.clone());

        let resolved = engine.todays_bird("us", "2025-06-08").unwrap();
        assert_eq!(resolved.source, DailySource::Fallback);

        let options = engine.answer_options("us", "2025-06-08");
        assert_eq!(options.len(), 4);
        assert!(options.iter().any(|b| b.id == resolved.bird.id));

        let record = engine
            .submit_guess("us", "2025-06-08", &resolved.bird.id)
            .unwrap();
        assert!(record.completed && record.won);

        // Guess was persisted through storage.
        let saved = storage.ledger.borrow().clone().unwrap();
        let reloaded = migrate_if_needed(&saved, "2025-06-08");
        assert!(reloaded.has_played("us", "2025-06-08"));
    }

    #[test]
    fn engine_restores_persisted_ledger_on_bootstrap() {
        let storage = MemoryStorage::default();
        {
            let mut engine = engine_with(storage.clone());
            let resolved = engine.todays_bird("us", "2025-06-08").unwrap();
            engine
                .submit_guess("us", "2025-06-08", &resolved.bird.id)
                .unwrap();
        }
        let engine = engine_with(storage);
        assert!(engine.has_played("us", "2025-06-08"));
        assert_eq!(engine.performance_summary().total_games, 1);
    }

    #[test]
    fn published_table_overrides_fallback() {
        let config = DailyConfig::default();
        let mut table = DailyAnswerTable::empty();
        table.push(generate_daily_entry(&config, "2025-06-08", "us", "sparrow"));
        let loader = FixtureLoader {
            daily_table: Some(table),
        };
        let mut engine = GameEngine::new(loader, MemoryStorage::default(), config);
        engine.bootstrap().unwrap();

        let resolved = engine.todays_bird("us", "2025-06-08").unwrap();
        assert_eq!(resolved.bird.id, "sparrow");
        assert!(matches!(resolved.source, DailySource::Published { .. }));
    }

    #[test]
    fn unknown_region_is_unplayable() {
        let mut engine = engine_with(MemoryStorage::default());
        assert!(engine.todays_bird("atlantis", "2025-06-08").is_none());
        assert!(engine.answer_options("atlantis", "2025-06-08").is_empty());
        let err = engine
            .submit_guess("atlantis", "2025-06-08", "robin")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnplayableRegion(_)));
    }

    #[test]
    fn failing_writes_keep_the_session_playable() {
        let storage = MemoryStorage {
            fail_writes: true,
            ..MemoryStorage::default()
        };
        let mut engine = engine_with(storage);
        let resolved = engine.todays_bird("us", "2025-06-08").unwrap();
        let record = engine
            .submit_guess("us", "2025-06-08", &resolved.bird.id)
            .unwrap();
        assert!(record.completed);
        assert!(engine.has_played("us", "2025-06-08"));
    }

    #[test]
    fn stale_catalog_loads_are_ignored() {
        let mut engine = engine_with(MemoryStorage::default());

        let first = engine.begin_catalog_reload();
        let second = engine.begin_catalog_reload();

        let mut uk_only = CatalogSet::empty();
        uk_only.insert("uk", vec![Bird::stub("wren", "Eurasian Wren", "Troglodytidae")]);

        // The superseded load resolves late and is dropped.
        assert!(!engine.complete_catalog_reload(first, CatalogSet::empty()));
        assert!(engine.complete_catalog_reload(second, uk_only));
        assert!(engine.is_playable("uk"));
        assert!(!engine.is_playable("us"));
    }

    #[test]
    fn region_preference_round_trips() {
        let storage = MemoryStorage::default();
        {
            let mut engine = engine_with(storage.clone());
            engine.select_region("us");
        }
        let engine = engine_with(storage);
        assert_eq!(engine.selected_region(), Some("us"));
    }

    #[test]
    fn reset_all_clears_history_and_storage() {
        let storage = MemoryStorage::default();
        let mut engine = engine_with(storage.clone());
        let resolved = engine.todays_bird("us", "2025-06-08").unwrap();
        engine
            .submit_guess("us", "2025-06-08", &resolved.bird.id)
            .unwrap();
        engine.reset_all();

        assert!(!engine.has_played("us", "2025-06-08"));
        assert_eq!(engine.performance_summary().total_games, 0);
        let saved = storage.ledger.borrow().clone().unwrap();
        let reloaded = migrate_if_needed(&saved, "2025-06-08");
        assert_eq!(reloaded, GameStateLedger::new());
    }
}
