use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A playable bird, as shipped in the static catalog files.
///
/// Reference data only: the engine never mutates birds and the persisted
/// ledger stores bird ids, not copies of these records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bird {
    /// Unique within a region's catalog.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scientific_name: String,
    /// Taxonomic family, used to bias distractor selection.
    #[serde(default)]
    pub family: String,
    /// One or more recording URLs; the UI offers a selector when several exist.
    #[serde(default)]
    pub audio_url: Vec<String>,
}

impl Bird {
    /// Minimal bird for tests and fixtures.
    #[must_use]
    pub fn stub(id: &str, name: &str, family: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            scientific_name: String::new(),
            family: family.to_string(),
            audio_url: Vec::new(),
        }
    }
}

/// A selectable play region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
}

/// Mapping from region id to that region's bird catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CatalogSet {
    regions: BTreeMap<String, Vec<Bird>>,
}

impl CatalogSet {
    /// Create an empty catalog set (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the `birds.json` wire shape: `{ "<region>": [Bird, ...], ... }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalogs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn catalog(&self, region: &str) -> Option<&[Bird]> {
        self.regions.get(region).map(Vec::as_slice)
    }

    /// Catalog for a region, treating a missing entry as empty.
    #[must_use]
    pub fn catalog_or_empty(&self, region: &str) -> &[Bird] {
        self.catalog(region).unwrap_or(&[])
    }

    /// True when the region has at least one playable bird.
    #[must_use]
    pub fn is_playable(&self, region: &str) -> bool {
        !self.catalog_or_empty(region).is_empty()
    }

    pub fn insert(&mut self, region: &str, birds: Vec<Bird>) {
        self.regions.insert(region.to_string(), birds);
    }

    pub fn region_ids(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }
}

/// One row of the published answer table.
///
/// Publishers commit `(date, region, answerHash)` rows instead of plain bird
/// ids so a repository reader cannot trivially look up tomorrow's answer.
/// Dates stay raw strings on this type: a malformed row should fail to match
/// a lookup, not poison the whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnswerEntry {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub region: String,
    /// Salted hash of the answer bird id, 8 lowercase hex characters.
    pub answer_hash: String,
    /// Optional display label for the sub-area featured that day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subregion: Option<String>,
}

/// The published answer table (`daily.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DailyAnswerTable {
    entries: Vec<DailyAnswerEntry>,
}

impl DailyAnswerTable {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<DailyAnswerEntry>) -> Self {
        Self { entries }
    }

    /// Parse the `daily.json` wire shape: a bare array of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an array of answer entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The row for a (region, date), if any.
    #[must_use]
    pub fn entry_for(&self, region: &str, date: &str) -> Option<&DailyAnswerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.region == region && entry.date == date)
    }

    #[must_use]
    pub fn entries(&self) -> &[DailyAnswerEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: DailyAnswerEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
