//! Daily answer resolution.
//!
//! Two paths, tried in order: the published answer table (salted-hash rows
//! committed by content publishers), then the deterministic hash fallback.
//! The fallback is the ground truth for self-hosted deployments and must
//! always succeed on a non-empty catalog; every published-table miss degrades
//! to it silently.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::{Bird, DailyAnswerEntry, DailyAnswerTable};
use crate::seed::hash_string;

/// Width of the published answer digest, in hex characters.
pub const ANSWER_HASH_LEN: usize = 8;

/// Selection configuration.
///
/// The salt is deliberately a constructed value rather than a module
/// constant so tests and alternate deployments can substitute their own
/// without shared state. It is light obfuscation for published tables, not
/// a trust boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConfig {
    pub salt: String,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            salt: "birdle-salt-2025".to_string(),
        }
    }
}

impl DailyConfig {
    #[must_use]
    pub fn with_salt(salt: &str) -> Self {
        Self {
            salt: salt.to_string(),
        }
    }
}

/// How the day's answer was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailySource {
    /// Matched a published answer-table row.
    Published { subregion: Option<String> },
    /// Deterministic `hash(region-date) mod catalog` fallback.
    Fallback,
}

/// A resolved daily answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBird {
    pub bird: Bird,
    pub source: DailySource,
}

/// Salted digest of a bird id for the published answer table.
///
/// Input is `"{birdId}-{salt}"`; output is the full zero-padded lowercase
/// hex rendering of the 32-bit hash, always exactly 8 characters.
#[must_use]
pub fn hash_bird_id(config: &DailyConfig, bird_id: &str) -> String {
    let combined = format!("{bird_id}-{}", config.salt);
    format!("{:08x}", hash_string(&combined))
}

/// Find the catalog bird whose salted digest matches `answer_hash`.
///
/// The stored hash is compared case-insensitively.
#[must_use]
pub fn find_bird_by_hash<'a>(
    config: &DailyConfig,
    birds: &'a [Bird],
    answer_hash: &str,
) -> Option<&'a Bird> {
    let wanted = answer_hash.to_ascii_lowercase();
    birds
        .iter()
        .find(|bird| hash_bird_id(config, &bird.id) == wanted)
}

/// Build a publishable answer-table row for a bird.
#[must_use]
pub fn generate_daily_entry(
    config: &DailyConfig,
    date: &str,
    region: &str,
    bird_id: &str,
) -> DailyAnswerEntry {
    DailyAnswerEntry {
        date: date.to_string(),
        region: region.to_string(),
        answer_hash: hash_bird_id(config, bird_id),
        subregion: None,
    }
}

/// Deterministic fallback: `catalog[hash("{region}-{date}") mod len]`.
///
/// Returns `None` only for an empty catalog, which makes the region
/// unplayable for the day.
#[must_use]
pub fn fallback_daily_bird<'a>(region: &str, birds: &'a [Bird], date: &str) -> Option<&'a Bird> {
    if birds.is_empty() {
        return None;
    }
    let seed = hash_string(&format!("{region}-{date}"));
    birds.get(seed as usize % birds.len())
}

/// Resolve the day's answer for a region.
///
/// Tries the published table first when one is supplied; any miss (no row,
/// no bird matching the row's hash) falls through to the deterministic
/// path. Misses are logged, never surfaced: the published table is a
/// content-staging convenience, and the game must stay playable without it.
#[must_use]
pub fn resolve_daily_bird(
    config: &DailyConfig,
    region: &str,
    birds: &[Bird],
    date: &str,
    table: Option<&DailyAnswerTable>,
) -> Option<DailyBird> {
    if let Some(table) = table {
        if let Some(entry) = table.entry_for(region, date) {
            if let Some(bird) = find_bird_by_hash(config, birds, &entry.answer_hash) {
                debug!("daily answer for {region}/{date} resolved from published table");
                return Some(DailyBird {
                    bird: bird.clone(),
                    source: DailySource::Published {
                        subregion: entry.subregion.clone(),
                    },
                });
            }
            warn!(
                "published hash {} for {region}/{date} matches no catalog bird; using fallback",
                entry.answer_hash
            );
        } else {
            debug!("no published entry for {region}/{date}; using fallback");
        }
    }

    fallback_daily_bird(region, birds, date).map(|bird| DailyBird {
        bird: bird.clone(),
        source: DailySource::Fallback,
    })
}
