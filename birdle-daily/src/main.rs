//! Daily answer-table publisher.
//!
//! Content-creator tool that turns a `birds.json` catalog set into the
//! `daily.json` answer table the game client consumes. Answers are picked
//! at random per region and day, avoiding repeats within a configurable
//! recent window, and published as salted hashes so the table does not
//! reveal upcoming answers in plain text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use birdle_game::{
    Bird, CatalogSet, DailyAnswerEntry, DailyAnswerTable, DailyConfig, find_bird_by_hash,
    generate_daily_entry,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary on stdout
    Console,
    /// The generated entries as JSON on stdout
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "birdle-daily", version)]
#[command(about = "Generate published daily-answer tables for Audio-Birdle")]
struct Args {
    /// Path to the birds.json catalog set
    #[arg(long, default_value = "data/birds.json")]
    birds: PathBuf,

    /// Path of the daily.json table to write (merged with existing rows)
    #[arg(long, default_value = "data/daily.json")]
    output: PathBuf,

    /// Path of the answer-history file used for repeat avoidance
    #[arg(long, default_value = "data/daily-history.json")]
    history: PathBuf,

    /// First date to generate (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<String>,

    /// Number of consecutive days to generate
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Regions to generate (comma-separated), defaults to every catalog region
    #[arg(long)]
    regions: Option<String>,

    /// Days within which an answer bird is not repeated
    #[arg(long, default_value_t = 30)]
    no_repeat_days: i64,

    /// Override the answer-hash salt (must match the client build)
    #[arg(long)]
    salt: Option<String>,

    /// Seed for reproducible picks; omitted means a fresh random run
    #[arg(long)]
    seed: Option<u64>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One remembered answer, kept per region for repeat avoidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HistoryEntry {
    date: String,
    id: String,
}

type AnswerHistory = BTreeMap<String, Vec<HistoryEntry>>;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = args.salt.as_deref().map_or_else(DailyConfig::default, DailyConfig::with_salt);

    let catalogs_json = fs::read_to_string(&args.birds)
        .with_context(|| format!("reading {}", args.birds.display()))?;
    let catalogs =
        CatalogSet::from_json(&catalogs_json).context("parsing bird catalogs")?;

    let start = match &args.date {
        Some(value) => birdle_game::parse_day(value)
            .with_context(|| format!("invalid start date {value:?}, expected YYYY-MM-DD"))?,
        None => Local::now().date_naive(),
    };

    let regions: Vec<String> = match &args.regions {
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => catalogs.region_ids().map(str::to_string).collect(),
    };
    if regions.is_empty() {
        bail!("no regions to generate; the catalog set is empty");
    }

    let mut history = load_history(&args.history);
    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let entries = generate_entries(
        &config,
        &catalogs,
        &regions,
        start,
        args.days,
        args.no_repeat_days,
        &mut history,
        &mut rng,
    )?;

    let table = merge_output(&args.output, &entries)?;
    write_json(&args.output, &table)?;
    write_json(&args.history, &history)?;

    match args.report {
        ReportFormat::Console => print_console_report(&config, &catalogs, &entries),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }

    Ok(())
}

/// Pick one answer per (day, region) and return the new table rows.
#[allow(clippy::too_many_arguments)]
fn generate_entries(
    config: &DailyConfig,
    catalogs: &CatalogSet,
    regions: &[String],
    start: NaiveDate,
    days: u32,
    no_repeat_days: i64,
    history: &mut AnswerHistory,
    rng: &mut ChaCha20Rng,
) -> Result<Vec<DailyAnswerEntry>> {
    let mut entries = Vec::new();

    for offset in 0..days {
        let date = start + Duration::days(i64::from(offset));
        let date_str = date.format("%Y-%m-%d").to_string();

        for region in regions {
            let catalog = catalogs.catalog_or_empty(region);
            if catalog.is_empty() {
                warn!("region {region} has no birds; skipping");
                continue;
            }

            let picked = pick_answer(catalog, region, date, no_repeat_days, history, rng);
            let entry = generate_daily_entry(config, &date_str, region, &picked.id);

            // The published digest must resolve back to the picked bird.
            let resolved = find_bird_by_hash(config, catalog, &entry.answer_hash);
            if resolved.map(|b| b.id.as_str()) != Some(picked.id.as_str()) {
                bail!(
                    "digest collision for {region}/{date_str}: {} does not round-trip",
                    picked.id
                );
            }

            history.entry(region.clone()).or_default().push(HistoryEntry {
                date: date_str.clone(),
                id: picked.id.clone(),
            });
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Random pick from the birds not used within the repeat window; falls back
/// to the whole catalog when the window exhausts it.
fn pick_answer<'a>(
    catalog: &'a [Bird],
    region: &str,
    date: NaiveDate,
    no_repeat_days: i64,
    history: &AnswerHistory,
    rng: &mut ChaCha20Rng,
) -> &'a Bird {
    let cutoff = date - Duration::days(no_repeat_days);
    let recent: Vec<&str> = history
        .get(region)
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| {
                    birdle_game::parse_day(&entry.date).is_some_and(|d| d > cutoff && d < date)
                })
                .map(|entry| entry.id.as_str())
                .collect()
        })
        .unwrap_or_default();

    let available: Vec<&Bird> = catalog
        .iter()
        .filter(|bird| !recent.contains(&bird.id.as_str()))
        .collect();

    if available.is_empty() {
        warn!("every bird in {region} was an answer within the window; reusing");
        &catalog[rng.gen_range(0..catalog.len())]
    } else {
        available[rng.gen_range(0..available.len())]
    }
}

fn load_history(path: &Path) -> AnswerHistory {
    match fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(history) => history,
            Err(err) => {
                warn!("history file {} unreadable, starting empty: {err}", path.display());
                AnswerHistory::new()
            }
        },
        Err(_) => {
            debug!("no history file at {}, starting empty", path.display());
            AnswerHistory::new()
        }
    }
}

/// Merge new rows into any existing table, replacing regenerated days.
fn merge_output(path: &Path, new_entries: &[DailyAnswerEntry]) -> Result<DailyAnswerTable> {
    let mut merged: Vec<DailyAnswerEntry> = match fs::read_to_string(path) {
        Ok(json) => match DailyAnswerTable::from_json(&json) {
            Ok(existing) => existing
                .entries()
                .iter()
                .filter(|old| {
                    !new_entries
                        .iter()
                        .any(|new| new.date == old.date && new.region == old.region)
                })
                .cloned()
                .collect(),
            Err(err) => {
                warn!("existing table {} unreadable, replacing: {err}", path.display());
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };

    merged.extend_from_slice(new_entries);
    merged.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.region.cmp(&b.region)));
    Ok(DailyAnswerTable::from_entries(merged))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn print_console_report(config: &DailyConfig, catalogs: &CatalogSet, entries: &[DailyAnswerEntry]) {
    for entry in entries {
        let bird = find_bird_by_hash(
            config,
            catalogs.catalog_or_empty(&entry.region),
            &entry.answer_hash,
        );
        let name = bird.map_or("<unknown>", |b| b.name.as_str());
        println!(
            "{} {}: {} -> {}",
            entry.date.dimmed(),
            entry.region.bold(),
            name.green(),
            entry.answer_hash.cyan()
        );
    }
    println!(
        "{}",
        format!("{} entries written", entries.len()).bold()
    );
}
