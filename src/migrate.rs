// Copyright 2026 the cardbox authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;

use crate::error::Fallible;
use crate::scheduler::SchedulerState;
use crate::store::Store;
use crate::store::json::STATE_FILE;
use crate::store::json::STATS_FILE;
use crate::store::json::StatsFile;
use crate::store::sqlite::SqliteStore;
use crate::types::daily::LearningStreak;
use crate::types::state::ReviewState;

/// What a migration run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub states_migrated: u32,
    pub states_skipped_existing: u32,
    /// Legacy entries with no matching card, or with a state blob that
    /// could not be read.
    pub states_unmatched: u32,
    pub days_migrated: u32,
    pub days_skipped: u32,
    pub streak_migrated: bool,
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "review states: {} migrated, {} already present, {} unmatched",
            self.states_migrated, self.states_skipped_existing, self.states_unmatched
        )?;
        writeln!(
            f,
            "daily stats: {} days migrated, {} already present",
            self.days_migrated, self.days_skipped
        )?;
        if self.streak_migrated {
            write!(f, "streak: migrated")
        } else {
            write!(f, "streak: unchanged")
        }
    }
}

/// Moves review states, daily statistics, and the streak from the legacy
/// JSON files in `directory` into the relational store. Never overwrites
/// anything already in the store, so running it again is harmless. Each
/// legacy file is backed up before it is read; a failed backup skips that
/// file's migration and leaves the other file's alone.
pub fn migrate_legacy(db: &SqliteStore, directory: &Path) -> Fallible<MigrationReport> {
    let mut report = MigrationReport::default();
    let state_path = directory.join(STATE_FILE);
    if state_path.exists() {
        match backup_file(&state_path) {
            Ok(backup) => {
                log::info!("backed up {} to {}", state_path.display(), backup.display());
                migrate_states(db, &state_path, &mut report)?;
            }
            Err(e) => log::warn!(
                "could not back up {}: {e}; skipping review state migration",
                state_path.display()
            ),
        }
    }
    let stats_path = directory.join(STATS_FILE);
    if stats_path.exists() {
        match backup_file(&stats_path) {
            Ok(backup) => {
                log::info!("backed up {} to {}", stats_path.display(), backup.display());
                migrate_stats(db, &stats_path, &mut report)?;
            }
            Err(e) => log::warn!(
                "could not back up {}: {e}; skipping statistics migration",
                stats_path.display()
            ),
        }
    }
    Ok(report)
}

fn backup_file(path: &Path) -> Fallible<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup = PathBuf::from(format!("{}.backup_{stamp}", path.display()));
    fs::copy(path, &backup)?;
    Ok(backup)
}

fn migrate_states(db: &SqliteStore, path: &Path, report: &mut MigrationReport) -> Fallible<()> {
    let text = fs::read_to_string(path)?;
    let states: BTreeMap<String, ReviewState> = serde_json::from_str(&text)?;
    for (key, state) in states {
        let Some((locator, line)) = split_key(&key) else {
            log::warn!("legacy state key {key:?} is not locator:line, skipping");
            report.states_unmatched += 1;
            continue;
        };
        let Some(card) = db.find_card(locator, line)? else {
            log::warn!("no card at {key}, skipping its legacy state");
            report.states_unmatched += 1;
            continue;
        };
        if db.review_state(&card)?.is_some() {
            report.states_skipped_existing += 1;
            continue;
        }
        let Some(blob) = round_trip_blob(&state.scheduler_state) else {
            log::warn!("legacy state for {key} has an unreadable scheduler blob, skipping");
            report.states_unmatched += 1;
            continue;
        };
        let migrated = ReviewState {
            scheduler_state: blob,
            ..state
        };
        db.put_review_state(&card, &migrated)?;
        report.states_migrated += 1;
    }
    Ok(())
}

fn migrate_stats(db: &SqliteStore, path: &Path, report: &mut MigrationReport) -> Fallible<()> {
    let text = fs::read_to_string(path)?;
    let legacy: StatsFile = serde_json::from_str(&text)?;
    for (date, day) in legacy.daily_stats {
        if db.daily_stats(date)?.is_some() {
            report.days_skipped += 1;
            continue;
        }
        db.put_daily_stats(&day)?;
        report.days_migrated += 1;
    }
    let zeroed = LearningStreak::default();
    if legacy.learning_streak != zeroed && db.streak()? == zeroed {
        db.put_streak(&legacy.learning_streak)?;
        report.streak_migrated = true;
    }
    Ok(())
}

fn split_key(key: &str) -> Option<(&str, u32)> {
    let (locator, line) = key.rsplit_once(':')?;
    let line = line.parse().ok()?;
    Some((locator, line))
}

/// The scheduler blob is opaque, but it must at least be JSON. Parsing and
/// re-serializing also normalizes its formatting.
fn round_trip_blob(blob: &SchedulerState) -> Option<SchedulerState> {
    let value: serde_json::Value = serde_json::from_str(blob.as_str()).ok()?;
    let text = serde_json::to_string(&value).ok()?;
    Some(SchedulerState::new(text))
}
