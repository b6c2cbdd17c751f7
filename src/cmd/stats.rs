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

use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::Fallible;
use crate::study::StudyContext;
use crate::types::daily::DailyStats;
use crate::types::daily::LearningStreak;
use crate::types::daily::TotalStats;

#[derive(ValueEnum, Clone, Copy)]
pub enum StatsFormat {
    /// Human-readable output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_study_stats(directory: &Path, format: StatsFormat) -> Fallible<()> {
    let study = StudyContext::open(directory)?;
    let stats = study.stats();
    let export = StatsExport {
        today: day_export(&stats.today()?),
        streak: streak_export(&stats.streak()),
        last_week: stats.weekly()?.iter().map(day_export).collect(),
        last_month: stats.monthly()?.iter().map(day_export).collect(),
        all_time: totals_export(&stats.all_time()?),
    };
    match format {
        StatsFormat::Text => print_text(&export),
        StatsFormat::Json => {
            let json = serde_json::to_string_pretty(&export)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_text(export: &StatsExport) {
    let today = &export.today;
    println!(
        "Today: {} cards in {} min ({} new, {} review).",
        today.cards_reviewed, today.study_minutes, today.new_cards, today.review_cards
    );
    println!(
        "Streak: {} days (longest {}).",
        export.streak.current, export.streak.longest
    );
    println!("Last 7 days:");
    for day in &export.last_week {
        println!(
            "  {}  {} cards, {} min, {} sessions",
            day.date, day.cards_reviewed, day.study_minutes, day.session_count
        );
    }
    let totals = &export.all_time;
    println!(
        "All time: {} cards in {} min across {} sessions.",
        totals.cards_reviewed, totals.study_minutes, totals.session_count
    );
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsExport {
    today: DayExport,
    streak: StreakExport,
    last_week: Vec<DayExport>,
    last_month: Vec<DayExport>,
    all_time: TotalsExport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayExport {
    date: String,
    cards_reviewed: u32,
    study_minutes: u32,
    session_count: u32,
    new_cards: u32,
    review_cards: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreakExport {
    current: u32,
    longest: u32,
    last_study_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalsExport {
    cards_reviewed: u32,
    study_minutes: u32,
    session_count: u32,
    new_cards: u32,
    review_cards: u32,
}

fn day_export(day: &DailyStats) -> DayExport {
    DayExport {
        date: day.date.to_string(),
        cards_reviewed: day.cards_reviewed,
        study_minutes: day.study_minutes,
        session_count: day.session_count,
        new_cards: day.new_cards,
        review_cards: day.review_cards,
    }
}

fn streak_export(streak: &LearningStreak) -> StreakExport {
    StreakExport {
        current: streak.current,
        longest: streak.longest,
        last_study_date: streak.last_study_date.map(|date| date.to_string()),
    }
}

fn totals_export(totals: &TotalStats) -> TotalsExport {
    TotalsExport {
        cards_reviewed: totals.cards_reviewed,
        study_minutes: totals.study_minutes,
        session_count: totals.session_count,
        new_cards: totals.new_cards,
        review_cards: totals.review_cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_stats_on_empty_deck() {
        let dir = tempfile::tempdir().unwrap();
        print_study_stats(dir.path(), StatsFormat::Text).unwrap();
        print_study_stats(dir.path(), StatsFormat::Json).unwrap();
    }

    #[test]
    fn test_export_shape() {
        let export = StatsExport {
            today: DayExport {
                date: "2026-08-25".to_string(),
                cards_reviewed: 3,
                study_minutes: 10,
                session_count: 1,
                new_cards: 2,
                review_cards: 1,
            },
            streak: StreakExport {
                current: 2,
                longest: 5,
                last_study_date: Some("2026-08-25".to_string()),
            },
            last_week: Vec::new(),
            last_month: Vec::new(),
            all_time: TotalsExport {
                cards_reviewed: 3,
                study_minutes: 10,
                session_count: 1,
                new_cards: 2,
                review_cards: 1,
            },
        };
        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains("\"cardsReviewed\":3"));
        assert!(json.contains("\"lastStudyDate\":\"2026-08-25\""));
        assert!(json.contains("\"allTime\""));
    }
}
