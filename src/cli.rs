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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd;
use crate::cmd::stats::StatsFormat;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill due cards.
    Drill {
        /// Optional path to the deck directory.
        directory: Option<String>,
        /// Drill only this deck file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Check that a deck parses, without touching its store.
    Check {
        /// Optional path to the deck directory.
        directory: Option<String>,
    },
    /// Add a card by hand.
    Add {
        question: String,
        answer: String,
        /// Optional path to the deck directory.
        directory: Option<String>,
        /// Prompt kind: factual, conceptual, application, or comparison.
        #[arg(long, default_value = "factual")]
        kind: String,
        /// Free-form tags.
        #[arg(long)]
        tags: Option<String>,
        /// Context label shown with the card.
        #[arg(long)]
        context: Option<String>,
    },
    /// List the cards in the store.
    Cards {
        /// Optional path to the deck directory.
        directory: Option<String>,
    },
    /// Remove a card and its review state.
    Remove {
        /// The card id, as shown by `cards`.
        id: i64,
        /// Optional path to the deck directory.
        directory: Option<String>,
    },
    /// Show study statistics.
    Stats {
        /// Optional path to the deck directory.
        directory: Option<String>,
        #[arg(long, value_enum, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Export daily statistics as comma-delimited text.
    Export {
        /// Optional path to the deck directory.
        directory: Option<String>,
        /// Where to write the export.
        #[arg(long, default_value = "cardbox_stats.csv")]
        output: PathBuf,
    },
    /// Move legacy JSON state and statistics into the relational store.
    Migrate {
        /// Optional path to the deck directory.
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill { directory, file } => {
            cmd::drill::drill_deck(&resolve_directory(directory)?, file.as_deref())
        }
        Command::Check { directory } => cmd::check::check_deck(&resolve_directory(directory)?),
        Command::Add {
            question,
            answer,
            directory,
            kind,
            tags,
            context,
        } => cmd::cards::add_card(
            &resolve_directory(directory)?,
            &question,
            &answer,
            kind,
            tags,
            context,
        ),
        Command::Cards { directory } => cmd::cards::list_cards(&resolve_directory(directory)?),
        Command::Remove { id, directory } => {
            cmd::cards::remove_card(&resolve_directory(directory)?, id)
        }
        Command::Stats { directory, format } => {
            cmd::stats::print_study_stats(&resolve_directory(directory)?, format)
        }
        Command::Export { directory, output } => {
            cmd::export::export_stats(&resolve_directory(directory)?, &output)
        }
        Command::Migrate { directory } => {
            cmd::migrate::migrate_deck(&resolve_directory(directory)?)
        }
    }
}

fn resolve_directory(directory: Option<String>) -> Fallible<PathBuf> {
    match directory {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(std::env::current_dir()?),
    }
}
