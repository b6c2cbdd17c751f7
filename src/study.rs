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

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::BackendKind;
use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::FsrsScheduler;
use crate::parser;
use crate::parser::ParseReport;
use crate::review::Progress;
use crate::review::Reviewer;
use crate::stats::StatsTracker;
use crate::store::Store;
use crate::store::json::JsonStore;
use crate::store::sqlite::SqliteStore;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::NewCard;
use crate::types::prompt_kind::PromptKind;
use crate::types::timestamp::Timestamp;

/// Source locator recorded for cards added by hand rather than parsed
/// from a deck file.
pub const MANUAL_SOURCE: &str = "manual";

/// Everything a study command needs: the deck directory, its
/// configuration, the configured store, the reviewer, and the statistics
/// tracker. Built once per process; there is no global state.
pub struct StudyContext {
    directory: PathBuf,
    config: Config,
    store: Arc<dyn Store>,
    reviewer: Reviewer,
    stats: StatsTracker,
}

// The store, reviewer, and stats tracker hold trait objects without a
// `Debug` bound, so only the plain fields are shown.
impl fmt::Debug for StudyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyContext")
            .field("directory", &self.directory)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StudyContext {
    /// Opens a deck directory: loads its configuration, builds the
    /// configured backend, and finishes any sessions a crashed process
    /// left behind, before anything else can touch them.
    pub fn open(path: &Path) -> Fallible<StudyContext> {
        let metadata = fs::metadata(path).map_err(|_| {
            ErrorReport::not_found(format!("no such directory: {}", path.display()))
        })?;
        if !metadata.is_dir() {
            return fail(format!("not a directory: {}", path.display()));
        }
        let directory = path.to_path_buf();
        let config = Config::load(&directory)?;
        let store: Arc<dyn Store> = match config.backend {
            BackendKind::Sqlite => {
                Arc::new(SqliteStore::open(&directory.join(crate::store::sqlite::DB_FILE))?)
            }
            BackendKind::File => Arc::new(JsonStore::open(&directory)?),
        };
        let reviewer = Reviewer::new(store.clone(), Box::new(FsrsScheduler::new()));
        let stats = StatsTracker::new(store.clone(), config.orphan_seconds_per_card)?;
        stats.recover_orphans()?;
        Ok(StudyContext {
            directory,
            config,
            store,
            reviewer,
            stats,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn reviewer(&self) -> &Reviewer {
        &self.reviewer
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsTracker {
        &mut self.stats
    }

    /// Ingests a deck file, or the whole deck directory when no path is
    /// given.
    pub fn import(&self, path: Option<&Path>) -> Fallible<ParseReport> {
        let target = path.unwrap_or(&self.directory);
        parser::import_path(self.store.as_ref(), &self.directory, target)
    }

    pub fn cards(&self) -> Fallible<Vec<Card>> {
        self.store.all_cards()
    }

    pub fn due_cards(&self, now: Timestamp) -> Fallible<Vec<Card>> {
        self.reviewer.due_cards(&self.cards()?, now)
    }

    pub fn progress(&self, now: Timestamp) -> Fallible<Progress> {
        self.reviewer.progress(&self.cards()?, now)
    }

    /// Adds a card by hand, with the same field rules as deck lines.
    pub fn add_card(
        &self,
        question: &str,
        answer: &str,
        kind: PromptKind,
        tags: Option<String>,
        context: Option<String>,
    ) -> Fallible<Card> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() {
            return fail("the question must not be empty.");
        }
        if answer.is_empty() {
            return fail("the answer must not be empty.");
        }
        if question.len() > parser::MAX_FIELD_LEN || answer.len() > parser::MAX_FIELD_LEN {
            return fail(format!(
                "questions and answers must not exceed {} bytes.",
                parser::MAX_FIELD_LEN
            ));
        }
        // Manual cards have no deck line; number them past the cards
        // already in the store so their provenance keys stay distinct.
        let line = self.store.all_cards()?.len() as u32 + 1;
        let card = NewCard {
            question: question.to_string(),
            answer: answer.to_string(),
            source_file: MANUAL_SOURCE.to_string(),
            source_line: line,
            context,
            kind,
            tags: tags.unwrap_or_default(),
        };
        self.store.insert_card(card)
    }

    /// Removes a card and its review state.
    pub fn remove_card(&self, id: CardId) -> Fallible<Card> {
        let card = self.store.get_card(id)?;
        self.reviewer.delete_state(&card)?;
        self.store.delete_card(id)?;
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::scheduler::Rating;
    use crate::store::json::STATE_FILE;
    use crate::types::session::Session;

    use super::*;

    fn write_deck(dir: &Path) {
        fs::write(dir.join("deck.txt"), "q1>>a1\nq2>>a2\n").unwrap();
    }

    #[test]
    fn test_open_missing_directory() {
        let err = StudyContext::open(Path::new("/no/such/deck")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_open_defaults_to_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path());
        let context = StudyContext::open(dir.path()).unwrap();
        let report = context.import(None).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(context.cards().unwrap().len(), 2);
        assert!(dir.path().join(crate::store::sqlite::DB_FILE).exists());
        // Reopening sees the same cards.
        let context = StudyContext::open(dir.path()).unwrap();
        assert_eq!(context.cards().unwrap().len(), 2);
    }

    #[test]
    fn test_file_backend_via_config() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path());
        fs::write(dir.path().join("cardbox.toml"), "backend = \"file\"\n").unwrap();
        let context = StudyContext::open(dir.path()).unwrap();
        context.import(None).unwrap();
        let cards = context.cards().unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards[0].id.is_none());
        assert!(!dir.path().join(crate::store::sqlite::DB_FILE).exists());
        let now = Timestamp::now();
        context
            .reviewer()
            .apply_rating(&cards[0], Rating::Good, now)
            .unwrap();
        assert!(dir.path().join(STATE_FILE).exists());
    }

    #[test]
    fn test_add_card_validation() {
        let dir = tempfile::tempdir().unwrap();
        let context = StudyContext::open(dir.path()).unwrap();
        assert!(context
            .add_card("  ", "a", PromptKind::Factual, None, None)
            .is_err());
        assert!(context
            .add_card("q", "", PromptKind::Factual, None, None)
            .is_err());
        let oversized = "q".repeat(parser::MAX_FIELD_LEN + 1);
        assert!(context
            .add_card(&oversized, "a", PromptKind::Factual, None, None)
            .is_err());
        let card = context
            .add_card(" q ", " a ", PromptKind::Conceptual, Some("math".to_string()), None)
            .unwrap();
        assert_eq!(card.question, "q");
        assert_eq!(card.answer, "a");
        assert_eq!(card.kind, PromptKind::Conceptual);
        assert_eq!(card.source_file, MANUAL_SOURCE);
        let err = context
            .add_card("q", "a", PromptKind::Factual, None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[test]
    fn test_remove_card_drops_state() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path());
        let context = StudyContext::open(dir.path()).unwrap();
        context.import(None).unwrap();
        let cards = context.cards().unwrap();
        let now = Timestamp::now();
        context
            .reviewer()
            .apply_rating(&cards[0], Rating::Good, now)
            .unwrap();
        let id = cards[0].id.unwrap();
        let removed = context.remove_card(id).unwrap();
        assert_eq!(removed.question, "q1");
        assert_eq!(context.cards().unwrap().len(), 1);
        assert!(context.store().review_state(&cards[0]).unwrap().is_none());
        assert_eq!(
            context.remove_card(id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_open_recovers_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let start = Timestamp::now();
        {
            let store =
                SqliteStore::open(&dir.path().join(crate::store::sqlite::DB_FILE)).unwrap();
            let mut crashed = Session::begin(start);
            crashed.record_review(true);
            store.create_session(&crashed).unwrap();
        }
        let context = StudyContext::open(dir.path()).unwrap();
        assert!(context.store().unfinished_sessions().unwrap().is_empty());
        let day = context
            .store()
            .daily_stats(start.local_date())
            .unwrap()
            .unwrap();
        assert_eq!(day.cards_reviewed, 1);
    }

    #[test]
    fn test_import_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "qa>>1\n").unwrap();
        fs::write(dir.path().join("b.txt"), "qb>>1\n").unwrap();
        let context = StudyContext::open(dir.path()).unwrap();
        let report = context.import(Some(&dir.path().join("a.txt"))).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(context.cards().unwrap()[0].source_file, "a.txt");
    }
}
