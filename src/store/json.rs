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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::NewCard;
use crate::types::daily::DailyStats;
use crate::types::daily::LearningStreak;
use crate::types::date::Date;
use crate::types::session::Session;
use crate::types::session::SessionId;
use crate::types::state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Review states, keyed by provenance.
pub const STATE_FILE: &str = "cardbox_state.json";

/// Daily statistics and the learning streak.
pub const STATS_FILE: &str = "cardbox_stats.json";

/// The file-backed store. Review states and statistics live in two JSON
/// files, rewritten in full on every successful mutation. Cards exist only
/// in process memory, rebuilt by ingestion each launch, and carry no store
/// identity; sessions are never persisted, so there is nothing for orphan
/// recovery to find here. Clones share one inner state.
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    state_path: PathBuf,
    stats_path: PathBuf,
    cards: Vec<Card>,
    states: BTreeMap<String, ReviewState>,
    sessions: Vec<(SessionId, Session)>,
    next_session_id: i64,
    daily: BTreeMap<Date, DailyStats>,
    streak: LearningStreak,
}

/// The on-disk shape of the statistics file.
#[derive(Default, Serialize, Deserialize)]
pub(crate) struct StatsFile {
    pub(crate) daily_stats: BTreeMap<Date, DailyStats>,
    pub(crate) learning_streak: LearningStreak,
}

#[derive(Serialize)]
struct StatsFileOut<'a> {
    daily_stats: &'a BTreeMap<Date, DailyStats>,
    learning_streak: &'a LearningStreak,
}

impl JsonStore {
    pub fn open(directory: &Path) -> Fallible<Self> {
        let state_path = directory.join(STATE_FILE);
        let stats_path = directory.join(STATS_FILE);
        let states = if state_path.exists() {
            let text = fs::read_to_string(&state_path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        let stats: StatsFile = if stats_path.exists() {
            let text = fs::read_to_string(&stats_path)?;
            serde_json::from_str(&text)?
        } else {
            StatsFile::default()
        };
        log::debug!(
            "opened file-backed store: {} states, {} stat days",
            states.len(),
            stats.daily_stats.len()
        );
        let inner = Inner {
            state_path,
            stats_path,
            cards: Vec::new(),
            states,
            sessions: Vec::new(),
            next_session_id: 1,
            daily: stats.daily_stats,
            streak: stats.learning_streak,
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn acquire(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Inner {
    fn save_states(&self) -> Fallible<()> {
        let text = serde_json::to_string_pretty(&self.states)?;
        fs::write(&self.state_path, text)?;
        Ok(())
    }

    fn save_stats(&self) -> Fallible<()> {
        let out = StatsFileOut {
            daily_stats: &self.daily,
            learning_streak: &self.streak,
        };
        let text = serde_json::to_string_pretty(&out)?;
        fs::write(&self.stats_path, text)?;
        Ok(())
    }

    fn no_identity<T>() -> Fallible<T> {
        Err(ErrorReport::unsupported(
            "cards in the file-backed store have no identity; this operation requires the relational backend.",
        ))
    }
}

impl Store for JsonStore {
    fn insert_card(&self, card: NewCard) -> Fallible<Card> {
        let mut inner = self.acquire();
        let exists = inner
            .cards
            .iter()
            .any(|c| c.question == card.question && c.answer == card.answer);
        if exists {
            return Err(ErrorReport::duplicate(
                "a card with this question and answer already exists.",
            ));
        }
        let card = Card {
            id: None,
            question: card.question,
            answer: card.answer,
            source_file: card.source_file,
            source_line: card.source_line,
            context: card.context,
            kind: card.kind,
            tags: card.tags,
            created_at: Timestamp::now(),
        };
        inner.cards.push(card.clone());
        Ok(card)
    }

    fn card_exists(&self, question: &str, answer: &str) -> Fallible<bool> {
        let inner = self.acquire();
        Ok(inner
            .cards
            .iter()
            .any(|c| c.question == question && c.answer == answer))
    }

    fn all_cards(&self) -> Fallible<Vec<Card>> {
        Ok(self.acquire().cards.clone())
    }

    fn get_card(&self, _id: CardId) -> Fallible<Card> {
        Inner::no_identity()
    }

    fn find_card(&self, source_file: &str, source_line: u32) -> Fallible<Option<Card>> {
        let inner = self.acquire();
        Ok(inner
            .cards
            .iter()
            .find(|c| c.source_file == source_file && c.source_line == source_line)
            .cloned())
    }

    fn update_card(&self, _card: &Card) -> Fallible<()> {
        Inner::no_identity()
    }

    fn delete_card(&self, _id: CardId) -> Fallible<()> {
        Inner::no_identity()
    }

    fn review_state(&self, card: &Card) -> Fallible<Option<ReviewState>> {
        let inner = self.acquire();
        Ok(inner.states.get(&card.provenance_key()).cloned())
    }

    fn put_review_state(&self, card: &Card, state: &ReviewState) -> Fallible<()> {
        let mut inner = self.acquire();
        inner.states.insert(card.provenance_key(), state.clone());
        inner.save_states()
    }

    fn delete_review_state(&self, card: &Card) -> Fallible<()> {
        let mut inner = self.acquire();
        if inner.states.remove(&card.provenance_key()).is_some() {
            inner.save_states()?;
        }
        Ok(())
    }

    fn create_session(&self, session: &Session) -> Fallible<SessionId> {
        let mut inner = self.acquire();
        let id = SessionId::new(inner.next_session_id);
        inner.next_session_id += 1;
        inner.sessions.push((id, session.clone()));
        Ok(id)
    }

    fn update_session(&self, id: SessionId, session: &Session) -> Fallible<()> {
        let mut inner = self.acquire();
        match inner.sessions.iter_mut().find(|(sid, _)| *sid == id) {
            Some((_, stored)) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(ErrorReport::not_found(format!("no session with id {}.", id))),
        }
    }

    fn unfinished_sessions(&self) -> Fallible<Vec<(SessionId, Session)>> {
        // Nothing survives a previous process, so there is never anything
        // to recover.
        Ok(Vec::new())
    }

    fn delete_session(&self, id: SessionId) -> Fallible<()> {
        let mut inner = self.acquire();
        let before = inner.sessions.len();
        inner.sessions.retain(|(sid, _)| *sid != id);
        if inner.sessions.len() == before {
            return Err(ErrorReport::not_found(format!("no session with id {}.", id)));
        }
        Ok(())
    }

    fn daily_stats(&self, date: Date) -> Fallible<Option<DailyStats>> {
        Ok(self.acquire().daily.get(&date).copied())
    }

    fn put_daily_stats(&self, stats: &DailyStats) -> Fallible<()> {
        let mut inner = self.acquire();
        inner.daily.insert(stats.date, *stats);
        inner.save_stats()
    }

    fn stats_in_range(&self, start: Date, end: Date) -> Fallible<Vec<DailyStats>> {
        let inner = self.acquire();
        Ok(inner.daily.range(start..=end).map(|(_, v)| *v).collect())
    }

    fn all_daily_stats(&self) -> Fallible<Vec<DailyStats>> {
        Ok(self.acquire().daily.values().copied().collect())
    }

    fn streak(&self) -> Fallible<LearningStreak> {
        Ok(self.acquire().streak)
    }

    fn put_streak(&self, streak: &LearningStreak) -> Fallible<()> {
        let mut inner = self.acquire();
        inner.streak = *streak;
        inner.save_stats()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::scheduler::SchedulerState;
    use crate::store::shared_tests;

    use super::*;

    fn new_card(question: &str, line: u32) -> NewCard {
        NewCard::from_line(
            question.to_string(),
            "a".to_string(),
            "deck.txt".to_string(),
            line,
        )
    }

    #[test]
    fn test_card_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        shared_tests::exercise_card_contract(&store, false);
    }

    #[test]
    fn test_review_state_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        shared_tests::exercise_review_state_contract(&store);
    }

    #[test]
    fn test_stats_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        shared_tests::exercise_stats_contract(&store);
    }

    #[test]
    fn test_streak_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        shared_tests::exercise_streak_contract(&store);
    }

    #[test]
    fn test_editing_requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let err = store.get_card(CardId::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        let err = store.delete_card(CardId::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_reopen_keeps_states_and_stats_not_cards() {
        let dir = tempfile::tempdir().unwrap();
        let now = Timestamp::now();
        {
            let store = JsonStore::open(dir.path()).unwrap();
            let card = store.insert_card(new_card("q", 3)).unwrap();
            let state = ReviewState::fresh(SchedulerState::new("{}"), now);
            store.put_review_state(&card, &state).unwrap();
            let mut day = DailyStats::empty(Date::parse("2026-06-01").unwrap());
            day.cards_reviewed = 2;
            store.put_daily_stats(&day).unwrap();
        }
        let store = JsonStore::open(dir.path()).unwrap();
        // Cards are rebuilt by ingestion, not loaded from disk.
        assert!(store.all_cards().unwrap().is_empty());
        let card = store.insert_card(new_card("q", 3)).unwrap();
        let state = store.review_state(&card).unwrap().unwrap();
        assert_eq!(state.review_count, 0);
        assert_eq!(state.due_at, now);
        let day = store
            .daily_stats(Date::parse("2026-06-01").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(day.cards_reviewed, 2);
    }

    #[test]
    fn test_state_file_keyed_by_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let card = store.insert_card(new_card("q", 12)).unwrap();
        let state = ReviewState::fresh(SchedulerState::new("{}"), Timestamp::now());
        store.put_review_state(&card, &state).unwrap();
        let text = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(text.contains("\"deck.txt:12\""));
    }

    #[test]
    fn test_sessions_never_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let id = store.create_session(&Session::begin(Timestamp::now())).unwrap();
        // Even a live unfinished session is not offered for recovery.
        assert!(store.unfinished_sessions().unwrap().is_empty());
        let mut session = Session::begin(Timestamp::now());
        session.record_review(true);
        store.update_session(id, &session).unwrap();
        store.delete_session(id).unwrap();
        assert_eq!(
            store.delete_session(id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_corrupt_state_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), "{ not json").unwrap();
        assert!(JsonStore::open(dir.path()).is_err());
    }
}
