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

pub mod json;
pub mod sqlite;

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::NewCard;
use crate::types::daily::DailyStats;
use crate::types::daily::LearningStreak;
use crate::types::date::Date;
use crate::types::session::Session;
use crate::types::session::SessionId;
use crate::types::state::ReviewState;

/// The storage contract shared by the relational and file-backed backends.
/// A backend is chosen once at construction and injected wherever state is
/// needed; nothing else in the crate branches on which one is active.
pub trait Store {
    // Cards.

    /// Insert a card and return it as stored. Rejects an identical
    /// (question, answer) pair with a `Duplicate` error.
    fn insert_card(&self, card: NewCard) -> Fallible<Card>;

    fn card_exists(&self, question: &str, answer: &str) -> Fallible<bool>;

    /// Every card, in insertion order.
    fn all_cards(&self) -> Fallible<Vec<Card>>;

    /// `NotFound` if no card has this identity.
    fn get_card(&self, id: CardId) -> Fallible<Card>;

    fn find_card(&self, source_file: &str, source_line: u32) -> Fallible<Option<Card>>;

    /// Update a card in place. `NotFound` if its identity is unknown.
    fn update_card(&self, card: &Card) -> Fallible<()>;

    /// Delete a card and, with it, its review state.
    fn delete_card(&self, id: CardId) -> Fallible<()>;

    // Review states.

    /// The state for a card, or `Ok(None)` if it has never been touched.
    /// Absence is not an error here; callers decide whether to create a
    /// fresh state or give up.
    fn review_state(&self, card: &Card) -> Fallible<Option<ReviewState>>;

    /// Create or replace the state for a card.
    fn put_review_state(&self, card: &Card, state: &ReviewState) -> Fallible<()>;

    /// Remove the state for a card. Missing state is a no-op.
    fn delete_review_state(&self, card: &Card) -> Fallible<()>;

    // Sessions.

    fn create_session(&self, session: &Session) -> Fallible<SessionId>;

    fn update_session(&self, id: SessionId, session: &Session) -> Fallible<()>;

    /// Sessions with no end timestamp, for orphan recovery. The file-backed
    /// store never persists sessions and always reports none.
    fn unfinished_sessions(&self) -> Fallible<Vec<(SessionId, Session)>>;

    fn delete_session(&self, id: SessionId) -> Fallible<()>;

    // Daily statistics.

    fn daily_stats(&self, date: Date) -> Fallible<Option<DailyStats>>;

    /// Create or replace the record for its date.
    fn put_daily_stats(&self, stats: &DailyStats) -> Fallible<()>;

    /// Records with `start <= date <= end`, ascending by date.
    fn stats_in_range(&self, start: Date, end: Date) -> Fallible<Vec<DailyStats>>;

    /// Every record, ascending by date.
    fn all_daily_stats(&self) -> Fallible<Vec<DailyStats>>;

    // The streak singleton.

    /// Zeroed default if never written.
    fn streak(&self) -> Fallible<LearningStreak>;

    fn put_streak(&self, streak: &LearningStreak) -> Fallible<()>;
}

/// Contract checks run against both backends from their own test modules.
#[cfg(test)]
pub(crate) mod shared_tests {
    use crate::error::ErrorKind;
    use crate::scheduler::SchedulerState;
    use crate::types::timestamp::Timestamp;

    use super::*;

    fn new_card(question: &str, answer: &str, line: u32) -> NewCard {
        NewCard::from_line(
            question.to_string(),
            answer.to_string(),
            "deck.txt".to_string(),
            line,
        )
    }

    fn day(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    pub fn exercise_card_contract(store: &dyn Store, has_identity: bool) {
        let first = store.insert_card(new_card("2+2?", "4", 1)).unwrap();
        assert_eq!(first.id.is_some(), has_identity);
        assert_eq!(first.question, "2+2?");
        assert_eq!(first.source_line, 1);
        store.insert_card(new_card("3+3?", "6", 2)).unwrap();

        assert!(store.card_exists("2+2?", "4").unwrap());
        assert!(!store.card_exists("2+2?", "5").unwrap());

        let err = store.insert_card(new_card("2+2?", "4", 9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        let cards = store.all_cards().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].question, "2+2?");
        assert_eq!(cards[1].question, "3+3?");

        let found = store.find_card("deck.txt", 2).unwrap().unwrap();
        assert_eq!(found.question, "3+3?");
        assert!(store.find_card("deck.txt", 99).unwrap().is_none());
    }

    pub fn exercise_review_state_contract(store: &dyn Store) {
        let card = store.insert_card(new_card("q", "a", 1)).unwrap();
        assert!(store.review_state(&card).unwrap().is_none());

        let now = Timestamp::now();
        let fresh = ReviewState::fresh(SchedulerState::new("{}"), now);
        store.put_review_state(&card, &fresh).unwrap();
        assert_eq!(store.review_state(&card).unwrap(), Some(fresh.clone()));

        let reviewed = fresh.after_review(SchedulerState::new("{\"s\":1}"), now.plus_days(3), now);
        store.put_review_state(&card, &reviewed).unwrap();
        assert_eq!(store.review_state(&card).unwrap(), Some(reviewed));

        store.delete_review_state(&card).unwrap();
        assert!(store.review_state(&card).unwrap().is_none());
        // Deleting missing state is a no-op.
        store.delete_review_state(&card).unwrap();
    }

    pub fn exercise_stats_contract(store: &dyn Store) {
        assert!(store.daily_stats(day("2026-05-01")).unwrap().is_none());

        let mut first = DailyStats::empty(day("2026-05-01"));
        first.cards_reviewed = 3;
        store.put_daily_stats(&first).unwrap();
        assert_eq!(store.daily_stats(day("2026-05-01")).unwrap(), Some(first));

        first.cards_reviewed = 5;
        store.put_daily_stats(&first).unwrap();
        let reread = store.daily_stats(day("2026-05-01")).unwrap().unwrap();
        assert_eq!(reread.cards_reviewed, 5);

        let mut third = DailyStats::empty(day("2026-05-03"));
        third.session_count = 1;
        store.put_daily_stats(&third).unwrap();

        let range = store
            .stats_in_range(day("2026-05-01"), day("2026-05-02"))
            .unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].date, day("2026-05-01"));

        let all = store.all_daily_stats().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].date < all[1].date);
    }

    pub fn exercise_streak_contract(store: &dyn Store) {
        assert_eq!(store.streak().unwrap(), LearningStreak::default());

        let streak = LearningStreak {
            current: 3,
            longest: 9,
            last_study_date: Some(day("2026-05-01")),
        };
        store.put_streak(&streak).unwrap();
        assert_eq!(store.streak().unwrap(), streak);
    }
}
