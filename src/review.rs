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

use std::sync::Arc;

use crate::error::Fallible;
use crate::scheduler::Rating;
use crate::scheduler::ReviewScheduler;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Headline numbers for a deck.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub total: u32,
    pub due: u32,
    pub reviewed: u32,
}

/// Coordinates cards, their review states, and the scheduler. The reviewer
/// owns no state of its own; everything it knows lives in the store, so two
/// reviewers over the same store agree.
pub struct Reviewer {
    store: Arc<dyn Store>,
    scheduler: Box<dyn ReviewScheduler>,
}

impl Reviewer {
    pub fn new(store: Arc<dyn Store>, scheduler: Box<dyn ReviewScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// The review state of a card, created and persisted on first sight.
    /// A freshly created state is due immediately.
    pub fn state_for(&self, card: &Card, now: Timestamp) -> Fallible<ReviewState> {
        if let Some(state) = self.store.review_state(card)? {
            return Ok(state);
        }
        let state = ReviewState::fresh(self.scheduler.initial_state(), now);
        self.store.put_review_state(card, &state)?;
        Ok(state)
    }

    /// Whether the card has never been rated. Absence of a state counts as
    /// new; this never writes.
    pub fn is_new(&self, card: &Card) -> Fallible<bool> {
        Ok(match self.store.review_state(card)? {
            Some(state) => state.is_new(),
            None => true,
        })
    }

    pub fn is_due(&self, card: &Card, now: Timestamp) -> Fallible<bool> {
        Ok(self.state_for(card, now)?.is_due(now))
    }

    /// Filters the deck down to the cards due at `now`, preserving the
    /// deck's order.
    pub fn due_cards(&self, cards: &[Card], now: Timestamp) -> Fallible<Vec<Card>> {
        let mut due = Vec::new();
        for card in cards {
            if self.state_for(card, now)?.is_due(now) {
                due.push(card.clone());
            }
        }
        Ok(due)
    }

    /// Rates a card. The scheduler maps the current state blob and the
    /// rating to a successor blob and a due time, and the updated state is
    /// persisted in a single write. Due times in the past are brought
    /// forward to `now`.
    pub fn apply_rating(&self, card: &Card, rating: Rating, now: Timestamp) -> Fallible<ReviewState> {
        let current = self.state_for(card, now)?;
        let (blob, due_at) = self
            .scheduler
            .next_state(&current.scheduler_state, rating, now)?;
        let due_at = due_at.max(now);
        let next = current.after_review(blob, due_at, now);
        self.store.put_review_state(card, &next)?;
        Ok(next)
    }

    /// Drops the card's review state, if any. The next sighting starts
    /// fresh.
    pub fn delete_state(&self, card: &Card) -> Fallible<()> {
        self.store.delete_review_state(card)
    }

    /// Deck counts without creating any state for untouched cards.
    pub fn progress(&self, cards: &[Card], now: Timestamp) -> Fallible<Progress> {
        let mut progress = Progress {
            total: cards.len() as u32,
            ..Progress::default()
        };
        for card in cards {
            match self.store.review_state(card)? {
                Some(state) => {
                    if state.is_due(now) {
                        progress.due += 1;
                    }
                    if !state.is_new() {
                        progress.reviewed += 1;
                    }
                }
                None => progress.due += 1,
            }
        }
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use crate::scheduler::SchedulerState;
    use crate::store::sqlite::SqliteStore;
    use crate::types::card::NewCard;

    use super::*;

    /// Deterministic intervals, no memory model.
    struct FakeScheduler;

    impl ReviewScheduler for FakeScheduler {
        fn initial_state(&self) -> SchedulerState {
            SchedulerState::new("fresh")
        }

        fn next_state(
            &self,
            current: &SchedulerState,
            rating: Rating,
            now: Timestamp,
        ) -> Fallible<(SchedulerState, Timestamp)> {
            let blob = SchedulerState::new(format!("{}+{}", current.as_str(), rating.as_str()));
            let days = match rating {
                Rating::Again => 0,
                Rating::Hard => 1,
                Rating::Good => 3,
                Rating::Easy => 7,
            };
            Ok((blob, now.plus_days(days)))
        }
    }

    /// Always schedules into the past.
    struct BrokenScheduler;

    impl ReviewScheduler for BrokenScheduler {
        fn initial_state(&self) -> SchedulerState {
            SchedulerState::new("broken")
        }

        fn next_state(
            &self,
            _current: &SchedulerState,
            _rating: Rating,
            now: Timestamp,
        ) -> Fallible<(SchedulerState, Timestamp)> {
            Ok((SchedulerState::new("broken"), now.plus_days(-3)))
        }
    }

    fn reviewer(scheduler: Box<dyn ReviewScheduler>) -> (Arc<SqliteStore>, Reviewer) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let reviewer = Reviewer::new(store.clone(), scheduler);
        (store, reviewer)
    }

    fn card(store: &SqliteStore, question: &str, line: u32) -> Card {
        store
            .insert_card(NewCard::from_line(
                question.to_string(),
                "a".to_string(),
                "deck.txt".to_string(),
                line,
            ))
            .unwrap()
    }

    #[test]
    fn test_first_sight_creates_due_state() {
        let (store, reviewer) = reviewer(Box::new(FakeScheduler));
        let card = card(&store, "q", 1);
        let now = Timestamp::now();
        assert!(reviewer.is_new(&card).unwrap());
        let state = reviewer.state_for(&card, now).unwrap();
        assert_eq!(state.review_count, 0);
        assert!(state.is_due(now));
        // The lazily created state was persisted.
        assert!(store.review_state(&card).unwrap().is_some());
    }

    #[test]
    fn test_apply_rating_advances_state() {
        let (store, reviewer) = reviewer(Box::new(FakeScheduler));
        let card = card(&store, "q", 1);
        let now = Timestamp::now();
        let state = reviewer.apply_rating(&card, Rating::Good, now).unwrap();
        assert_eq!(state.review_count, 1);
        assert_eq!(state.scheduler_state.as_str(), "fresh+good");
        assert_eq!(state.due_at, now.plus_days(3));
        assert!(!state.is_due(now));
        assert!(!reviewer.is_new(&card).unwrap());
        let state = reviewer.apply_rating(&card, Rating::Again, now).unwrap();
        assert_eq!(state.review_count, 2);
        assert_eq!(state.scheduler_state.as_str(), "fresh+good+again");
        // An "again" card comes back in the same session.
        assert!(state.is_due(now));
    }

    #[test]
    fn test_due_cards_preserve_deck_order() {
        let (store, reviewer) = reviewer(Box::new(FakeScheduler));
        let first = card(&store, "first", 1);
        let second = card(&store, "second", 2);
        let third = card(&store, "third", 3);
        let now = Timestamp::now();
        reviewer.apply_rating(&second, Rating::Easy, now).unwrap();
        let due = reviewer
            .due_cards(&[first.clone(), second, third], now)
            .unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].question, "first");
        assert_eq!(due[1].question, "third");
        // A week later everything is back.
        let later = now.plus_days(8);
        let all = store.all_cards().unwrap();
        assert_eq!(reviewer.due_cards(&all, later).unwrap().len(), 3);
    }

    #[test]
    fn test_past_due_times_clamped_to_now() {
        let (store, reviewer) = reviewer(Box::new(BrokenScheduler));
        let card = card(&store, "q", 1);
        let now = Timestamp::now();
        let state = reviewer.apply_rating(&card, Rating::Good, now).unwrap();
        assert_eq!(state.due_at, now);
    }

    #[test]
    fn test_progress_does_not_write() {
        let (store, reviewer) = reviewer(Box::new(FakeScheduler));
        let first = card(&store, "first", 1);
        let second = card(&store, "second", 2);
        let now = Timestamp::now();
        let progress = reviewer.progress(&[first.clone(), second.clone()], now).unwrap();
        assert_eq!(
            progress,
            Progress {
                total: 2,
                due: 2,
                reviewed: 0
            }
        );
        assert!(store.review_state(&first).unwrap().is_none());
        reviewer.apply_rating(&first, Rating::Easy, now).unwrap();
        let progress = reviewer.progress(&[first, second], now).unwrap();
        assert_eq!(
            progress,
            Progress {
                total: 2,
                due: 1,
                reviewed: 1
            }
        );
    }

    #[test]
    fn test_delete_state_starts_fresh() {
        let (store, reviewer) = reviewer(Box::new(FakeScheduler));
        let card = card(&store, "q", 1);
        let now = Timestamp::now();
        reviewer.apply_rating(&card, Rating::Easy, now).unwrap();
        reviewer.delete_state(&card).unwrap();
        assert!(store.review_state(&card).unwrap().is_none());
        let state = reviewer.state_for(&card, now).unwrap();
        assert_eq!(state.review_count, 0);
        assert!(state.is_due(now));
    }
}
