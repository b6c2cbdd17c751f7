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

use serde::Deserialize;
use serde::Serialize;

use crate::types::date::Date;
use crate::types::session::Session;

/// Study aggregates for one calendar date. One record per date; sessions
/// accumulate into it, never overwrite it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: Date,
    pub cards_reviewed: u32,
    pub study_minutes: u32,
    pub session_count: u32,
    pub new_cards: u32,
    pub review_cards: u32,
}

impl DailyStats {
    pub fn empty(date: Date) -> Self {
        Self {
            date,
            cards_reviewed: 0,
            study_minutes: 0,
            session_count: 0,
            new_cards: 0,
            review_cards: 0,
        }
    }

    /// Fold one finished session into this day.
    pub fn absorb(&mut self, session: &Session) {
        self.cards_reviewed += session.cards_reviewed;
        self.study_minutes += session.duration_minutes().unwrap_or(0).max(0) as u32;
        self.session_count += 1;
        self.new_cards += session.new_cards;
        self.review_cards += session.review_cards;
    }
}

/// Consecutive days of study.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct LearningStreak {
    pub current: u32,
    pub longest: u32,
    pub last_study_date: Option<Date>,
}

impl LearningStreak {
    /// Register that a session ended today. At most one transition per
    /// calendar day:
    ///
    /// - first study ever: streak starts at one;
    /// - same day as the last study: no change;
    /// - exactly one day later: the streak grows;
    /// - anything else (a gap, a clock running backwards): reset to one,
    ///   leaving the longest streak untouched.
    pub fn record_study(&mut self, today: Date) {
        match self.last_study_date {
            None => {
                self.current = 1;
                self.longest = self.longest.max(1);
            }
            Some(last) => match today.days_since(last) {
                0 => return,
                1 => {
                    self.current += 1;
                    self.longest = self.longest.max(self.current);
                }
                _ => {
                    self.current = 1;
                }
            },
        }
        self.last_study_date = Some(today);
    }
}

/// Sums over every stored day.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TotalStats {
    pub cards_reviewed: u32,
    pub study_minutes: u32,
    pub session_count: u32,
    pub new_cards: u32,
    pub review_cards: u32,
}

impl TotalStats {
    pub fn add_day(&mut self, day: &DailyStats) {
        self.cards_reviewed += day.cards_reviewed;
        self.study_minutes += day.study_minutes;
        self.session_count += day.session_count;
        self.new_cards += day.new_cards;
        self.review_cards += day.review_cards;
    }
}
