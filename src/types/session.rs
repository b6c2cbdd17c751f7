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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::types::timestamp::Timestamp;

/// A session's identity in the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SessionId(i64);

impl SessionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for SessionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for SessionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let id: i64 = FromSql::column_result(value)?;
        Ok(SessionId(id))
    }
}

/// One sitting of card reviews.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Session {
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub cards_reviewed: u32,
    pub new_cards: u32,
    pub review_cards: u32,
}

impl Session {
    pub fn begin(now: Timestamp) -> Self {
        Self {
            started_at: now,
            ended_at: None,
            cards_reviewed: 0,
            new_cards: 0,
            review_cards: 0,
        }
    }

    /// Count one review; exactly one of the new/review counters moves.
    pub fn record_review(&mut self, is_new: bool) {
        self.cards_reviewed += 1;
        if is_new {
            self.new_cards += 1;
        } else {
            self.review_cards += 1;
        }
    }

    pub fn finish(&mut self, now: Timestamp) {
        self.ended_at = Some(now);
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Whole minutes from start to end, truncated. `None` while unfinished.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.ended_at.map(|end| end.minutes_since(self.started_at))
    }

    /// Whole minutes from start to `now`, for displaying a running session.
    pub fn running_minutes(&self, now: Timestamp) -> i64 {
        now.minutes_since(self.started_at)
    }
}
