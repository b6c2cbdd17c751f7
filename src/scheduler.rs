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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// How the learner graded their recall of a card. Ordinal: `Again < Hard <
/// Good < Easy`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn as_str(&self) -> &str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

/// Scheduler-private state for one card. The core stores it and passes it
/// back; it never reads the contents.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulerState(String);

impl SchedulerState {
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ToSql for SchedulerState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for SchedulerState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Ok(SchedulerState(string))
    }
}

/// The contract the review coordinator consumes from the scheduling
/// algorithm.
pub trait ReviewScheduler {
    /// State for a card that has never been reviewed. A fresh state is
    /// immediately due.
    fn initial_state(&self) -> SchedulerState;

    /// Exchange the current state and a rating for the next state and the
    /// next due timestamp. Implementations must never return a due timestamp
    /// earlier than `now`.
    fn next_state(
        &self,
        current: &SchedulerState,
        rating: Rating,
        now: Timestamp,
    ) -> Fallible<(SchedulerState, Timestamp)>;
}
