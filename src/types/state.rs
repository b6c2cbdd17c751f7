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

use crate::scheduler::SchedulerState;
use crate::types::timestamp::Timestamp;

/// Per-card spaced-repetition state. One-to-one with its card and deleted
/// with it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ReviewState {
    /// Opaque scheduler blob; stored and round-tripped, never inspected.
    pub scheduler_state: SchedulerState,
    pub last_review: Option<Timestamp>,
    pub review_count: u32,
    pub due_at: Timestamp,
}

impl ReviewState {
    /// The state of a card that has never been reviewed: immediately due.
    pub fn fresh(scheduler_state: SchedulerState, now: Timestamp) -> Self {
        Self {
            scheduler_state,
            last_review: None,
            review_count: 0,
            due_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.review_count == 0
    }

    /// Never-reviewed cards are always due; otherwise due when `now` has
    /// reached the due timestamp.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.is_new() || now >= self.due_at
    }

    /// The state after one review: new blob and due time from the scheduler,
    /// review count up by exactly one.
    pub fn after_review(
        &self,
        scheduler_state: SchedulerState,
        due_at: Timestamp,
        now: Timestamp,
    ) -> Self {
        Self {
            scheduler_state,
            last_review: Some(now),
            review_count: self.review_count + 1,
            due_at,
        }
    }
}
