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

use log::warn;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::scheduler::Rating;
use crate::scheduler::ReviewScheduler;
use crate::scheduler::SchedulerState;
use crate::types::timestamp::Timestamp;

/// Memory stability: the time, in days, for retrievability to decay from
/// 100% to 90%.
pub type Stability = f64;

/// Memory difficulty, in `[1, 10]`.
pub type Difficulty = f64;

/// The FSRS-4.5 default parameter vector.
const W: [f64; 17] = [
    0.4872, 1.4003, 3.7145, 13.8206, 5.1618, 1.2298, 0.8975, 0.031, 1.6474, 0.1367, 1.0461,
    2.1072, 0.0793, 0.3246, 1.587, 0.2272, 2.8755,
];

/// The retrievability the scheduler aims for at review time.
const TARGET_RECALL: f64 = 0.9;

const FACTOR: f64 = 19.0 / 81.0;
const DECAY: f64 = -0.5;

const MIN_STABILITY: f64 = 0.1;
const MIN_DIFFICULTY: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 10.0;

const MIN_INTERVAL: f64 = 1.0;
const MAX_INTERVAL: f64 = 128.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn grade_number(rating: Rating) -> f64 {
    match rating {
        Rating::Again => 1.0,
        Rating::Hard => 2.0,
        Rating::Good => 3.0,
        Rating::Easy => 4.0,
    }
}

/// Stability after the first-ever rating of a card.
fn initial_stability(rating: Rating) -> Stability {
    let s = match rating {
        Rating::Again => W[0],
        Rating::Hard => W[1],
        Rating::Good => W[2],
        Rating::Easy => W[3],
    };
    s.max(MIN_STABILITY)
}

/// Difficulty after the first-ever rating of a card.
fn initial_difficulty(rating: Rating) -> Difficulty {
    let g = grade_number(rating);
    (W[4] - (g - 3.0) * W[5]).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// The probability of recalling a card `t` days after a review, given its
/// stability.
fn retrievability(t: f64, stability: Stability) -> f64 {
    (1.0 + FACTOR * t / stability).powf(DECAY)
}

/// The interval, in days, after which retrievability decays to the target.
fn interval(target: f64, stability: Stability) -> f64 {
    (stability / FACTOR) * (target.powf(1.0 / DECAY) - 1.0)
}

fn new_difficulty(difficulty: Difficulty, rating: Rating) -> Difficulty {
    let g = grade_number(rating);
    let primed = difficulty - W[6] * (g - 3.0);
    // Mean reversion towards the initial difficulty of a Good first rating.
    let reverted = W[7] * initial_difficulty(Rating::Good) + (1.0 - W[7]) * primed;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn new_stability(
    difficulty: Difficulty,
    stability: Stability,
    retrievability: f64,
    rating: Rating,
) -> Stability {
    let s = match rating {
        Rating::Again => stability_after_forgetting(difficulty, stability, retrievability),
        _ => stability_after_recall(difficulty, stability, retrievability, rating),
    };
    s.max(MIN_STABILITY)
}

fn stability_after_recall(
    difficulty: Difficulty,
    stability: Stability,
    retrievability: f64,
    rating: Rating,
) -> Stability {
    let hard_penalty = if rating == Rating::Hard { W[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { W[16] } else { 1.0 };
    let growth = W[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-W[9])
        * ((W[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    stability * (growth + 1.0)
}

fn stability_after_forgetting(
    difficulty: Difficulty,
    stability: Stability,
    retrievability: f64,
) -> Stability {
    let s = W[11]
        * difficulty.powf(-W[12])
        * ((stability + 1.0).powf(W[13]) - 1.0)
        * (W[14] * (1.0 - retrievability)).exp();
    s.min(stability)
}

/// The scheduler's view of one card's state. This is what lives inside the
/// opaque blob; nothing outside this module reads it.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
struct CardParams {
    stability: Option<Stability>,
    difficulty: Option<Difficulty>,
    last_review: Option<Timestamp>,
}

/// The JSON of `CardParams::default()`.
const FRESH_STATE: &str = "{\"stability\":null,\"difficulty\":null,\"last_review\":null}";

/// The bundled FSRS-4.5 scheduler.
#[derive(Default)]
pub struct FsrsScheduler;

impl FsrsScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl ReviewScheduler for FsrsScheduler {
    fn initial_state(&self) -> SchedulerState {
        SchedulerState::new(FRESH_STATE)
    }

    fn next_state(
        &self,
        current: &SchedulerState,
        rating: Rating,
        now: Timestamp,
    ) -> Fallible<(SchedulerState, Timestamp)> {
        let params: CardParams = match serde_json::from_str(current.as_str()) {
            Ok(params) => params,
            Err(e) => {
                // A corrupt blob degrades to re-learning the card, not to
                // failure.
                warn!("unreadable scheduler state ({}), treating card as new", e);
                CardParams::default()
            }
        };
        let (stability, difficulty) =
            match (params.stability, params.difficulty, params.last_review) {
                (Some(s), Some(d), Some(last)) => {
                    let elapsed = (now.seconds_since(last).max(0) as f64) / SECONDS_PER_DAY;
                    let r = retrievability(elapsed, s);
                    (new_stability(d, s, r, rating), new_difficulty(d, rating))
                }
                _ => (initial_stability(rating), initial_difficulty(rating)),
            };
        let days = interval(TARGET_RECALL, stability)
            .round()
            .clamp(MIN_INTERVAL, MAX_INTERVAL) as i64;
        let due = now.plus_days(days);
        let next = CardParams {
            stability: Some(stability),
            difficulty: Some(difficulty),
            last_review: Some(now),
        };
        let blob = SchedulerState::new(serde_json::to_string(&next)?);
        Ok((blob, due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_round_trips() {
        let parsed: CardParams = serde_json::from_str(FRESH_STATE).unwrap();
        assert_eq!(parsed, CardParams::default());
        assert_eq!(serde_json::to_string(&CardParams::default()).unwrap(), FRESH_STATE);
    }

    #[test]
    fn test_first_rating_orders_stability() {
        assert!(initial_stability(Rating::Easy) > initial_stability(Rating::Good));
        assert!(initial_stability(Rating::Good) > initial_stability(Rating::Hard));
        assert!(initial_stability(Rating::Hard) > initial_stability(Rating::Again));
    }

    #[test]
    fn test_due_never_before_now() -> Fallible<()> {
        let scheduler = FsrsScheduler::new();
        let now = Timestamp::now();
        for rating in [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy] {
            let (_, due) = scheduler.next_state(&scheduler.initial_state(), rating, now)?;
            assert!(due >= now);
        }
        Ok(())
    }

    #[test]
    fn test_interval_grows_with_repeated_good() -> Fallible<()> {
        let scheduler = FsrsScheduler::new();
        let now = Timestamp::now();
        let (state, due1) = scheduler.next_state(&scheduler.initial_state(), Rating::Good, now)?;
        let later = due1;
        let (_, due2) = scheduler.next_state(&state, Rating::Good, later)?;
        assert!(due2.seconds_since(later) >= due1.seconds_since(now));
        Ok(())
    }

    #[test]
    fn test_again_shrinks_stability() -> Fallible<()> {
        let scheduler = FsrsScheduler::new();
        let now = Timestamp::now();
        let (state, due) = scheduler.next_state(&scheduler.initial_state(), Rating::Easy, now)?;
        let before: CardParams = serde_json::from_str(state.as_str()).unwrap();
        let (state, _) = scheduler.next_state(&state, Rating::Again, due)?;
        let after: CardParams = serde_json::from_str(state.as_str()).unwrap();
        assert!(after.stability.unwrap() < before.stability.unwrap());
        Ok(())
    }

    #[test]
    fn test_corrupt_blob_treated_as_new() -> Fallible<()> {
        let scheduler = FsrsScheduler::new();
        let now = Timestamp::now();
        let garbage = SchedulerState::new("not json at all");
        let (_, due) = scheduler.next_state(&garbage, Rating::Good, now)?;
        assert!(due >= now);
        Ok(())
    }

    #[test]
    fn test_retrievability_decays() {
        let r0 = retrievability(0.0, 10.0);
        let r10 = retrievability(10.0, 10.0);
        let r100 = retrievability(100.0, 10.0);
        assert!(r0 > r10);
        assert!(r10 > r100);
        assert!((r0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_at_target_is_stability() {
        // At the 0.9 target, FSRS-4.5 intervals equal stability by
        // construction.
        assert!((interval(TARGET_RECALL, 25.0) - 25.0).abs() < 1e-6);
    }
}
