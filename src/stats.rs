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
use std::sync::Arc;

use crate::error::Fallible;
use crate::store::Store;
use crate::types::daily::DailyStats;
use crate::types::daily::LearningStreak;
use crate::types::daily::TotalStats;
use crate::types::date::Date;
use crate::types::session::Session;
use crate::types::session::SessionId;
use crate::types::timestamp::Timestamp;

/// First line of the exported statistics file.
pub const CSV_HEADER: &str =
    "Date,Cards Reviewed,Session Time (min),Session Count,New Cards,Reviewed Cards";

/// Tracks study sessions, daily aggregates, and the learning streak. At
/// most one session is active at a time; rating a card while idle starts
/// one implicitly. Counters are written through to the store as they
/// change, so a crash mid-session leaves a row that orphan recovery can
/// finish on the next launch.
pub struct StatsTracker {
    store: Arc<dyn Store>,
    active: Option<(SessionId, Session)>,
    streak: LearningStreak,
    orphan_seconds_per_card: i64,
}

impl StatsTracker {
    pub fn new(store: Arc<dyn Store>, orphan_seconds_per_card: i64) -> Fallible<Self> {
        let streak = store.streak()?;
        Ok(Self {
            store,
            active: None,
            streak,
            orphan_seconds_per_card,
        })
    }

    /// Opens a session. Starting while one is active changes nothing.
    pub fn start_session(&mut self, now: Timestamp) -> Fallible<()> {
        if self.active.is_some() {
            return Ok(());
        }
        let session = Session::begin(now);
        let id = self.store.create_session(&session)?;
        log::debug!("started session {id}");
        self.active = Some((id, session));
        Ok(())
    }

    /// Counts one review against the active session, starting one if
    /// needed. Exactly one of the new/review counters moves.
    pub fn record_review(&mut self, is_new: bool, now: Timestamp) -> Fallible<()> {
        if self.active.is_none() {
            self.start_session(now)?;
        }
        if let Some((id, session)) = self.active.as_mut() {
            session.record_review(is_new);
            self.store.update_session(*id, session)?;
        }
        Ok(())
    }

    /// Closes the active session: stamps the end time, folds the counters
    /// into today's DailyStats, and advances the streak. Returns the
    /// finished session, or None when there was nothing to end.
    pub fn end_session(&mut self, now: Timestamp) -> Fallible<Option<Session>> {
        let Some((id, mut session)) = self.active.take() else {
            return Ok(None);
        };
        session.finish(now);
        self.store.update_session(id, &session)?;
        self.fold_into_day(now.local_date(), &session)?;
        self.streak.record_study(now.local_date());
        self.store.put_streak(&self.streak)?;
        log::debug!(
            "ended session {id}: {} cards in {} min",
            session.cards_reviewed,
            session.duration_minutes().unwrap_or(0)
        );
        Ok(Some(session))
    }

    /// Finishes sessions a previous process left behind. Sessions with no
    /// reviews are dropped; the rest get an estimated end time and are
    /// folded into the DailyStats of their start date. The streak is left
    /// alone. Running this twice finds nothing the second time.
    pub fn recover_orphans(&self) -> Fallible<u32> {
        let mut recovered = 0;
        for (id, mut session) in self.store.unfinished_sessions()? {
            if session.cards_reviewed == 0 {
                log::info!("dropping abandoned session {id}");
                self.store.delete_session(id)?;
                continue;
            }
            let end = session
                .started_at
                .plus_seconds(session.cards_reviewed as i64 * self.orphan_seconds_per_card);
            session.finish(end);
            self.store.update_session(id, &session)?;
            self.fold_into_day(session.started_at.local_date(), &session)?;
            log::info!(
                "recovered unfinished session {id}: {} cards, estimated {} min",
                session.cards_reviewed,
                session.duration_minutes().unwrap_or(0)
            );
            recovered += 1;
        }
        Ok(recovered)
    }

    fn fold_into_day(&self, date: Date, session: &Session) -> Fallible<()> {
        let mut day = self
            .store
            .daily_stats(date)?
            .unwrap_or_else(|| DailyStats::empty(date));
        day.absorb(session);
        self.store.put_daily_stats(&day)
    }

    pub fn today(&self) -> Fallible<DailyStats> {
        self.day_stats(Date::today_local())
    }

    /// The last 7 days including today, oldest first, zero-filled.
    pub fn weekly(&self) -> Fallible<Vec<DailyStats>> {
        self.trailing_days(Date::today_local(), 7)
    }

    /// The last 30 days including today, oldest first, zero-filled.
    pub fn monthly(&self) -> Fallible<Vec<DailyStats>> {
        self.trailing_days(Date::today_local(), 30)
    }

    pub fn all_time(&self) -> Fallible<TotalStats> {
        let mut totals = TotalStats::default();
        for day in self.store.all_daily_stats()? {
            totals.add_day(&day);
        }
        Ok(totals)
    }

    pub fn streak(&self) -> LearningStreak {
        self.streak
    }

    /// The running session, if any.
    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref().map(|(_, session)| session)
    }

    /// Writes every stored date as comma-delimited text, ascending.
    pub fn export_csv(&self, path: &Path) -> Fallible<()> {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for day in self.store.all_daily_stats()? {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                day.date,
                day.cards_reviewed,
                day.study_minutes,
                day.session_count,
                day.new_cards,
                day.review_cards
            ));
        }
        fs::write(path, out)?;
        log::debug!("exported statistics to {}", path.display());
        Ok(())
    }

    fn day_stats(&self, date: Date) -> Fallible<DailyStats> {
        Ok(self
            .store
            .daily_stats(date)?
            .unwrap_or_else(|| DailyStats::empty(date)))
    }

    fn trailing_days(&self, today: Date, days: i64) -> Fallible<Vec<DailyStats>> {
        let start = today.minus_days(days - 1);
        let found = self.store.stats_in_range(start, today)?;
        let mut by_date: BTreeMap<Date, DailyStats> =
            found.into_iter().map(|day| (day.date, day)).collect();
        let mut out = Vec::with_capacity(days as usize);
        for offset in (0..days).rev() {
            let date = today.minus_days(offset);
            out.push(
                by_date
                    .remove(&date)
                    .unwrap_or_else(|| DailyStats::empty(date)),
            );
        }
        Ok(out)
    }
}
