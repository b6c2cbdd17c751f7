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

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

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

/// The relational store file inside a deck directory.
pub const DB_FILE: &str = "cardbox.db";

/// The relational backend. Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// A throwaway in-memory database, for tests.
    pub fn open_in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Fallible<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl Store for SqliteStore {
    fn insert_card(&self, card: NewCard) -> Fallible<Card> {
        if self.card_exists(&card.question, &card.answer)? {
            return Err(ErrorReport::duplicate(
                "a card with this question and answer already exists.",
            ));
        }
        log::debug!("adding card from {}:{}", card.source_file, card.source_line);
        let created_at = Timestamp::now();
        let conn = self.acquire();
        let sql = "insert into cards (question, answer, source_file, source_line, context, prompt_kind, tags, created_at) values (?, ?, ?, ?, ?, ?, ?, ?) returning card_id;";
        let card_id: CardId = conn.query_row(
            sql,
            (
                &card.question,
                &card.answer,
                &card.source_file,
                card.source_line,
                &card.context,
                card.kind,
                &card.tags,
                created_at,
            ),
            |row| row.get(0),
        )?;
        Ok(Card {
            id: Some(card_id),
            question: card.question,
            answer: card.answer,
            source_file: card.source_file,
            source_line: card.source_line,
            context: card.context,
            kind: card.kind,
            tags: card.tags,
            created_at,
        })
    }

    fn card_exists(&self, question: &str, answer: &str) -> Fallible<bool> {
        let conn = self.acquire();
        let sql = "select count(*) from cards where question = ? and answer = ?;";
        let count: i64 = conn.query_row(sql, (question, answer), |row| row.get(0))?;
        Ok(count > 0)
    }

    fn all_cards(&self) -> Fallible<Vec<Card>> {
        let mut cards = Vec::new();
        let conn = self.acquire();
        let mut stmt = conn.prepare(&format!(
            "select {} from cards order by card_id;",
            CARD_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            cards.push(read_card(row)?);
        }
        Ok(cards)
    }

    fn get_card(&self, id: CardId) -> Fallible<Card> {
        let conn = self.acquire();
        let sql = format!("select {} from cards where card_id = ?;", CARD_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(read_card(row)?),
            None => Err(ErrorReport::not_found(format!("no card with id {}.", id))),
        }
    }

    fn find_card(&self, source_file: &str, source_line: u32) -> Fallible<Option<Card>> {
        let conn = self.acquire();
        let sql = format!(
            "select {} from cards where source_file = ? and source_line = ?;",
            CARD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query((source_file, source_line))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_card(row)?)),
            None => Ok(None),
        }
    }

    fn update_card(&self, card: &Card) -> Fallible<()> {
        let id = card.require_id()?;
        let conn = self.acquire();
        let sql = "update cards set question = ?, answer = ?, context = ?, prompt_kind = ?, tags = ? where card_id = ?;";
        let affected = conn.execute(
            sql,
            (
                &card.question,
                &card.answer,
                &card.context,
                card.kind,
                &card.tags,
                id,
            ),
        )?;
        if affected == 0 {
            return Err(ErrorReport::not_found(format!("no card with id {}.", id)));
        }
        Ok(())
    }

    fn delete_card(&self, id: CardId) -> Fallible<()> {
        let conn = self.acquire();
        // The review state goes with it, by cascade.
        let affected = conn.execute("delete from cards where card_id = ?;", [id])?;
        if affected == 0 {
            return Err(ErrorReport::not_found(format!("no card with id {}.", id)));
        }
        Ok(())
    }

    fn review_state(&self, card: &Card) -> Fallible<Option<ReviewState>> {
        let id = card.require_id()?;
        let conn = self.acquire();
        let sql = "select scheduler_state, last_review, review_count, due_at from review_states where card_id = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(ReviewState {
                scheduler_state: row.get(0)?,
                last_review: row.get(1)?,
                review_count: row.get(2)?,
                due_at: row.get(3)?,
            })),
            None => Ok(None),
        }
    }

    fn put_review_state(&self, card: &Card, state: &ReviewState) -> Fallible<()> {
        let id = card.require_id()?;
        let conn = self.acquire();
        let sql = "insert into review_states (card_id, scheduler_state, last_review, review_count, due_at) values (?, ?, ?, ?, ?) on conflict (card_id) do update set scheduler_state = excluded.scheduler_state, last_review = excluded.last_review, review_count = excluded.review_count, due_at = excluded.due_at;";
        conn.execute(
            sql,
            (
                id,
                &state.scheduler_state,
                state.last_review,
                state.review_count,
                state.due_at,
            ),
        )?;
        Ok(())
    }

    fn delete_review_state(&self, card: &Card) -> Fallible<()> {
        let id = card.require_id()?;
        let conn = self.acquire();
        conn.execute("delete from review_states where card_id = ?;", [id])?;
        Ok(())
    }

    fn create_session(&self, session: &Session) -> Fallible<SessionId> {
        let conn = self.acquire();
        let sql = "insert into sessions (started_at, ended_at, cards_reviewed, new_cards, review_cards) values (?, ?, ?, ?, ?) returning session_id;";
        let session_id: SessionId = conn.query_row(
            sql,
            (
                session.started_at,
                session.ended_at,
                session.cards_reviewed,
                session.new_cards,
                session.review_cards,
            ),
            |row| row.get(0),
        )?;
        Ok(session_id)
    }

    fn update_session(&self, id: SessionId, session: &Session) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "update sessions set started_at = ?, ended_at = ?, cards_reviewed = ?, new_cards = ?, review_cards = ? where session_id = ?;";
        let affected = conn.execute(
            sql,
            (
                session.started_at,
                session.ended_at,
                session.cards_reviewed,
                session.new_cards,
                session.review_cards,
                id,
            ),
        )?;
        if affected == 0 {
            return Err(ErrorReport::not_found(format!("no session with id {}.", id)));
        }
        Ok(())
    }

    fn unfinished_sessions(&self) -> Fallible<Vec<(SessionId, Session)>> {
        let mut sessions = Vec::new();
        let conn = self.acquire();
        let sql = "select session_id, started_at, ended_at, cards_reviewed, new_cards, review_cards from sessions where ended_at is null order by session_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: SessionId = row.get(0)?;
            sessions.push((id, read_session(row)?));
        }
        Ok(sessions)
    }

    fn delete_session(&self, id: SessionId) -> Fallible<()> {
        let conn = self.acquire();
        let affected = conn.execute("delete from sessions where session_id = ?;", [id])?;
        if affected == 0 {
            return Err(ErrorReport::not_found(format!("no session with id {}.", id)));
        }
        Ok(())
    }

    fn daily_stats(&self, date: Date) -> Fallible<Option<DailyStats>> {
        let conn = self.acquire();
        let sql = "select day, cards_reviewed, study_minutes, session_count, new_cards, review_cards from daily_stats where day = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([date])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_daily_stats(row)?)),
            None => Ok(None),
        }
    }

    fn put_daily_stats(&self, stats: &DailyStats) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "insert into daily_stats (day, cards_reviewed, study_minutes, session_count, new_cards, review_cards) values (?, ?, ?, ?, ?, ?) on conflict (day) do update set cards_reviewed = excluded.cards_reviewed, study_minutes = excluded.study_minutes, session_count = excluded.session_count, new_cards = excluded.new_cards, review_cards = excluded.review_cards;";
        conn.execute(
            sql,
            (
                stats.date,
                stats.cards_reviewed,
                stats.study_minutes,
                stats.session_count,
                stats.new_cards,
                stats.review_cards,
            ),
        )?;
        Ok(())
    }

    fn stats_in_range(&self, start: Date, end: Date) -> Fallible<Vec<DailyStats>> {
        let mut days = Vec::new();
        let conn = self.acquire();
        let sql = "select day, cards_reviewed, study_minutes, session_count, new_cards, review_cards from daily_stats where day >= ? and day <= ? order by day;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((start, end))?;
        while let Some(row) = rows.next()? {
            days.push(read_daily_stats(row)?);
        }
        Ok(days)
    }

    fn all_daily_stats(&self) -> Fallible<Vec<DailyStats>> {
        let mut days = Vec::new();
        let conn = self.acquire();
        let sql = "select day, cards_reviewed, study_minutes, session_count, new_cards, review_cards from daily_stats order by day;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            days.push(read_daily_stats(row)?);
        }
        Ok(days)
    }

    fn streak(&self) -> Fallible<LearningStreak> {
        let conn = self.acquire();
        let sql = "select current, longest, last_study_date from streak where streak_id = 1;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(LearningStreak {
                current: row.get(0)?,
                longest: row.get(1)?,
                last_study_date: row.get(2)?,
            }),
            None => Ok(LearningStreak::default()),
        }
    }

    fn put_streak(&self, streak: &LearningStreak) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "insert into streak (streak_id, current, longest, last_study_date) values (1, ?, ?, ?) on conflict (streak_id) do update set current = excluded.current, longest = excluded.longest, last_study_date = excluded.last_study_date;";
        conn.execute(sql, (streak.current, streak.longest, streak.last_study_date))?;
        Ok(())
    }
}

const CARD_COLUMNS: &str =
    "card_id, question, answer, source_file, source_line, context, prompt_kind, tags, created_at";

fn read_card(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: Some(row.get(0)?),
        question: row.get(1)?,
        answer: row.get(2)?,
        source_file: row.get(3)?,
        source_line: row.get(4)?,
        context: row.get(5)?,
        kind: row.get(6)?,
        tags: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn read_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        started_at: row.get(1)?,
        ended_at: row.get(2)?,
        cards_reviewed: row.get(3)?,
        new_cards: row.get(4)?,
        review_cards: row.get(5)?,
    })
}

fn read_daily_stats(row: &Row) -> rusqlite::Result<DailyStats> {
    Ok(DailyStats {
        date: row.get(0)?,
        cards_reviewed: row.get(1)?,
        study_minutes: row.get(2)?,
        session_count: row.get(3)?,
        new_cards: row.get(4)?,
        review_cards: row.get(5)?,
    })
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' and name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
