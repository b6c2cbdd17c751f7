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

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::prompt_kind::PromptKind;
use crate::types::timestamp::Timestamp;

/// A card's identity in the relational store. Cards in pure file-backed mode
/// have none.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CardId(i64);

impl CardId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl From<CardId> for i64 {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let id: i64 = FromSql::column_result(value)?;
        Ok(CardId(id))
    }
}

/// A flashcard.
#[derive(Clone, Debug)]
pub struct Card {
    /// Store identity, absent in pure file-backed mode.
    pub id: Option<CardId>,
    pub question: String,
    pub answer: String,
    /// Source locator, relative to the deck directory.
    pub source_file: String,
    /// 1-based line number within the source.
    pub source_line: u32,
    /// Optional free-text provenance, e.g. a book or chapter label.
    pub context: Option<String>,
    pub kind: PromptKind,
    /// Free-form tags, comma-separated.
    pub tags: String,
    pub created_at: Timestamp,
}

impl Card {
    /// The key that identifies this card's review state in the file-backed
    /// store and in legacy state files.
    pub fn provenance_key(&self) -> String {
        format!("{}:{}", self.source_file, self.source_line)
    }

    /// The identity this card must carry to be addressed in the relational
    /// store.
    pub fn require_id(&self) -> Fallible<CardId> {
        match self.id {
            Some(id) => Ok(id),
            None => Err(ErrorReport::unsupported(
                "card has no store identity; this operation requires the relational backend.",
            )),
        }
    }
}

/// The payload for inserting a card. The store assigns identity and the
/// creation timestamp.
#[derive(Clone, Debug)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
    pub source_file: String,
    pub source_line: u32,
    pub context: Option<String>,
    pub kind: PromptKind,
    pub tags: String,
}

impl NewCard {
    /// A card parsed from a deck line, with default metadata.
    pub fn from_line(
        question: String,
        answer: String,
        source_file: String,
        source_line: u32,
    ) -> Self {
        Self {
            question,
            answer,
            source_file,
            source_line,
            context: None,
            kind: PromptKind::default(),
            tags: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(source_file: &str, source_line: u32) -> Card {
        Card {
            id: None,
            question: "q".to_string(),
            answer: "a".to_string(),
            source_file: source_file.to_string(),
            source_line,
            context: None,
            kind: PromptKind::default(),
            tags: String::new(),
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn test_provenance_key() {
        assert_eq!(card("deck.txt", 12).provenance_key(), "deck.txt:12");
    }

    #[test]
    fn test_require_id() {
        assert!(card("deck.txt", 1).require_id().is_err());
        let mut c = card("deck.txt", 1);
        c.id = Some(CardId::new(7));
        assert_eq!(c.require_id().unwrap(), CardId::new(7));
    }
}
