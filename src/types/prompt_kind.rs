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
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::error::ErrorReport;
use crate::error::fail;

/// What kind of recall a card exercises.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PromptKind {
    #[default]
    Factual,
    Conceptual,
    Application,
    Comparison,
}

impl PromptKind {
    pub fn as_str(&self) -> &str {
        match self {
            PromptKind::Factual => "factual",
            PromptKind::Conceptual => "conceptual",
            PromptKind::Application => "application",
            PromptKind::Comparison => "comparison",
        }
    }
}

impl Display for PromptKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PromptKind {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "factual" => Ok(PromptKind::Factual),
            "conceptual" => Ok(PromptKind::Conceptual),
            "application" => Ok(PromptKind::Application),
            "comparison" => Ok(PromptKind::Comparison),
            _ => fail(format!("Invalid prompt kind: {}", value)),
        }
    }
}

impl ToSql for PromptKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PromptKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        PromptKind::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
