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

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::store::Store;
use crate::types::card::NewCard;

/// Separator candidates, tried in order. The first one found anywhere in
/// the line is the one the line is split on.
pub const SEPARATORS: [&str; 3] = [">>", "::", "|"];

/// Upper bound, in bytes, on a question or answer.
pub const MAX_FIELD_LEN: usize = 1000;

/// How many issues a rendered report shows before eliding the rest.
const MAX_REPORTED_ISSUES: usize = 10;

/// Snippets longer than this many characters are cut down.
const MAX_SNIPPET_LEN: usize = 50;

/// Why a line was not turned into a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    InvalidEncoding,
    NoSeparator,
    WrongPartCount { separator: &'static str },
    EmptyQuestion,
    EmptyAnswer,
    QuestionTooLong,
    AnswerTooLong,
    StoreFailed { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidEncoding => write!(f, "line is not valid utf-8"),
            SkipReason::NoSeparator => {
                write!(f, "no separator (\">>\", \"::\", or \"|\") found")
            }
            SkipReason::WrongPartCount { separator } => write!(
                f,
                "separator \"{separator}\" must split the line into exactly two parts"
            ),
            SkipReason::EmptyQuestion => write!(f, "empty question"),
            SkipReason::EmptyAnswer => write!(f, "empty answer"),
            SkipReason::QuestionTooLong => {
                write!(f, "question exceeds {MAX_FIELD_LEN} bytes")
            }
            SkipReason::AnswerTooLong => {
                write!(f, "answer exceeds {MAX_FIELD_LEN} bytes")
            }
            SkipReason::StoreFailed { message } => {
                write!(f, "could not store card: {message}")
            }
        }
    }
}

/// One skipped line, with enough context to find it in the deck.
#[derive(Clone, Debug)]
pub struct ParseIssue {
    pub source: String,
    pub line: u32,
    pub snippet: String,
    pub reason: SkipReason,
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: \"{}\"",
            self.source, self.line, self.reason, self.snippet
        )
    }
}

/// The outcome of ingesting one file or a whole deck directory.
#[derive(Clone, Debug, Default)]
pub struct ParseReport {
    pub total_lines: u32,
    pub valid_cards: u32,
    pub imported: u32,
    pub duplicates: u32,
    pub skipped_lines: u32,
    pub issues: Vec<ParseIssue>,
}

impl ParseReport {
    pub fn merge(&mut self, other: ParseReport) {
        self.total_lines += other.total_lines;
        self.valid_cards += other.valid_cards;
        self.imported += other.imported;
        self.duplicates += other.duplicates;
        self.skipped_lines += other.skipped_lines;
        self.issues.extend(other.issues);
    }
}

impl std::fmt::Display for ParseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "read {} lines: {} cards imported, {} duplicates skipped, {} lines skipped",
            self.total_lines, self.imported, self.duplicates, self.skipped_lines
        )?;
        for issue in self.issues.iter().take(MAX_REPORTED_ISSUES) {
            write!(f, "\n  {issue}")?;
        }
        if self.issues.len() > MAX_REPORTED_ISSUES {
            write!(f, "\n  ... and {} more.", self.issues.len() - MAX_REPORTED_ISSUES)?;
        }
        Ok(())
    }
}

/// Splits one line into a question and an answer. Blank and `#`-prefixed
/// lines are the caller's concern; everything else that fails yields a
/// [SkipReason].
pub fn parse_line(line: &str) -> Result<(String, String), SkipReason> {
    let separator = SEPARATORS
        .iter()
        .find(|sep| line.contains(**sep))
        .ok_or(SkipReason::NoSeparator)?;
    let parts: Vec<&str> = line.split(separator).collect();
    if parts.len() != 2 {
        return Err(SkipReason::WrongPartCount { separator });
    }
    let question = parts[0].trim();
    let answer = parts[1].trim();
    if question.is_empty() {
        return Err(SkipReason::EmptyQuestion);
    }
    if answer.is_empty() {
        return Err(SkipReason::EmptyAnswer);
    }
    if question.len() > MAX_FIELD_LEN {
        return Err(SkipReason::QuestionTooLong);
    }
    if answer.len() > MAX_FIELD_LEN {
        return Err(SkipReason::AnswerTooLong);
    }
    Ok((question.to_string(), answer.to_string()))
}

/// Reads one deck file and inserts every parseable line into the store.
/// Lines that already exist as cards are skipped without comment; lines
/// that cannot be parsed are reported. One bad line never blocks the rest
/// of the file.
pub fn import_file(store: &dyn Store, root: &Path, path: &Path) -> Fallible<ParseReport> {
    let source = relative_locator(root, path);
    let bytes = fs::read(path)?;
    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut report = ParseReport::default();
    for (index, raw) in lines.iter().enumerate() {
        let line_no = (index + 1) as u32;
        report.total_lines += 1;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => {
                report.skipped_lines += 1;
                report.issues.push(ParseIssue {
                    source: source.clone(),
                    line: line_no,
                    snippet: snippet(&String::from_utf8_lossy(raw)),
                    reason: SkipReason::InvalidEncoding,
                });
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (question, answer) = match parse_line(line) {
            Ok(fields) => fields,
            Err(reason) => {
                report.skipped_lines += 1;
                report.issues.push(ParseIssue {
                    source: source.clone(),
                    line: line_no,
                    snippet: snippet(line),
                    reason,
                });
                continue;
            }
        };
        report.valid_cards += 1;
        let card = NewCard::from_line(question, answer, source.clone(), line_no);
        match store.insert_card(card) {
            Ok(_) => report.imported += 1,
            Err(e) if e.kind() == ErrorKind::Duplicate => report.duplicates += 1,
            Err(e) => report.issues.push(ParseIssue {
                source: source.clone(),
                line: line_no,
                snippet: snippet(line),
                reason: SkipReason::StoreFailed {
                    message: e.to_string(),
                },
            }),
        }
    }
    Ok(report)
}

/// Ingests a deck file, or every `.txt` file under a deck directory in
/// lexicographic order.
pub fn import_path(store: &dyn Store, root: &Path, path: &Path) -> Fallible<ParseReport> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return import_file(store, root, path);
    }
    let mut report = ParseReport::default();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "txt") {
            report.merge(import_file(store, root, entry.path())?);
        }
    }
    Ok(report)
}

fn relative_locator(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().into_owned()
}

fn snippet(line: &str) -> String {
    if line.chars().count() <= MAX_SNIPPET_LEN {
        line.to_string()
    } else {
        let head: String = line.chars().take(MAX_SNIPPET_LEN - 3).collect();
        format!("{head}...")
    }
}
