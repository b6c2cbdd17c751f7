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

use crate::error::Fallible;
use crate::study::StudyContext;
use crate::types::card::CardId;
use crate::types::prompt_kind::PromptKind;

pub fn add_card(
    directory: &Path,
    question: &str,
    answer: &str,
    kind: String,
    tags: Option<String>,
    context: Option<String>,
) -> Fallible<()> {
    let kind = PromptKind::try_from(kind)?;
    let study = StudyContext::open(directory)?;
    let card = study.add_card(question, answer, kind, tags, context)?;
    match card.id {
        Some(id) => println!("Added card {id}: \"{}\".", card.question),
        None => println!("Added \"{}\".", card.question),
    }
    Ok(())
}

/// Ingests the deck, then lists every card in the store.
pub fn list_cards(directory: &Path) -> Fallible<()> {
    let study = StudyContext::open(directory)?;
    study.import(None)?;
    let cards = study.cards()?;
    if cards.is_empty() {
        println!("No cards.");
        return Ok(());
    }
    for card in &cards {
        let id = match card.id {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        println!(
            "{id}\t{} >> {}\t({}:{}, {})",
            card.question, card.answer, card.source_file, card.source_line, card.kind
        );
    }
    println!("{} cards.", cards.len());
    Ok(())
}

pub fn remove_card(directory: &Path, id: i64) -> Fallible<()> {
    let study = StudyContext::open(directory)?;
    let card = study.remove_card(CardId::new(id))?;
    println!("Removed \"{}\".", card.question);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::store::Store;
    use crate::store::sqlite::DB_FILE;
    use crate::store::sqlite::SqliteStore;

    use super::*;

    #[test]
    fn test_add_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        add_card(
            dir.path(),
            "q",
            "a",
            "conceptual".to_string(),
            Some("math".to_string()),
            None,
        )
        .unwrap();
        let store = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
        let cards = store.all_cards().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].kind, PromptKind::Conceptual);
        assert_eq!(cards[0].tags, "math");
        drop(store);
        remove_card(dir.path(), cards[0].id.unwrap().into()).unwrap();
        let store = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
        assert!(store.all_cards().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_bad_kind() {
        let dir = tempfile::tempdir().unwrap();
        assert!(add_card(dir.path(), "q", "a", "trivia".to_string(), None, None).is_err());
    }

    #[test]
    fn test_list_imports_deck() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("deck.txt"), "q1>>a1\n").unwrap();
        list_cards(dir.path()).unwrap();
        let store = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
        assert_eq!(store.all_cards().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_card() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_card(dir.path(), 99).is_err());
    }
}
