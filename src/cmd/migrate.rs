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
use crate::error::fail;
use crate::migrate::migrate_legacy;
use crate::parser;
use crate::store::sqlite::DB_FILE;
use crate::store::sqlite::SqliteStore;

/// Ingests the deck into the relational store, then moves legacy JSON
/// review states and statistics over. The import has to come first so the
/// legacy states have cards to attach to.
pub fn migrate_deck(directory: &Path) -> Fallible<()> {
    if !directory.exists() {
        return fail("directory does not exist.");
    }
    let db = SqliteStore::open(&directory.join(DB_FILE))?;
    let report = parser::import_path(&db, directory, directory)?;
    println!("{report}");
    let migration = migrate_legacy(&db, directory)?;
    println!("{migration}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::scheduler::SchedulerState;
    use crate::store::Store;
    use crate::store::json::STATE_FILE;
    use crate::types::state::ReviewState;
    use crate::types::timestamp::Timestamp;

    use super::*;

    #[test]
    fn test_migrate_deck_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("deck.txt"), "q1>>a1\nq2>>a2\n").unwrap();
        let mut state = ReviewState::fresh(SchedulerState::new("{}"), Timestamp::now());
        state.review_count = 4;
        let states: std::collections::BTreeMap<String, ReviewState> =
            [("deck.txt:2".to_string(), state)].into_iter().collect();
        fs::write(
            dir.path().join(STATE_FILE),
            serde_json::to_string_pretty(&states).unwrap(),
        )
        .unwrap();

        migrate_deck(dir.path()).unwrap();
        let db = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
        let cards = db.all_cards().unwrap();
        assert_eq!(cards.len(), 2);
        let migrated = db.review_state(&cards[1]).unwrap().unwrap();
        assert_eq!(migrated.review_count, 4);
    }
}
