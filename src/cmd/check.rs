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
use crate::parser;
use crate::store::sqlite::SqliteStore;

/// Parses the whole deck against a throwaway store, so the deck's real
/// store is left untouched. Duplicate lines within the deck show up in
/// the duplicate count.
pub fn check_deck(directory: &Path) -> Fallible<()> {
    if !directory.exists() {
        return fail("directory does not exist.");
    }
    let scratch = SqliteStore::open_in_memory()?;
    let report = parser::import_path(&scratch, directory, directory)?;
    println!("{report}");
    if report.skipped_lines > 0 {
        return fail(format!("{} lines could not be parsed.", report.skipped_lines));
    }
    println!("ok");
    Ok(())
}
