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

pub fn export_stats(directory: &Path, output: &Path) -> Fallible<()> {
    let study = StudyContext::open(directory)?;
    study.stats().export_csv(output)?;
    println!("Wrote {}.", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::stats::CSV_HEADER;
    use crate::store::Store;
    use crate::store::sqlite::DB_FILE;
    use crate::store::sqlite::SqliteStore;
    use crate::types::daily::DailyStats;
    use crate::types::date::Date;

    use super::*;

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
            let mut day = DailyStats::empty(Date::parse("2026-07-01").unwrap());
            day.cards_reviewed = 6;
            day.session_count = 2;
            store.put_daily_stats(&day).unwrap();
        }
        let output = dir.path().join("out.csv");
        export_stats(dir.path(), &output).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.next(), Some("2026-07-01,6,0,2,0,0"));
    }
}
