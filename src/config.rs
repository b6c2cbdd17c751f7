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

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;

/// Optional per-deck configuration, read from the deck directory.
pub const CONFIG_FILE: &str = "cardbox.toml";

/// Which persistence backend a deck uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    /// Estimated seconds per card when finishing a session a crashed
    /// process left behind.
    pub orphan_seconds_per_card: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            orphan_seconds_per_card: 30,
        }
    }
}

impl Config {
    /// Loads `cardbox.toml` from the deck directory. A missing file means
    /// defaults; a file that does not parse is an error.
    pub fn load(directory: &Path) -> Fallible<Config> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&text)?;
        if config.orphan_seconds_per_card < 0 {
            return fail("orphan_seconds_per_card must not be negative.");
        }
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.orphan_seconds_per_card, 30);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "backend = \"file\"\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.orphan_seconds_per_card, 30);
    }

    #[test]
    fn test_full_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "backend = \"sqlite\"\norphan_seconds_per_card = 45\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.orphan_seconds_per_card, 45);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "backend = [oops\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_negative_orphan_seconds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "orphan_seconds_per_card = -5\n",
        )
        .unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
