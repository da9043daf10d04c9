use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trk_types::Address;

/// Local tracker deployment: who the producer is and where the journal lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub producer: Address,
    #[serde(default = "default_journal")]
    pub journal: PathBuf,
}

fn default_journal() -> PathBuf {
    PathBuf::from("trk-journal.jsonl")
}

impl CliConfig {
    pub fn new(producer: Address, journal: Option<PathBuf>) -> Self {
        Self {
            producer,
            journal: journal.unwrap_or_else(default_journal),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing config {}", path.display()))
    }

    /// Journal path; relative paths resolve against the config file's directory.
    pub fn journal_path(&self, config_path: &Path) -> PathBuf {
        if self.journal.is_absolute() {
            return self.journal.clone();
        }
        config_path
            .parent()
            .map(|dir| dir.join(&self.journal))
            .unwrap_or_else(|| self.journal.clone())
    }
}
