// src/settings.rs

use crate::domain::UserOverrides;
use crate::errors::{Result, TrackerError};
use crate::events::timeline::DEFAULT_LIMIT;
use crate::scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Everything the tracker reads from its JSON settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database_path: String,
    pub scoring: ScoringConfig,
    /// Keyed by dog id.
    pub overrides: BTreeMap<String, UserOverrides>,
    pub min_fit_score: i32,
    /// Dog names to keep a close eye on.
    pub watch_list: Vec<String>,
    pub timeline_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "rescue_tracker.db".to_string(),
            scoring: ScoringConfig::default(),
            overrides: BTreeMap::new(),
            min_fit_score: 5,
            watch_list: Vec::new(),
            timeline_limit: DEFAULT_LIMIT,
        }
    }
}

impl Settings {
    /// A missing file means defaults. A file that exists but does not parse
    /// is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| TrackerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn overrides_for(&self, dog_id: &str) -> Option<&UserOverrides> {
        self.overrides.get(dog_id).filter(|o| o.has_overrides())
    }
}
