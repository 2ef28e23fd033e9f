//! Engine configuration.
//!
//! Read from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "catalog_dir": "./catalog",
//!   "rules_file": "./rules.json",
//!   "power_margin_watts": 75,
//!   "disabled_rules": ["cooler_clearance"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::RuleSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Config sets both catalog_dir and catalog_url")]
    ConflictingCatalogSources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory of `<category>.json` catalog feeds.
    pub catalog_dir: Option<PathBuf>,
    /// Base URL of a catalog service serving `GET /<category>`.
    pub catalog_url: Option<String>,
    /// Rule set file replacing the built-in rules.
    pub rules_file: Option<PathBuf>,
    /// Overrides the margin of every power budget rule.
    pub power_margin_watts: Option<i64>,
    pub disabled_rules: Vec<String>,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.catalog_dir.is_some() && self.catalog_url.is_some() {
            return Err(ConfigError::ConflictingCatalogSources);
        }
        Ok(())
    }

    /// Apply margin and disabled-rule settings to a rule set.
    pub fn apply_to_rules(&self, rules: &mut RuleSet) {
        if let Some(margin) = self.power_margin_watts {
            rules.set_power_margin(margin);
        }
        rules.disable(&self.disabled_rules);
    }
}
