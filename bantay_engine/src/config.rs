//! Runtime configuration loaded from `bantay.toml`.
//!
//! Every section has defaults, so a missing or partial file is fine. Two environment
//! variables override the search settings after the file is read: `MEILISEARCH_HOST` and
//! `MEILISEARCH_INDEX_NAME`.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bantay_data::EntityKind;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::rank::RankConfig;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "bantay.toml";
pub const HOST_VAR: &str = "MEILISEARCH_HOST";
pub const INDEX_VAR: &str = "MEILISEARCH_INDEX_NAME";

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BantayConfig {
    pub search: SearchConfig,
    pub rank: RankConfig,
    pub split: SplitConfig,
}

/// Where the search service lives and which indices hold what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub host: String,
    /// Index holding one document per contract.
    pub contracts_index: String,
    pub indices: IndexNames,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:7700".to_string(),
            contracts_index: "philgeps".to_string(),
            indices: IndexNames::default(),
        }
    }
}

/// Aggregate index name for each entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexNames {
    pub awardees: String,
    pub organizations: String,
    pub locations: String,
    pub categories: String,
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            awardees: EntityKind::Awardees.default_index().to_string(),
            organizations: EntityKind::Organizations.default_index().to_string(),
            locations: EntityKind::Locations.default_index().to_string(),
            categories: EntityKind::Categories.default_index().to_string(),
        }
    }
}

impl IndexNames {
    pub fn index_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Awardees => &self.awardees,
            EntityKind::Organizations => &self.organizations,
            EntityKind::Locations => &self.locations,
            EntityKind::Categories => &self.categories,
        }
    }
}

/// CSV batching for index imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub batch_size: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { batch_size: 50_000 }
    }
}

/// Loads configuration from a TOML file, falling back to defaults on error.
///
/// This function never fails. Environment overrides are applied either way.
///
/// # Logging
/// - `info!` on successful load
/// - `warn!` if the file cannot be read or parsed
pub fn load_config(toml_path: &Path) -> BantayConfig {
    let mut config = match try_load_config(toml_path) {
        Ok(config) => {
            info!("configuration loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load configuration from '{}': {e:#}. Using defaults.",
                toml_path.display()
            );
            BantayConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| env::var(name).ok());
    config
}

/// Attempts to load configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn try_load_config(toml_path: &Path) -> Result<BantayConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading configuration from '{}'", toml_path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing configuration from '{}'", toml_path.display()))
}

/// Apply search overrides from the environment, read through `lookup`.
pub fn apply_env_overrides(config: &mut BantayConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup(HOST_VAR).filter(|v| !v.trim().is_empty()) {
        info!("search host overridden by {HOST_VAR}");
        config.search.host = host;
    }
    if let Some(index) = lookup(INDEX_VAR).filter(|v| !v.trim().is_empty()) {
        info!("contracts index overridden by {INDEX_VAR}");
        config.search.contracts_index = index;
    }
}
