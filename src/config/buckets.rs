//! Application configuration loading from config.toml
//!
//! The file is optional. When present it can list buckets to seed into the
//! registry on start-up, tune the reporting window used by the binary and
//! replace the default allocation profile.

use crate::core::allocation::TargetProfile;
use crate::errors::{Error, Result};
use crate::models::Category;
use crate::store::BucketStore;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Buckets that should exist in the registry
    #[serde(default)]
    pub buckets: Vec<BucketConfig>,
    /// Reporting settings
    #[serde(default)]
    pub report: ReportConfig,
    /// Custom target weights per category; the ARCA profile when absent
    pub target_profile: Option<BTreeMap<Category, f64>>,
}

impl Config {
    /// The configured allocation profile, or ARCA.
    ///
    /// # Errors
    /// Returns `Error::Validation` when the custom weights do not sum to 100%.
    pub fn target_profile(&self) -> Result<TargetProfile> {
        self.target_profile
            .clone()
            .map_or_else(|| Ok(TargetProfile::arca()), TargetProfile::new)
    }
}

/// Configuration for a single bucket
#[derive(Debug, Deserialize, Clone)]
pub struct BucketConfig {
    /// Name of the bucket
    pub name: String,
    /// Asset class applied when the bucket is created
    pub category: Option<Category>,
}

/// Reporting window used by the binary
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReportConfig {
    /// How many days back the history summary covers
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    /// Annual CDI rate as a fraction (`0.135`); enables the CDI comparison
    pub cdi_annual_rate: Option<f64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            history_days: DEFAULT_HISTORY_DAYS,
            cdi_annual_rate: None,
        }
    }
}

const fn default_history_days() -> u32 {
    DEFAULT_HISTORY_DAYS
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: the default configuration is returned.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        debug!("No config file at {}, using defaults", path);
        return Ok(Config::default());
    }
    load_config(path)
}

/// Creates every configured bucket that is not registered yet.
///
/// Returns the number of buckets created.
pub async fn seed_buckets(store: &dyn BucketStore, config: &Config) -> Result<usize> {
    let existing = store.list_buckets().await?;
    let mut created = 0;

    for bucket in &config.buckets {
        let name = bucket.name.trim();
        if existing.iter().any(|b| b.name == name) {
            continue;
        }
        let id = store.create_bucket(name).await?;
        if bucket.category.is_some() {
            store.set_bucket_category(id, bucket.category).await?;
        }
        info!("Seeded bucket '{}' with id {}", name, id);
        created += 1;
    }

    Ok(created)
}
