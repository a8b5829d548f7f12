//! Back-office configuration.
//!
//! Loads and validates `folio.toml`. Every section and key has a stock value,
//! so the file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! root = ".folio"              # Directory holding tables.json and objects/
//! public_url = "/storage/v1/object/public"   # Prefix for public object URLs
//!
//! [storage]
//! bucket = "project-images"    # Bucket for logos and cover images
//!
//! [catalog]
//! # path = "catalog.toml"      # Replace the bundled catalog
//!
//! [classification]
//! case_study_slots = 3         # Untyped projects in these leading slots are case studies
//!
//! [display]
//! client_fallback = "Confidential"
//! role_fallback = "Design & Development"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filters::{Classifier, LEGACY_CASE_STUDY_SLOTS};
use crate::types::{CLIENT_FALLBACK, ROLE_FALLBACK};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "folio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `folio.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Where the local data store lives.
    pub store: StoreConfig,
    /// Object storage settings for uploads.
    pub storage: StorageConfig,
    /// Static catalog override.
    pub catalog: CatalogConfig,
    /// Homepage section rules.
    pub classification: ClassificationConfig,
    /// Labels shown for missing project fields.
    pub display: DisplayConfig,
}

impl FolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store.root must not be empty".into(),
            ));
        }
        let bucket = &self.storage.bucket;
        if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
            return Err(ConfigError::Validation(format!(
                "storage.bucket '{bucket}' must be a single non-empty path segment"
            )));
        }
        Ok(())
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.classification.case_study_slots)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory for `tables.json` and uploaded objects. Relative paths are
    /// resolved against the config directory.
    pub root: PathBuf,
    /// Prefix for public URLs of uploaded objects.
    pub public_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".folio"),
            public_url: "/storage/v1/object/public".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "project-images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog file to use instead of the bundled one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassificationConfig {
    /// Untyped published projects at these leading positions are case
    /// studies. `0` sends every untyped project to selected works.
    pub case_study_slots: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            case_study_slots: LEGACY_CASE_STUDY_SLOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub client_fallback: String,
    pub role_fallback: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            client_fallback: CLIENT_FALLBACK.to_string(),
            role_fallback: ROLE_FALLBACK.to_string(),
        }
    }
}

// =============================================================================
// Loading and validation
// =============================================================================

/// Read `folio.toml` from `dir`; `None` when there is no such file.
fn read_config_file(dir: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(dir.join(CONFIG_FILENAME)) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse and validate config text. Sections and keys the text leaves out
/// take their stock values.
pub fn parse_config(text: &str) -> Result<FolioConfig, ConfigError> {
    let config: FolioConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `folio.toml` in `dir`, with relative paths made
/// relative to `dir`.
pub fn load_config(dir: &Path) -> Result<FolioConfig, ConfigError> {
    let mut config = match read_config_file(dir)? {
        Some(text) => parse_config(&text)?,
        None => FolioConfig::default(),
    };
    if config.store.root.is_relative() {
        config.store.root = dir.join(&config.store.root);
    }
    if let Some(path) = config.catalog.path.as_mut()
        && path.is_relative()
    {
        *path = dir.join(&*path);
    }
    Ok(config)
}

/// Returns a fully-commented stock `folio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Local data store
# ---------------------------------------------------------------------------
[store]
# Directory holding tables.json and uploaded objects.
# Relative to the directory containing this file.
root = ".folio"

# Prefix for public URLs of uploaded objects.
public_url = "/storage/v1/object/public"

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[storage]
# Bucket for partner logos and project cover images.
bucket = "project-images"

# ---------------------------------------------------------------------------
# Static catalog
# ---------------------------------------------------------------------------
[catalog]
# Catalog file to use instead of the bundled one.
# path = "catalog.toml"

# ---------------------------------------------------------------------------
# Homepage sections
# ---------------------------------------------------------------------------
[classification]
# Projects without a project_type are placed by position: the first N
# published ones are case studies, the rest selected works.
# Set to 0 to send every untyped project to selected works.
case_study_slots = 3

# ---------------------------------------------------------------------------
# Display
# ---------------------------------------------------------------------------
[display]
# Shown when a project has no client.
client_fallback = "Confidential"

# Shown when a project has no role.
role_fallback = "Design & Development"
"##
}
