// Runtime settings: source pages, timeouts, cache lifetime and bundle naming

use crate::error::{CoreError, Result};
use geodata_scanner::client::{DEFAULT_DISCOVERY_TIMEOUT_SECS, DEFAULT_DOWNLOAD_TIMEOUT_SECS};
use geodata_scanner::{SourceDefinition, default_sources};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Contents of the configuration file written by `geodata init`
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_ARCHIVE_PREFIX: &str = "Geodata_IMAC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub discovery_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub archive_prefix: String,
    pub sources: Vec<SourceDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            sources: default_sources(),
        }
    }
}

impl Settings {
    /// Read, parse and validate a TOML settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(CoreError::Config("timeouts must be greater than zero".into()));
        }
        validate_filename("archive_prefix", &self.archive_prefix)?;

        // Two targets saving to the same name would overwrite each other in the bundle
        let mut filenames = HashSet::new();

        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(CoreError::Config(format!(
                    "source for {} has an empty name",
                    source.page_url
                )));
            }
            validate_page_url(source)?;

            for target in &source.targets {
                if target.term.trim().is_empty() {
                    return Err(CoreError::Config(format!(
                        "source {} has a target with an empty term",
                        source.name
                    )));
                }
                validate_filename(&format!("{}/{}", source.name, target.term), &target.filename)?;
                if !filenames.insert(target.filename.as_str()) {
                    return Err(CoreError::Config(format!(
                        "output filename '{}' is used by more than one target",
                        target.filename
                    )));
                }
            }
        }

        Ok(())
    }
}

fn validate_page_url(source: &SourceDefinition) -> Result<()> {
    let url = Url::parse(&source.page_url).map_err(|e| {
        CoreError::Config(format!(
            "source {} has an invalid page_url '{}': {}",
            source.name, source.page_url, e
        ))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CoreError::Config(format!(
            "source {} uses unsupported scheme '{}'",
            source.name, other
        ))),
    }
}

/// Output names land directly inside the scratch directory, so they must be
/// plain file names.
pub(crate) fn is_plain_filename(name: &str) -> bool {
    !(name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\'))
}

fn validate_filename(field: &str, name: &str) -> Result<()> {
    if !is_plain_filename(name) {
        return Err(CoreError::Config(format!(
            "{}: '{}' is not a valid file name",
            field, name
        )));
    }
    Ok(())
}
