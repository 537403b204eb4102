//! Configuration types and loading logic.
//!
//! `Config` is a direct 1-to-1 mapping of `run_backup.conf.yaml`.  Unlike a
//! general-purpose config file nothing here has a sensible default apart from
//! `locations.<key>.enabled`: a missing section is a parse error.
//!
//! # File format
//!
//! ```yaml
//! general:
//!   configRevision: 2
//!   region: DFW
//!
//! authentication:
//!   apiuser: alice
//!   apikey: 0123456789abcdef
//!
//! locations:
//!   web01:
//!     backupConfigurationId: 123456
//!   db01:
//!     enabled: false
//!     backupConfigurationId: 654321
//! ```

use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only configuration revision this build understands.
pub const SUPPORTED_CONFIG_REVISION: u32 = 2;

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Root configuration object, deserialised from the YAML config file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,

    pub authentication: AuthenticationConfig,

    /// Locations to back up, keyed by a name of the operator's choosing.
    ///
    /// `None` covers both an absent key and an explicit `locations:` with
    /// nothing under it.
    #[serde(default)]
    pub locations: Option<BTreeMap<String, LocationConfig>>,
}

impl Config {
    /// Configured locations, empty when the section is missing.
    pub fn locations(&self) -> impl Iterator<Item = (&String, &LocationConfig)> {
        self.locations.iter().flatten()
    }

    pub fn has_locations(&self) -> bool {
        self.locations.as_ref().is_some_and(|l| !l.is_empty())
    }

    pub fn location(&self, key: &str) -> Option<&LocationConfig> {
        self.locations.as_ref()?.get(key)
    }
}

// ─── general ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Schema version of the file; must equal [`SUPPORTED_CONFIG_REVISION`].
    #[serde(rename = "configRevision")]
    pub config_revision: u32,

    /// Datacenter whose backup endpoint is used, e.g. `"DFW"`.
    ///
    /// Matched exactly (case-sensitive) against the service catalog.
    pub region: String,
}

// ─── authentication ───────────────────────────────────────────────────────────

/// Identity API credentials.
#[derive(Deserialize)]
pub struct AuthenticationConfig {
    pub apiuser: String,
    pub apikey: String,
}

// Keeps the API key out of `--verbose` and `--print-config` output.
impl fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("apiuser", &self.apiuser)
            .field("apikey", &"<redacted>")
            .finish()
    }
}

// ─── locations ────────────────────────────────────────────────────────────────

/// A single backup target.
#[derive(Debug, Deserialize)]
pub struct LocationConfig {
    /// Disabled locations are skipped without counting as failures.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Provider-side backup configuration this location maps to.
    #[serde(rename = "backupConfigurationId")]
    pub backup_configuration_id: BackupConfigurationId,
}

/// Opaque backup configuration identifier.
///
/// The backup API issues numeric ids, but the value is passed through to the
/// request body exactly as written so quoted ids keep working.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BackupConfigurationId {
    Number(u64),
    Text(String),
}

impl fmt::Display for BackupConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub const fn default_enabled() -> bool {
    true
}

// ─── Loader ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("this version requires configuration revision {expected}, found {found}")]
    UnsupportedRevision { found: u32, expected: u32 },
}

/// Read, parse and validate a `Config` from `path`.
///
/// Nothing is defaulted beyond `enabled`; a file with the wrong
/// `configRevision` is rejected before the caller can act on it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if cfg.general.config_revision != SUPPORTED_CONFIG_REVISION {
        return Err(ConfigError::UnsupportedRevision {
            found: cfg.general.config_revision,
            expected: SUPPORTED_CONFIG_REVISION,
        });
    }

    Ok(cfg)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
