//! Repo configuration (.crossgo.toml)
//!
//! Two layers: the optional config file supplies defaults, CLI flags
//! override field-by-field. A missing file is not an error; a malformed
//! one fails the run before any selection or build.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

/// Default config file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".crossgo.toml";

/// Errors from loading the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Build configuration; every field optional so layers can overlay
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Space-separated OS filter tokens
    pub os: Option<String>,

    /// Space-separated architecture filter tokens
    pub arch: Option<String>,

    /// Space-separated os/arch pair filter tokens
    pub osarch: Option<String>,

    /// Parallel build count; non-positive means host parallelism
    pub parallel: Option<i64>,

    /// Output path template
    pub output: Option<String>,

    /// Value passed to `go build -ldflags`
    pub ldflags: Option<String>,
}

impl BuildConfig {
    /// Load from a file; a missing file yields the empty config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: err,
                })
            }
        };

        toml::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            source: err,
        })
    }

    /// Overlay another config on top of this one; set fields in the
    /// overlay win
    pub fn merged_with(self, overlay: Self) -> Self {
        Self {
            os: overlay.os.or(self.os),
            arch: overlay.arch.or(self.arch),
            osarch: overlay.osarch.or(self.osarch),
            parallel: overlay.parallel.or(self.parallel),
            output: overlay.output.or(self.output),
            ldflags: overlay.ldflags.or(self.ldflags),
        }
    }
}
