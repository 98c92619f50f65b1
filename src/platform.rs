//! Platform (OS/arch) value type
//!
//! A `Platform` names one cross-compilation target. Identity is the
//! (os, arch) pair; the `default` flag records whether the catalog builds
//! the target when no filters are given and is carried through selection
//! unchanged.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Errors produced while parsing platform filter tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A pair token was not of the form `os/arch`
    #[error("invalid platform syntax: {token:?} should be os/arch")]
    InvalidPairSyntax { token: String },
}

/// A combination of OS/arch that can be built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Target operating system (e.g., "linux")
    pub os: String,

    /// Target architecture (e.g., "amd64")
    pub arch: String,

    /// Whether this target is built when the caller supplies no filters.
    /// Metadata only; never part of platform identity.
    #[serde(default)]
    pub default: bool,
}

impl Platform {
    /// Create a platform, lower-casing both components
    pub fn new(os: impl Into<String>, arch: impl Into<String>, default: bool) -> Self {
        Self {
            os: os.into().to_lowercase(),
            arch: arch.into().to_lowercase(),
            default,
        }
    }

    /// Parse an `os/arch` token.
    ///
    /// The token must have exactly two slash-separated components; anything
    /// else is a configuration error, never silently ignored.
    pub fn parse(token: &str) -> Result<Self, FilterError> {
        let mut parts = token.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(os), Some(arch), None) => Ok(Self::new(os, arch, false)),
            _ => Err(FilterError::InvalidPairSyntax {
                token: token.to_string(),
            }),
        }
    }

    /// Structural match on the (os, arch) pair
    pub fn matches(&self, os: &str, arch: &str) -> bool {
        self.os == os && self.arch == arch
    }
}

// Identity is (os, arch); `default` is metadata and must not affect
// matching against the supported catalog.
impl PartialEq for Platform {
    fn eq(&self, other: &Self) -> bool {
        self.os == other.os && self.arch == other.arch
    }
}

impl Eq for Platform {}

impl Hash for Platform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.os.hash(state);
        self.arch.hash(state);
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let p = Platform::parse("windows/arm").unwrap();
        assert_eq!(p.os, "windows");
        assert_eq!(p.arch, "arm");
        assert!(!p.default);
    }

    #[test]
    fn test_parse_lowercases() {
        let p = Platform::parse("Linux/AMD64").unwrap();
        assert_eq!(p.os, "linux");
        assert_eq!(p.arch, "amd64");
    }

    #[test]
    fn test_parse_rejects_missing_arch() {
        assert!(matches!(
            Platform::parse("windows"),
            Err(FilterError::InvalidPairSyntax { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_extra_component() {
        assert!(matches!(
            Platform::parse("windows/arm/bad"),
            Err(FilterError::InvalidPairSyntax { .. })
        ));
    }

    #[test]
    fn test_equality_ignores_default_flag() {
        let a = Platform::new("linux", "arm64", true);
        let b = Platform::new("linux", "arm64", false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let p = Platform::new("darwin", "amd64", true);
        assert_eq!(p.to_string(), "darwin/amd64");
    }
}
