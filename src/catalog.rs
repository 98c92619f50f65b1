//! Version-keyed catalog of supported platforms
//!
//! The catalog is built once at startup by successive refinement: each
//! toolchain release derives its platform list from the previous release
//! via an explicit add set and drop set. Keeping the history as deltas
//! rather than independent literal lists keeps platform support auditable
//! and prevents adjacent releases from silently diverging. Dropping an
//! entry that is not present in the running list is a construction bug and
//! fails the whole build-up immediately.
//!
//! Lookup is fail-open: a version that cannot be parsed, or that predates
//! every declared release, resolves to the latest known list.

use crate::platform::Platform;

/// Errors raised while constructing the catalog.
///
/// These indicate an internal inconsistency in the delta table, not bad
/// user input, and must halt the process before any selection runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// A delta drops a platform that its base list does not contain
    #[error("catalog delta for go{major}.{minor} drops {platform}, which is absent from the base list")]
    DropMissing {
        major: u32,
        minor: u32,
        platform: String,
    },

    /// The delta table is empty
    #[error("catalog delta table is empty")]
    Empty,
}

/// A parsed `goMAJOR.MINOR` toolchain version, ordered by release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolchainVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolchainVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse version strings like `go1.15`, `go1.15.2` or `go1.18rc1`.
    ///
    /// Patch components and pre-release suffixes are ignored; anything that
    /// does not start with a dotted numeric go version (e.g. `devel +c0ffee`)
    /// yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.trim().strip_prefix("go")?;
        let mut parts = rest.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor_part = parts.next()?;
        let digits: String = minor_part.chars().take_while(|c| c.is_ascii_digit()).collect();
        let minor: u32 = digits.parse().ok()?;
        Some(Self { major, minor })
    }
}

/// One release's change to the supported-platform list
struct Delta {
    version: ToolchainVersion,
    drop: &'static [(&'static str, &'static str)],
    add: &'static [(&'static str, &'static str, bool)],
}

/// Platform support history of the Go toolchain, as consumed by this tool.
///
/// Default-eligibility flips are encoded as a drop followed by a re-add
/// with the new flag (see go1.7 and mips64).
const DELTAS: &[Delta] = &[
    Delta {
        version: ToolchainVersion::new(1, 0),
        drop: &[],
        add: &[
            ("darwin", "386", true),
            ("darwin", "amd64", true),
            ("linux", "386", true),
            ("linux", "amd64", true),
            ("linux", "arm", true),
            ("freebsd", "386", true),
            ("freebsd", "amd64", true),
            ("openbsd", "386", true),
            ("openbsd", "amd64", true),
            ("windows", "386", true),
            ("windows", "amd64", true),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 1),
        drop: &[],
        add: &[
            ("freebsd", "arm", true),
            ("netbsd", "386", true),
            ("netbsd", "amd64", true),
            ("netbsd", "arm", true),
            ("plan9", "386", false),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 3),
        drop: &[],
        add: &[
            ("dragonfly", "386", false),
            ("dragonfly", "amd64", false),
            ("nacl", "386", false),
            ("nacl", "amd64p32", false),
            ("nacl", "arm", false),
            ("solaris", "amd64", false),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 4),
        drop: &[],
        add: &[("android", "arm", false), ("plan9", "amd64", false)],
    },
    Delta {
        version: ToolchainVersion::new(1, 5),
        drop: &[],
        add: &[
            ("darwin", "arm", false),
            ("darwin", "arm64", false),
            ("linux", "arm64", true),
            ("linux", "ppc64", false),
            ("linux", "ppc64le", false),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 6),
        drop: &[],
        add: &[
            ("android", "386", false),
            ("linux", "mips64", false),
            ("linux", "mips64le", false),
        ],
    },
    Delta {
        // mips64 targets graduate to default
        version: ToolchainVersion::new(1, 7),
        drop: &[("linux", "mips64"), ("linux", "mips64le")],
        add: &[
            ("linux", "mips64", true),
            ("linux", "mips64le", true),
            ("linux", "s390x", true),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 8),
        drop: &[("dragonfly", "386")],
        add: &[
            ("linux", "mips", true),
            ("linux", "mipsle", true),
            ("plan9", "arm", false),
        ],
    },
    Delta {
        version: ToolchainVersion::new(1, 11),
        drop: &[],
        add: &[("js", "wasm", false), ("linux", "riscv64", false)],
    },
    Delta {
        version: ToolchainVersion::new(1, 12),
        drop: &[],
        add: &[("windows", "arm", false), ("aix", "ppc64", false)],
    },
    Delta {
        version: ToolchainVersion::new(1, 14),
        drop: &[("nacl", "386"), ("nacl", "amd64p32"), ("nacl", "arm")],
        add: &[("freebsd", "arm64", true)],
    },
    Delta {
        version: ToolchainVersion::new(1, 15),
        drop: &[("darwin", "386"), ("darwin", "arm")],
        add: &[],
    },
];

/// The materialized list for one release
#[derive(Debug)]
struct CatalogEntry {
    since: ToolchainVersion,
    platforms: Vec<Platform>,
}

/// Immutable, version-ordered lookup table of supported platforms.
///
/// Constructed once at process start; read-only afterwards.
#[derive(Debug)]
pub struct PlatformCatalog {
    entries: Vec<CatalogEntry>,
}

impl PlatformCatalog {
    /// Build the catalog from the built-in delta table
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_deltas(DELTAS)
    }

    fn from_deltas(deltas: &[Delta]) -> Result<Self, CatalogError> {
        if deltas.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut entries = Vec::with_capacity(deltas.len());
        let mut current: Vec<Platform> = Vec::new();

        for delta in deltas {
            // Drops run before adds so a drop + re-add flips metadata
            for &(os, arch) in delta.drop {
                let pos = current.iter().position(|p| p.matches(os, arch)).ok_or(
                    CatalogError::DropMissing {
                        major: delta.version.major,
                        minor: delta.version.minor,
                        platform: format!("{}/{}", os, arch),
                    },
                )?;
                current.remove(pos);
            }

            for (os, arch, default) in delta.add {
                current.push(Platform::new(*os, *arch, *default));
            }

            entries.push(CatalogEntry {
                since: delta.version,
                platforms: current.clone(),
            });
        }

        Ok(Self { entries })
    }

    /// Supported platforms for a toolchain version string.
    ///
    /// Each entry covers the range from its release up to the next declared
    /// release. Versions newer than the newest entry, older than the oldest,
    /// or unparseable fall open to the latest list; a lookup never fails.
    pub fn supported(&self, version: &str) -> &[Platform] {
        let Some(requested) = ToolchainVersion::parse(version) else {
            return self.latest();
        };

        let mut found = None;
        for entry in &self.entries {
            if entry.since <= requested {
                found = Some(entry);
            } else {
                break;
            }
        }

        match found {
            Some(entry) => &entry.platforms,
            None => self.latest(),
        }
    }

    /// The newest release's platform list
    pub fn latest(&self) -> &[Platform] {
        // entries is non-empty by construction
        self.entries
            .last()
            .map(|e| e.platforms.as_slice())
            .unwrap_or(&[])
    }
}
