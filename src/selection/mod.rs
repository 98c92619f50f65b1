//! Platform selection algorithm
//!
//! Resolves the caller's OS / arch / os-arch-pair filters against the list
//! of platforms a toolchain release supports. Pure and deterministic: no
//! I/O, no concurrency, same output for the same inputs.
//!
//! Precedence rules, in order:
//! 1. Explicit pairs (or, failing that, an OS×arch cross product) seed the
//!    candidate list; otherwise every supported platform is a candidate.
//! 2. Seeded candidates are intersected with the supported list, so an
//!    explicit request can never produce a target the catalog does not
//!    know. Unsupported requests are dropped silently.
//! 3. A pair-level exclusion always removes a candidate.
//! 4. Component-level checks (exclude arch, exclude OS, include-arch
//!    membership, include-OS membership) apply only to candidates that were
//!    not explicitly requested as a pair.
//!
//! The test table at the bottom is the easiest way to understand the
//! interactions; read it alongside the code.

use std::collections::HashSet;

use crate::platform::{FilterError, Platform};

/// A single explicit `os/arch` filter, possibly negated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFilter {
    pub os: String,
    pub arch: String,
    /// True when the token carried a `!` prefix (exclude the pair)
    pub negate: bool,
}

impl PairFilter {
    /// Parse a pair token with an optional leading `!` negation marker
    pub fn parse(token: &str) -> Result<Self, FilterError> {
        let (negate, rest) = match token.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let platform = Platform::parse(rest).map_err(|_| FilterError::InvalidPairSyntax {
            token: token.to_string(),
        })?;

        Ok(Self {
            os: platform.os,
            arch: platform.arch,
            negate,
        })
    }
}

/// Split a space-separated filter string into lower-cased tokens.
///
/// Empty tokens are skipped and duplicates dropped, keeping the first
/// occurrence. Negation markers are preserved on the token.
pub fn parse_filter_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split_whitespace() {
        let token = token.to_lowercase();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// Parse a space-separated list of `os/arch` pair tokens.
///
/// Malformed pair syntax is a configuration error; duplicates are dropped,
/// keeping the first occurrence.
pub fn parse_pair_list(raw: &str) -> Result<Vec<PairFilter>, FilterError> {
    let mut out: Vec<PairFilter> = Vec::new();
    for token in raw.split_whitespace() {
        let pair = PairFilter::parse(token)?;
        if !out.contains(&pair) {
            out.push(pair);
        }
    }
    Ok(out)
}

/// The three filter axes supplied by the caller.
///
/// Ordered as supplied; each token on the string axes is either a bare name
/// (include) or `!name` (exclude).
#[derive(Debug, Clone, Default)]
pub struct PlatformFilter {
    pub os: Vec<String>,
    pub arch: Vec<String>,
    pub osarch: Vec<PairFilter>,
}

impl PlatformFilter {
    /// Parse all three axes from their raw space-separated forms
    pub fn parse(os_raw: &str, arch_raw: &str, osarch_raw: &str) -> Result<Self, FilterError> {
        Ok(Self {
            os: parse_filter_list(os_raw),
            arch: parse_filter_list(arch_raw),
            osarch: parse_pair_list(osarch_raw)?,
        })
    }

    /// True when no filter was supplied on any axis
    pub fn is_empty(&self) -> bool {
        self.os.is_empty() && self.arch.is_empty() && self.osarch.is_empty()
    }

    /// Resolve the filters against a supported-platform list.
    ///
    /// Returns a deduplicated list in candidate order; with no filters at
    /// all this is the supported list unchanged. `default` metadata on the
    /// result always comes from the supported entry that matched.
    pub fn select(&self, supported: &[Platform]) -> Vec<Platform> {
        let mut include_os: Vec<&str> = Vec::new();
        let mut exclude_os: HashSet<&str> = HashSet::new();
        for token in &self.os {
            match token.strip_prefix('!') {
                Some(rest) => {
                    exclude_os.insert(rest);
                }
                None => {
                    if !include_os.contains(&token.as_str()) {
                        include_os.push(token.as_str());
                    }
                }
            }
        }

        let mut include_arch: Vec<&str> = Vec::new();
        let mut exclude_arch: HashSet<&str> = HashSet::new();
        for token in &self.arch {
            match token.strip_prefix('!') {
                Some(rest) => {
                    exclude_arch.insert(rest);
                }
                None => {
                    if !include_arch.contains(&token.as_str()) {
                        include_arch.push(token.as_str());
                    }
                }
            }
        }

        let mut include_pairs: Vec<(&str, &str)> = Vec::new();
        let mut exclude_pairs: HashSet<(&str, &str)> = HashSet::new();
        for pair in &self.osarch {
            let key = (pair.os.as_str(), pair.arch.as_str());
            if pair.negate {
                exclude_pairs.insert(key);
            } else {
                include_pairs.push(key);
            }
        }

        let include_os_set: HashSet<&str> = include_os.iter().copied().collect();
        let include_arch_set: HashSet<&str> = include_arch.iter().copied().collect();
        let include_pair_set: HashSet<(&str, &str)> = include_pairs.iter().copied().collect();

        // Seed the candidate list. A seeded list is intersected with
        // `supported` by looking each request up there, which both drops
        // unsupported requests and picks up the catalog's default flag.
        let candidates: Vec<&Platform> = if !include_pairs.is_empty() {
            include_pairs
                .iter()
                .filter_map(|&(os, arch)| supported.iter().find(|p| p.matches(os, arch)))
                .collect()
        } else if !include_os.is_empty() && !include_arch.is_empty() {
            let mut out = Vec::new();
            for &os in &include_os {
                for &arch in &include_arch {
                    if let Some(p) = supported.iter().find(|p| p.matches(os, arch)) {
                        out.push(p);
                    }
                }
            }
            out
        } else {
            supported.iter().collect()
        };

        let mut result: Vec<Platform> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let key = (candidate.os.as_str(), candidate.arch.as_str());

            // Pair exclusion wins over everything, including explicit
            // pair inclusion.
            if exclude_pairs.contains(&key) {
                continue;
            }

            // Component checks apply only when the pair was not asked for
            // explicitly.
            if !include_pair_set.contains(&key) {
                if exclude_arch.contains(key.1) {
                    continue;
                }
                if exclude_os.contains(key.0) {
                    continue;
                }
                if !include_arch_set.is_empty() && !include_arch_set.contains(key.1) {
                    continue;
                }
                if !include_os_set.is_empty() && !include_os_set.contains(key.0) {
                    continue;
                }
            }

            if !result.contains(candidate) {
                result.push(candidate.clone());
            }
        }

        result
    }
}
