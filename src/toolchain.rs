//! Toolchain version detection
//!
//! Reads the version of the `go` binary on the PATH so the catalog can be
//! scoped to what that toolchain actually supports. A missing binary or an
//! unreadable version fails the run before any selection happens; an
//! unrecognized version string is fine (the catalog falls open to its
//! newest entry).

use std::io;
use std::process::Command;

/// Errors from probing the host toolchain
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// No `go` executable on the PATH
    #[error("go executable must be on the PATH")]
    NotFound,

    /// Running the toolchain failed
    #[error("error reading go version: {0}")]
    Io(#[source] io::Error),

    /// The toolchain ran but produced nothing usable
    #[error("could not read go version from {output:?}")]
    UnexpectedOutput { output: String },
}

/// Detect the version of the `go` binary on the PATH.
///
/// `go env GOVERSION` is authoritative on modern toolchains; older ones
/// fall back to parsing `go version` output.
pub fn detect_version() -> Result<String, ToolchainError> {
    match run_go(&["env", "GOVERSION"]) {
        Ok(version) if !version.is_empty() => return Ok(version),
        Err(ToolchainError::NotFound) => return Err(ToolchainError::NotFound),
        _ => {}
    }

    let raw = run_go(&["version"])?;
    parse_version_line(&raw).ok_or(ToolchainError::UnexpectedOutput { output: raw })
}

fn run_go(args: &[&str]) -> Result<String, ToolchainError> {
    let output = Command::new("go").args(args).output().map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            ToolchainError::NotFound
        } else {
            ToolchainError::Io(err)
        }
    })?;

    if !output.status.success() {
        return Err(ToolchainError::UnexpectedOutput {
            output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Pull the version token out of a `go version go1.21.3 linux/amd64` line
fn parse_version_line(line: &str) -> Option<String> {
    let token = line.split_whitespace().nth(2)?;
    if token.starts_with("go") || token.starts_with("devel") {
        Some(token.to_string())
    } else {
        None
    }
}
