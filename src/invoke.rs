//! Production build invoker
//!
//! `GoBuild` performs the per-target compiler invocation by shelling out to
//! `go build` with `GOOS`/`GOARCH` environment overrides. The output path is
//! rendered from a template with `{dir}`, `{os}` and `{arch}` placeholders;
//! windows targets get an `.exe` suffix. Compiler stderr is captured into
//! the error so the scheduler's aggregate keeps the full detail.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::platform::Platform;
use crate::scheduler::BuildInvoker;

/// Default output path template, mirroring `dir_os_arch` binary naming
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{dir}_{os}_{arch}";

/// Errors from a single build invocation.
///
/// These are recovered by the scheduler into the aggregate outcome; they
/// never unwind sibling tasks.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The `go` process could not be started
    #[error("failed to run go build: {0}")]
    Spawn(#[source] io::Error),

    /// `go build` exited non-zero
    #[error("go build failed: {stderr}")]
    CompilerFailed { stderr: String },
}

/// Invoker that cross-compiles one unit with the host `go` toolchain
#[derive(Debug, Clone)]
pub struct GoBuild {
    output_template: String,
    ldflags: String,
}

impl GoBuild {
    pub fn new(output_template: impl Into<String>, ldflags: impl Into<String>) -> Self {
        Self {
            output_template: output_template.into(),
            ldflags: ldflags.into(),
        }
    }

    /// Render the output path for one (unit, platform) build.
    ///
    /// `{dir}` expands to the last path component of the unit, matching the
    /// original `dir_os_arch` naming.
    pub fn output_path(&self, unit: &str, platform: &Platform) -> PathBuf {
        let dir = Path::new(unit)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(unit);

        let mut rendered = self
            .output_template
            .replace("{dir}", dir)
            .replace("{os}", &platform.os)
            .replace("{arch}", &platform.arch);

        if platform.os == "windows" {
            rendered.push_str(".exe");
        }

        PathBuf::from(rendered)
    }
}

impl BuildInvoker for GoBuild {
    fn invoke(&self, unit: &str, platform: &Platform) -> Result<PathBuf, InvokeError> {
        let output_path = self.output_path(unit, platform);

        println!("--> {}: {}", platform, unit);

        let output = Command::new("go")
            .arg("build")
            .arg("-ldflags")
            .arg(&self.ldflags)
            .arg("-o")
            .arg(&output_path)
            .arg(unit)
            .env("GOOS", &platform.os)
            .env("GOARCH", &platform.arch)
            .output()
            .map_err(InvokeError::Spawn)?;

        if !output.status.success() {
            return Err(InvokeError::CompilerFailed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output_path)
    }
}
