//! Build run report (build_report.json)
//!
//! Aggregates a scheduler outcome into a serializable report plus the
//! human-readable failure listing the CLI prints. A run with zero failures
//! is silent success; a run with failures reports every failing
//! (unit, target) pair with its error detail, never just a count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::BuildOutcome;

/// Schema version for build_report.json
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "crossgo/build_report@1";

/// One failed task in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRow {
    /// Compilation unit that failed
    pub unit: String,

    /// Target as `os/arch`
    pub target: String,

    /// Full error detail, including compiler stderr
    pub error: String,

    /// When the failure was recorded
    pub at: DateTime<Utc>,
}

/// One built artifact in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRow {
    pub unit: String,
    pub target: String,
    pub path: String,
}

/// Aggregate report for one build run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When the report was created
    pub created_at: DateTime<Utc>,

    /// Detected toolchain version the catalog was scoped to
    pub toolchain_version: String,

    /// Total tasks scheduled
    pub task_count: usize,

    /// Tasks that produced an artifact
    pub succeeded: usize,

    /// Tasks that failed
    pub failed: usize,

    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,

    /// Artifacts passed through from the invoker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRow>,

    /// Every task failure, order unspecified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRow>,
}

impl BuildReport {
    /// Build a report from a scheduler outcome
    pub fn from_outcome(toolchain_version: &str, outcome: &BuildOutcome, duration_ms: u64) -> Self {
        let artifacts: Vec<ArtifactRow> = outcome
            .artifacts
            .iter()
            .map(|a| ArtifactRow {
                unit: a.unit.clone(),
                target: a.platform.to_string(),
                path: a.path.display().to_string(),
            })
            .collect();

        let failures: Vec<FailureRow> = outcome
            .failures
            .iter()
            .map(|f| FailureRow {
                unit: f.unit.clone(),
                target: f.platform.to_string(),
                error: f.error.to_string(),
                at: f.at,
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            toolchain_version: toolchain_version.to_string(),
            task_count: artifacts.len() + failures.len(),
            succeeded: artifacts.len(),
            failed: failures.len(),
            duration_ms,
            artifacts,
            failures,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable failure listing for stderr; empty on success
    pub fn render_failures(&self) -> String {
        if self.failures.is_empty() {
            return String::new();
        }

        let mut out = format!("\n{} build error(s) occurred:\n", self.failures.len());
        for failure in &self.failures {
            out.push_str(&format!(
                "--> {} ({}): {}\n",
                failure.target, failure.unit, failure.error
            ));
        }
        out
    }
}
