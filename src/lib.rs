//! crossgo - parallel Go cross-compilation against a version-aware target
//! matrix
//!
//! The crate resolves a build matrix from include/exclude platform filters
//! and a toolchain-version-scoped catalog, then runs one `go build` per
//! (target, package) pair under a fixed concurrency ceiling, collecting
//! every failure without aborting sibling builds.

pub mod catalog;
pub mod config;
pub mod invoke;
pub mod platform;
pub mod scheduler;
pub mod selection;
pub mod summary;
pub mod toolchain;

pub use catalog::{CatalogError, PlatformCatalog, ToolchainVersion};
pub use platform::{FilterError, Platform};
pub use scheduler::{cross_tasks, run_builds, BuildInvoker, BuildOutcome, BuildTask};
pub use selection::{PairFilter, PlatformFilter};
pub use summary::BuildReport;
