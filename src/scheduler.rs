//! Bounded concurrent build scheduler
//!
//! Fans out one build task per (target platform × compilation unit) pair and
//! runs them on a fixed-size worker pool. The pool is the admission gate: at
//! most `parallel` invokes execute at any instant, every task is claimed
//! exactly once, and `run_builds` returns only after all workers have
//! drained (a full barrier join).
//!
//! The run is fail-slow: a failing task never cancels or prevents sibling
//! tasks. Failures are appended to a mutex-guarded collection, each keeping
//! the originating (unit, platform) identity, the underlying error, and a
//! timestamp. Completion order among tasks is unspecified.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use chrono::{DateTime, Utc};

use crate::invoke::InvokeError;
use crate::platform::Platform;

/// One scheduled build: a compilation unit crossed with a target platform.
///
/// Tasks are created per run and never persisted or shared across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    /// Opaque compilation-unit reference (import path or file path)
    pub unit: String,

    /// Target platform
    pub platform: Platform,
}

/// Performs the actual per-target compiler invocation.
///
/// The scheduler treats the call as opaque and blocking; implementations
/// must tolerate being called from several worker threads at once. On
/// success the artifact location is passed through uninterpreted.
pub trait BuildInvoker: Sync {
    fn invoke(&self, unit: &str, platform: &Platform) -> Result<PathBuf, InvokeError>;
}

/// A successfully built artifact, passed through from the invoker
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub unit: String,
    pub platform: Platform,
    pub path: PathBuf,
}

/// One task failure with its originating identity and error detail
#[derive(Debug)]
pub struct BuildFailure {
    pub unit: String,
    pub platform: Platform,
    pub error: InvokeError,
    pub at: DateTime<Utc>,
}

/// Aggregate result of one scheduler run.
///
/// Failure order follows completion, not submission; every failure is
/// present exactly once.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub artifacts: Vec<BuiltArtifact>,
    pub failures: Vec<BuildFailure>,
}

impl BuildOutcome {
    /// A run succeeded iff no task failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the task cross product: one task per (platform × unit) pair,
/// platforms outermost
pub fn cross_tasks(platforms: &[Platform], units: &[String]) -> Vec<BuildTask> {
    let mut tasks = Vec::with_capacity(platforms.len() * units.len());
    for platform in platforms {
        for unit in units {
            tasks.push(BuildTask {
                unit: unit.clone(),
                platform: platform.clone(),
            });
        }
    }
    tasks
}

/// Resolve a requested parallelism value.
///
/// Non-positive means "use the host's available parallelism". The result is
/// always at least 1 and cannot change once a run has started.
pub fn resolve_parallelism(requested: i64) -> usize {
    if requested > 0 {
        requested as usize
    } else {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }
}

/// Run every task to completion under a fixed concurrency ceiling.
///
/// `parallel` is clamped to [1, tasks.len()]. There is no priority ordering
/// between tasks and no cancellation; the caller must let the run drain.
pub fn run_builds(tasks: &[BuildTask], parallel: usize, invoker: &dyn BuildInvoker) -> BuildOutcome {
    if tasks.is_empty() {
        return BuildOutcome::default();
    }

    let workers = parallel.clamp(1, tasks.len());
    let cursor = AtomicUsize::new(0);
    let artifacts = Mutex::new(Vec::new());
    let failures = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                // Claim the next unclaimed task; each index is handed out
                // exactly once.
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(task) = tasks.get(index) else {
                    break;
                };

                match invoker.invoke(&task.unit, &task.platform) {
                    Ok(path) => artifacts.lock().unwrap().push(BuiltArtifact {
                        unit: task.unit.clone(),
                        platform: task.platform.clone(),
                        path,
                    }),
                    Err(error) => failures.lock().unwrap().push(BuildFailure {
                        unit: task.unit.clone(),
                        platform: task.platform.clone(),
                        error,
                        at: Utc::now(),
                    }),
                }
            });
        }
    });

    BuildOutcome {
        artifacts: artifacts.into_inner().unwrap(),
        failures: failures.into_inner().unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn platform(os: &str, arch: &str) -> Platform {
        Platform::new(os, arch, true)
    }

    fn tasks_for(pairs: &[(&str, &str, &str)]) -> Vec<BuildTask> {
        pairs
            .iter()
            .map(|&(unit, os, arch)| BuildTask {
                unit: unit.to_string(),
                platform: platform(os, arch),
            })
            .collect()
    }

    /// Records every invocation; fails for units listed in `fail_units`
    struct RecordingInvoker {
        calls: Mutex<Vec<(String, String)>>,
        fail_units: Vec<String>,
    }

    impl RecordingInvoker {
        fn new(fail_units: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_units: fail_units.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl BuildInvoker for RecordingInvoker {
        fn invoke(&self, unit: &str, platform: &Platform) -> Result<PathBuf, InvokeError> {
            self.calls
                .lock()
                .unwrap()
                .push((unit.to_string(), platform.to_string()));
            if self.fail_units.iter().any(|u| u == unit) {
                Err(InvokeError::CompilerFailed {
                    stderr: format!("cannot build {}", unit),
                })
            } else {
                Ok(PathBuf::from(format!("out/{}_{}", platform.os, platform.arch)))
            }
        }
    }

    /// Tracks the peak number of concurrently-executing invokes
    struct GaugeInvoker {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GaugeInvoker {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl BuildInvoker for GaugeInvoker {
        fn invoke(&self, _unit: &str, _platform: &Platform) -> Result<PathBuf, InvokeError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(PathBuf::from("out"))
        }
    }

    #[test]
    fn test_cross_tasks_covers_every_pair() {
        let platforms = vec![platform("linux", "amd64"), platform("windows", "386")];
        let units = vec![".".to_string(), "./cmd/tool".to_string()];
        let tasks = cross_tasks(&platforms, &units);

        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].platform, platforms[0]);
        assert_eq!(tasks[0].unit, units[0]);
        assert_eq!(tasks[3].platform, platforms[1]);
        assert_eq!(tasks[3].unit, units[1]);
    }

    #[test]
    fn test_every_task_invoked_exactly_once() {
        let tasks = tasks_for(&[
            ("a", "linux", "amd64"),
            ("b", "linux", "amd64"),
            ("a", "windows", "386"),
            ("b", "windows", "386"),
            ("a", "darwin", "arm64"),
            ("b", "darwin", "arm64"),
        ]);

        let invoker = RecordingInvoker::new(&[]);
        let outcome = run_builds(&tasks, 3, &invoker);

        assert!(outcome.is_success());
        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls.len(), tasks.len());

        let unique: HashSet<_> = calls.iter().cloned().collect();
        assert_eq!(unique.len(), tasks.len(), "no task may run twice");
        assert_eq!(outcome.artifacts.len(), tasks.len());
    }

    #[test]
    fn test_failures_do_not_stop_siblings() {
        let tasks = tasks_for(&[
            ("good", "linux", "amd64"),
            ("bad", "linux", "amd64"),
            ("good", "windows", "386"),
            ("bad", "windows", "386"),
        ]);

        let invoker = RecordingInvoker::new(&["bad"]);
        let outcome = run_builds(&tasks, 2, &invoker);

        // All four invokes still happened
        assert_eq!(invoker.calls.lock().unwrap().len(), 4);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.artifacts.len(), 2);
        assert!(outcome.failures.iter().all(|f| f.unit == "bad"));
    }

    #[test]
    fn test_serial_run_reports_each_failure_once() {
        // Three tasks, concurrency 1, two failing: exactly two failure
        // entries, each identifying its (unit, platform)
        let tasks = tasks_for(&[
            ("bad1", "linux", "amd64"),
            ("good", "linux", "arm64"),
            ("bad2", "windows", "386"),
        ]);

        let invoker = RecordingInvoker::new(&["bad1", "bad2"]);
        let outcome = run_builds(&tasks, 1, &invoker);

        assert_eq!(outcome.failures.len(), 2);
        let failed: HashSet<_> = outcome
            .failures
            .iter()
            .map(|f| (f.unit.clone(), f.platform.to_string()))
            .collect();
        assert!(failed.contains(&("bad1".to_string(), "linux/amd64".to_string())));
        assert!(failed.contains(&("bad2".to_string(), "windows/386".to_string())));
    }

    #[test]
    fn test_failure_detail_is_preserved() {
        let tasks = tasks_for(&[("broken", "linux", "amd64")]);
        let invoker = RecordingInvoker::new(&["broken"]);
        let outcome = run_builds(&tasks, 4, &invoker);

        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert!(failure.error.to_string().contains("cannot build broken"));
        assert!(failure.at <= Utc::now());
    }

    #[test]
    fn test_concurrency_ceiling_is_respected() {
        let tasks = tasks_for(&[
            ("a", "linux", "amd64"),
            ("a", "linux", "arm64"),
            ("a", "windows", "386"),
            ("a", "windows", "amd64"),
            ("a", "darwin", "arm64"),
            ("a", "freebsd", "amd64"),
            ("a", "netbsd", "386"),
            ("a", "openbsd", "amd64"),
        ]);

        let invoker = GaugeInvoker::new();
        let outcome = run_builds(&tasks, 2, &invoker);

        assert!(outcome.is_success());
        let peak = invoker.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "admission gate exceeded: peak {}", peak);
        assert!(peak >= 1);
    }

    #[test]
    fn test_parallelism_larger_than_task_count() {
        let tasks = tasks_for(&[("a", "linux", "amd64")]);
        let invoker = RecordingInvoker::new(&[]);
        let outcome = run_builds(&tasks, 64, &invoker);
        assert!(outcome.is_success());
        assert_eq!(invoker.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_task_set_is_silent_success() {
        let invoker = RecordingInvoker::new(&[]);
        let outcome = run_builds(&[], 4, &invoker);
        assert!(outcome.is_success());
        assert!(outcome.artifacts.is_empty());
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_parallelism() {
        assert_eq!(resolve_parallelism(3), 3);
        assert!(resolve_parallelism(0) >= 1);
        assert!(resolve_parallelism(-1) >= 1);
    }
}
