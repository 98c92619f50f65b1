//! crossgo CLI
//!
//! Entry point for the `crossgo` command-line tool.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;

use crossgo::catalog::PlatformCatalog;
use crossgo::config::{BuildConfig, DEFAULT_CONFIG_PATH};
use crossgo::invoke::{GoBuild, DEFAULT_OUTPUT_TEMPLATE};
use crossgo::scheduler::{cross_tasks, resolve_parallelism, run_builds};
use crossgo::selection::PlatformFilter;
use crossgo::summary::BuildReport;
use crossgo::toolchain;

#[derive(Parser)]
#[command(name = "crossgo")]
#[command(about = "Cross-compile Go packages for a matrix of platforms", version)]
struct Cli {
    /// Space-separated operating systems to build for; prefix with ! to exclude
    #[arg(long)]
    os: Option<String>,

    /// Space-separated architectures to build for; prefix with ! to exclude
    #[arg(long)]
    arch: Option<String>,

    /// Space-separated os/arch pairs to build for; prefix with ! to exclude
    #[arg(long)]
    osarch: Option<String>,

    /// Number of parallel builds (non-positive: host parallelism)
    #[arg(long, short = 'p')]
    parallel: Option<i64>,

    /// Output path template with {dir}, {os} and {arch} placeholders
    #[arg(long)]
    output: Option<String>,

    /// Value to pass to go build -ldflags
    #[arg(long)]
    ldflags: Option<String>,

    /// Path to config file (default: .crossgo.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Write a JSON build report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// List the supported targets for the detected toolchain and exit
    #[arg(long)]
    list_targets: bool,

    /// Packages to build (default: .)
    units: Vec<String>,
}

fn main() {
    process::exit(real_main());
}

fn real_main() -> i32 {
    let cli = Cli::parse();

    let catalog = match PlatformCatalog::builtin() {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Internal catalog error: {}", err);
            return 1;
        }
    };

    let version = match toolchain::detect_version() {
        Ok(version) => version,
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };

    let supported = catalog.supported(&version);

    if cli.list_targets {
        for platform in supported {
            println!("{}\t(default: {})", platform, platform.default);
        }
        return 0;
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let file_config = match BuildConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };

    let config = file_config.merged_with(BuildConfig {
        os: cli.os,
        arch: cli.arch,
        osarch: cli.osarch,
        parallel: cli.parallel,
        output: cli.output,
        ldflags: cli.ldflags,
    });

    let filter = match PlatformFilter::parse(
        config.os.as_deref().unwrap_or(""),
        config.arch.as_deref().unwrap_or(""),
        config.osarch.as_deref().unwrap_or(""),
    ) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };

    // With no filters at all, build only the default-eligible targets;
    // any filter switches to the full supported set as the base.
    let mut platforms = filter.select(supported);
    if filter.is_empty() {
        platforms.retain(|p| p.default);
    }

    if platforms.is_empty() {
        eprintln!("No platforms matched the requested filters");
        return 1;
    }

    let units = if cli.units.is_empty() {
        vec![".".to_string()]
    } else {
        cli.units
    };

    let parallel = resolve_parallelism(config.parallel.unwrap_or(-1));
    println!("Number of parallel builds: {}", parallel);

    let invoker = GoBuild::new(
        config
            .output
            .unwrap_or_else(|| DEFAULT_OUTPUT_TEMPLATE.to_string()),
        config.ldflags.unwrap_or_default(),
    );

    let tasks = cross_tasks(&platforms, &units);
    let started = Instant::now();
    let outcome = run_builds(&tasks, parallel, &invoker);
    let duration_ms = started.elapsed().as_millis() as u64;

    let report = BuildReport::from_outcome(&version, &outcome, duration_ms);

    if let Some(report_path) = cli.report {
        match report.to_json() {
            Ok(json) => {
                if let Err(err) = std::fs::write(&report_path, json) {
                    eprintln!("Failed to write report {}: {}", report_path.display(), err);
                    return 1;
                }
            }
            Err(err) => {
                eprintln!("Failed to serialize report: {}", err);
                return 1;
            }
        }
    }

    if !report.is_success() {
        eprint!("{}", report.render_failures());
        return 1;
    }

    0
}
