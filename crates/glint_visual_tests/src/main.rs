//! Visual Test Runner
//!
//! Command-line tool for running glint's GPU visual regression tests.
//!
//! Usage:
//!   glint-visual-tests              # Run all tests
//!   glint-visual-tests --filter foo # Run tests matching "foo"
//!   glint-visual-tests --list       # List all tests
//!   glint-visual-tests --record     # Rewrite reference archives

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glint_harness::config::ConfigFile;
use glint_harness::{ArchiveMode, ConsoleHost, TestRunner};
use glint_visual_tests::all_suites;
use glint_wgpu::WgpuProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "glint-visual-tests")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Glint GPU visual regression tests", long_about = None)]
struct Cli {
    /// List all tests and exit
    #[arg(long)]
    list: bool,

    /// Run only tests whose name or suite contains this pattern
    #[arg(short, long)]
    filter: Option<String>,

    /// Record reference archives instead of verifying against them
    #[arg(long)]
    record: bool,

    /// Configuration file
    #[arg(short, long, default_value = "glint.toml")]
    config: PathBuf,

    /// Directory holding reference archives
    #[arg(long)]
    references: Option<PathBuf>,

    /// Only use software adapters
    #[arg(long)]
    fallback_adapter: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.list {
        println!("Available test suites:");
        for suite in all_suites() {
            println!("\n  {}:", suite.name);
            for case in &suite.cases {
                let mut notes = Vec::new();
                if case.settings.compare.is_some() {
                    notes.push("compare");
                }
                if case.ignored {
                    notes.push("ignored");
                }
                if notes.is_empty() {
                    println!("    - {}", case.name);
                } else {
                    println!("    - {} ({})", case.name, notes.join(", "));
                }
            }
        }
        return Ok(());
    }

    let file = if cli.config.exists() {
        tracing::debug!("Loading {}", cli.config.display());
        ConfigFile::load(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        ConfigFile::default()
    };

    let mut harness = file.harness.with_env_overrides();
    if cli.record {
        harness = harness.with_mode(ArchiveMode::Record);
    }
    if let Some(dir) = cli.references {
        harness = harness.with_reference_dir(dir);
    }

    println!("╔══════════════════════════════════════════╗");
    println!("║      GLINT VISUAL REGRESSION TESTS       ║");
    println!("╚══════════════════════════════════════════╝\n");

    if harness.mode == ArchiveMode::Record {
        println!(
            "Recording reference archives into {}\n",
            harness.reference_dir.display()
        );
    }

    let provider = WgpuProvider::new().with_fallback_adapter(cli.fallback_adapter);
    let runner = TestRunner::new(provider, harness).with_defaults(file.defaults);

    let mut host = ConsoleHost::new();
    for suite in all_suites() {
        host.add_suite(suite);
    }

    // Apply filter if provided
    if let Some(ref pattern) = cli.filter {
        println!("Running tests matching: {}\n", pattern);
        host.filter(pattern);
    }

    // Run tests
    let result = runner.run(&mut host);

    // Print summary
    result.print_summary();

    // Exit with error code if any tests failed
    if result.all_passed() {
        println!("\nAll tests passed!");
        Ok(())
    } else {
        std::process::exit(1);
    }
}
