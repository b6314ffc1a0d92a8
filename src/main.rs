//! Statute-Loom main entry point
//!
//! Command-line interface for the incremental legal-code mirror.

use anyhow::Context;
use clap::Parser;
use statute_loom::config::load_config_with_hash;
use statute_loom::stats::{print_summary, summarize};
use statute_loom::store::SnapshotStore;
use statute_loom::walker::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Statute-Loom: an incremental legal-code mirror
///
/// Crawls a legal-code website (Parts → Titles → Chapters → Sections) into
/// a single JSON snapshot, resuming from prior runs and refetching only
/// sections whose persisted copy is incomplete.
#[derive(Parser, Debug)]
#[command(name = "statute-loom")]
#[command(version = "1.0.0")]
#[command(about = "An incremental legal-code mirror", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the existing snapshot (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Ignore any existing snapshot and rebuild from scratch
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show per-level counts from the snapshot and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config);
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("statute_loom=info,warn"),
            1 => EnvFilter::new("statute_loom=debug,info"),
            2 => EnvFilter::new("statute_loom=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &statute_loom::Config) {
    println!("=== Statute-Loom Dry Run ===\n");

    println!("Crawl:");
    println!("  Base URL: {}", config.crawl.base_url);
    println!("  Max retries per unit: {}", config.crawl.max_retries);
    println!("  Retry backoff: {}ms", config.crawl.retry_delay_ms);
    println!("  Step timeout: {}ms", config.crawl.step_timeout_ms);
    println!("  Pacing delay: {}ms", config.crawl.pace_delay_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.snapshot_path);

    let store = SnapshotStore::new(&config.output.snapshot_path);
    let summary = summarize(&store.load());
    println!(
        "\nExisting snapshot: {} parts, {} sections ({} complete)",
        summary.parts, summary.sections, summary.complete_sections
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl from {}", config.crawl.base_url);
}

/// Handles the --stats mode: prints per-level counts from the snapshot
fn handle_stats(config: &statute_loom::Config) {
    println!("Snapshot: {}\n", config.output.snapshot_path);

    let store = SnapshotStore::new(&config.output.snapshot_path);
    let summary = summarize(&store.load());
    print_summary(&summary);
}

/// Handles the main crawl operation
///
/// Individual node failures are already absorbed by the walker; only
/// unrecoverable top-level errors surface here as a non-zero exit.
async fn handle_crawl(config: statute_loom::Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous snapshot)");
    } else {
        tracing::info!("Starting crawl (will resume from snapshot if present)");
    }

    let stats = crawl(config, fresh).await.context("crawl failed")?;

    tracing::info!(
        "Done: {} parts processed, {} sections processed ({} fetched this run, {} failed)",
        stats.parts_processed,
        stats.sections_processed(),
        stats.sections_fetched,
        stats.sections_failed
    );

    Ok(())
}
