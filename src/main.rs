//! Homewatch main entry point
//!
//! Command-line interface for the homewatch listing watcher.

use anyhow::Context;
use clap::Parser;
use homewatch::config::{load_config_with_hash, Config};
use homewatch::crawler::watch;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Homewatch: a listing watcher
///
/// Homewatch crawls paginated listing sources, reconciles each listing
/// against a local database, and pushes webhook notifications for new and
/// changed listings.
#[derive(Parser, Debug)]
#[command(name = "homewatch")]
#[command(version = "0.3.0")]
#[command(about = "A listing watcher", long_about = None)]
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

    /// Only run the named sources (default: all configured sources)
    #[arg(long, value_name = "NAME", num_args = 1..)]
    only: Vec<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if !cli.only.is_empty() {
        filter_sources(&mut config, &cli.only);
        if config.sources.is_empty() {
            anyhow::bail!("--only matched none of the configured sources");
        }
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        watch(config).await.context("watch run failed")?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("homewatch=info,warn"),
            1 => EnvFilter::new("homewatch=debug,info"),
            2 => EnvFilter::new("homewatch=trace,debug"),
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

/// Keeps only the sources named in --only, warning about unknown names
fn filter_sources(config: &mut Config, only: &[String]) {
    for name in only {
        if !config.sources.iter().any(|s| &s.name == name) {
            tracing::warn!("--only names unknown source '{}'", name);
        }
    }
    config.sources.retain(|s| only.contains(&s.name));
}

/// Handles --dry-run: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Homewatch Dry Run ===\n");

    println!("Watcher:");
    println!("  Page cap: {}", config.watcher.page_cap);
    println!("  Request timeout: {}s", config.watcher.request_timeout_secs);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\nNotifications:");
    match &config.notify.webhook_url {
        Some(url) => {
            println!("  Webhook: {}", url);
            println!("  Min send interval: {}ms", config.notify.min_send_interval_ms);
            match config.notify.max_send_attempts {
                0 => println!("  Max send attempts: unlimited"),
                n => println!("  Max send attempts: {}", n),
            }
        }
        None => println!("  Disabled (no webhook-url)"),
    }
    println!("  Tracked fields: {}", config.notify.tracked_fields.join(", "));

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} (kind: {})", source.name, source.kind);
        if let Some(url) = &source.list_url {
            println!("    {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints listing counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use homewatch::store::{ListingStore, SqliteStore};
    use std::path::Path;

    println!("Database: {}\n", config.store.database_path);

    let store = SqliteStore::new(Path::new(&config.store.database_path))?;

    println!("Total listings: {}", store.count_total()?);

    let by_source = store.count_by_source()?;
    if !by_source.is_empty() {
        println!("\nBy source:");
        for (source, count) in by_source {
            println!("  {:8} {}", count, source);
        }
    }

    Ok(())
}
