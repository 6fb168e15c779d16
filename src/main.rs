//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest one-hop downloader.

use anyhow::Context;
use clap::Parser;
use site_harvest::config::{load_config_with_hash, load_from_env, validate, Config};
use site_harvest::crawler::{harvest, HarvestReport};
use site_harvest::HarvestError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: a one-hop site downloader
///
/// Site-Harvest fetches a website's homepage, downloads every page it links
/// to, and records per-page timing and size in a SQLite store.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "A one-hop site downloader", long_about = None)]
struct Cli {
    /// Website to harvest; prompted for when omitted
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Directory the per-host download folder is created in
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Maximum number of link downloads in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "url")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    if cli.stats {
        return handle_stats(&config);
    }

    let seed = match cli.url {
        Some(url) => url,
        None => prompt_for_url().context("failed to read the website URL")?,
    };

    handle_harvest(&config, &seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
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

/// Loads the config file (or environment only), then applies CLI overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => load_from_env().context("invalid configuration in environment")?,
    };

    if let Some(dir) = &cli.output_dir {
        config.output.root_dir = dir.clone();
    }
    if let Some(n) = cli.concurrency {
        config.fetcher.max_concurrent_fetches = n;
    }
    validate(&config)?;

    tracing::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Reads one line from stdin after printing the prompt
fn prompt_for_url() -> io::Result<String> {
    print!("Input website URL: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use site_harvest::output::{load_statistics, print_statistics};
    use site_harvest::storage::open_storage;

    println!("Database: {}\n", config.store.connection_string);

    let storage = open_storage(&config.store)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, seed: &str) -> anyhow::Result<()> {
    match harvest(config, seed).await {
        Ok(report) => {
            print_report(&report);
            println!("Process completed successfully!");
            Ok(())
        }
        Err(HarvestError::InvalidSeed { url }) => {
            tracing::debug!("Rejected seed: {:?}", url);
            println!("The provided URL is invalid. Please retry with a correct one.");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_report(report: &HarvestReport) {
    println!("Homepage stored at: {}", report.homepage.display());
    println!(
        "Links found: {}, downloaded: {}, failed: {}",
        report.links_found,
        report.downloaded.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  failed: {} ({})", failure.url, failure.error);
    }
    println!(
        "Total: {} KB in {} ms (site id {})",
        report.total_size_kb,
        report.elapsed_ms(),
        report.site_id
    );
}
