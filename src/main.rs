//! Eligibility Crawler main entry point
//!
//! This is the command-line interface for the provider portal eligibility crawler.

use anyhow::{bail, Context};
use clap::Parser;
use eligibility_crawler::config::{load_config_with_hash, Config};
use eligibility_crawler::crawler::run_crawl;
use eligibility_crawler::session::{load_credentials, load_members, Credential, TargetMember};
use eligibility_crawler::ScrapeMode;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Eligibility Crawler: member eligibility retrieval from a provider portal
///
/// Logs in with each credential, walks the facility roster (or the listed
/// members in partial mode) and records demographics and eligibility for
/// every member found.
#[derive(Parser, Debug)]
#[command(name = "eligibility-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Provider portal eligibility crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Credential list: a JSON file path or inline JSON
    #[arg(long, value_name = "FILE|JSON", required_unless_present = "stats")]
    creds: Option<String>,

    /// Which part of the portal to walk
    #[arg(long, default_value = "all")]
    mode: ScrapeMode,

    /// Members to look up in partial mode: a JSON file path or inline JSON
    #[arg(long, value_name = "FILE|JSON")]
    members: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate inputs and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show item statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let (credentials, targets) = load_inputs(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, cli.mode, &credentials, &targets);
        return Ok(());
    }

    let summary = run_crawl(&config, &config_hash, cli.mode, credentials, targets)
        .await
        .context("Crawl failed")?;

    tracing::info!(
        "Crawl finished: {} items emitted, {} transport failures, {} duplicates filtered",
        summary.items_emitted,
        summary.transport_failures,
        summary.duplicates_filtered
    );
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("eligibility_crawler=info,warn"),
            1 => EnvFilter::new("eligibility_crawler=debug,info"),
            2 => EnvFilter::new("eligibility_crawler=trace,debug"),
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

/// Loads credentials, and the target members when running in partial mode
fn load_inputs(cli: &Cli) -> anyhow::Result<(Vec<Credential>, Vec<TargetMember>)> {
    let Some(creds) = cli.creds.as_deref() else {
        bail!("--creds is required to crawl");
    };
    let credentials = load_credentials(creds).context("Failed to load credentials")?;

    let targets = match (cli.mode, cli.members.as_deref()) {
        (ScrapeMode::Partial, Some(members)) => {
            load_members(members).context("Failed to load target members")?
        }
        (ScrapeMode::Partial, None) => bail!("--members is required in partial mode"),
        (_, Some(_)) => {
            tracing::warn!("--members is ignored outside partial mode");
            Vec::new()
        }
        (_, None) => Vec::new(),
    };

    Ok((credentials, targets))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(
    config: &Config,
    mode: ScrapeMode,
    credentials: &[Credential],
    targets: &[TargetMember],
) {
    println!("=== Eligibility Crawler Dry Run ===\n");

    println!("Portal:");
    println!("  Name: {}", config.portal.name);
    println!("  Base URL: {}", config.portal.base_url);

    println!("\nClient:");
    println!("  Timeout: {}s", config.client.timeout_secs);
    println!(
        "  Max concurrent requests: {}",
        config.client.max_concurrent_requests
    );
    println!("  Retry backoff: {:?}", config.retry.backoff());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!(
        "  Notifications: {}",
        config
            .notify
            .as_ref()
            .and_then(|n| n.webhook_url.as_deref())
            .unwrap_or("log only")
    );
    println!(
        "  Render service: {}",
        config.render.as_ref().map_or("none", |r| r.url.as_str())
    );

    println!("\nMode: {}", mode);
    println!("\nCredentials ({}):", credentials.len());
    for credential in credentials {
        println!(
            "  - {} (company {}, practice {}, facility {})",
            credential.username,
            credential.company,
            credential.practice(),
            credential.facility_id
        );
    }

    if mode == ScrapeMode::Partial {
        println!("\nTarget Members ({}):", targets.len());
        for target in targets {
            println!(
                "  - subscriber {} for user {} (facility {})",
                target.subscriber_id, target.username, target.fid
            );
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start {} session(s)", credentials.len());
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use eligibility_crawler::output::{load_statistics, print_statistics};
    use eligibility_crawler::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage, None)?;
    print_statistics(&stats);

    Ok(())
}
