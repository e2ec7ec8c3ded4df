//! Catalog-Sync main entry point
//!
//! This is the command-line interface for the Catalog-Sync listing mirror.

use catalog_sync::config::{load_config_with_hash, Config};
use catalog_sync::output::{load_statistics, print_report, print_statistics};
use catalog_sync::storage::Database;
use catalog_sync::{run_workflow, Workflow};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Catalog-Sync: scheduled listing scrapes mirrored into SQLite
///
/// Catalog-Sync fetches a catalog listing page, replaces the catalog table,
/// then fetches and replaces the dependent rows of every catalog entry. A
/// failure for one entry is logged and the run continues with the next.
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(version = "1.0.0")]
#[command(about = "Mirror HTML listing tables into SQLite", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Workflow to run
    #[arg(value_enum, value_name = "WORKFLOW")]
    workflow: Workflow,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Validate config and show what would be synced without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show table statistics from the workflow database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

/// Exit status when at least one catalog key failed
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.json_logs);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.workflow)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config, cli.workflow)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_sync(&config, cli.workflow, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sync=info,warn"),
            1 => EnvFilter::new("catalog_sync=debug,info"),
            2 => EnvFilter::new("catalog_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}

/// Handles the --dry-run mode: validates config and shows what would be synced
fn handle_dry_run(config: &Config, workflow: Workflow) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog-Sync Dry Run ({}) ===\n", workflow);

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Fetch timeout: {}s", config.http.fetch_timeout_secs);

    let [catalog, dependents] = workflow.tables();
    println!("\nStorage:");
    println!("  Database: {}", workflow.database_path(config)?);
    println!("  Tables: {}, {}", catalog.name, dependents.name);

    println!("\nEndpoints:");
    match workflow {
        Workflow::Products => {
            if let Some(products) = &config.products {
                println!("  Companies: {}", products.companies_url);
                println!("  Company links resolved against: {}", products.company_base_url);
                println!("  Product pages fetched concurrently");
            }
        }
        Workflow::Customers => {
            if let Some(customers) = &config.customers {
                println!("  Products: {}", customers.products_url);
                println!("  Customers: {}", customers.customers_url_template);
                println!("  Customer pages fetched sequentially");
            }
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, workflow: Workflow) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new(workflow.database_path(config)?);
    let stats = load_statistics(workflow, &db)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main sync operation
async fn handle_sync(
    config: &Config,
    workflow: Workflow,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing::info!("Starting {} workflow", workflow);

    let report = run_workflow(config, workflow).await?;

    if !quiet {
        print_report(&report);
    }

    if report.has_failures() {
        tracing::warn!(
            "{} of {} keys failed",
            report.failed_count(),
            report.dependents.len()
        );
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
