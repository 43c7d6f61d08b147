//! storesync CLI
//!
//! Scrapes storefront product listings and synchronizes them to a Google
//! Sheet.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storesync::{
    error::{AppError, Result},
    models::{Config, ScrapeSummary},
    pipeline,
    sheets::{SheetsClient, SyncMode},
    storage::LocalStore,
};

/// storesync - Storefront Product Scraper
#[derive(Parser, Debug)]
#[command(
    name = "storesync",
    version,
    about = "Storefront product scraper and sheet synchronizer"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape configured listings, write artifacts, sync to the sheet
    Scrape {
        /// Override the per-category product limit
        #[arg(long)]
        limit: Option<usize>,

        /// Write local artifacts only, skip the sheet
        #[arg(long)]
        no_sync: bool,

        /// Sync mode: update, replace or append-only
        #[arg(long, default_value = "update")]
        mode: String,
    },

    /// Synchronize a previously scraped products.json
    Sync {
        /// Sync mode: update, replace or append-only
        #[arg(long, default_value = "update")]
        mode: String,
    },

    /// Validate configuration files
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_mode(s: &str) -> Result<SyncMode> {
    SyncMode::parse(s).ok_or_else(|| {
        AppError::config(format!(
            "unknown sync mode '{s}' (expected update, replace or append-only)"
        ))
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("storesync starting...");

    let mut config = Config::load_or_default(&cli.config);
    let store = LocalStore::new(&config.output.data_dir);

    match cli.command {
        Command::Scrape {
            limit,
            no_sync,
            mode,
        } => {
            let mode = parse_mode(&mode)?;
            if let Some(limit) = limit {
                config.scraper.max_products = limit;
            }
            config.validate()?;

            // Missing store credentials must fail before any scraping starts.
            let sheets = if no_sync {
                None
            } else {
                Some(SheetsClient::new(&config.sheets)?)
            };

            let outcome = pipeline::run_scrape(&config).await?;

            let by_platform = pipeline::group_by_platform(&outcome.products);
            store.write_products(&by_platform).await?;
            store.write_summary(&ScrapeSummary::build(&by_platform)).await?;

            if let Some(sheets) = sheets {
                pipeline::run_sync(&outcome.products, &sheets, mode).await?;
            } else {
                log::info!("Sheet sync skipped (--no-sync)");
            }
        }

        Command::Sync { mode } => {
            let mode = parse_mode(&mode)?;
            let sheets = SheetsClient::new(&config.sheets)?;

            let Some(by_platform) = store.load_products().await? else {
                log::error!(
                    "No products.json found in {}. Run 'scrape' first.",
                    config.output.data_dir
                );
                return Err(AppError::config("products.json not found"));
            };

            let products: Vec<_> = by_platform.into_values().flatten().collect();
            pipeline::run_sync(&products, &sheets, mode).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            match SheetsClient::new(&config.sheets) {
                Ok(_) => log::info!("✓ Sheet credentials present"),
                Err(e) => log::warn!("Sheet sync not configured: {}", e),
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Data directory: {}", config.output.data_dir);

            match store.load_products().await? {
                Some(by_platform) => {
                    let total: usize = by_platform.values().map(Vec::len).sum();
                    log::info!("Snapshot: {} products", total);
                    for (platform, products) in &by_platform {
                        log::info!("  {}: {} products", platform, products.len());
                    }
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
