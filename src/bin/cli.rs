//! vitistat CLI
//!
//! Runs the API server, one-off syncs and cache reads from the terminal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use vitistat::{
    api,
    error::Result,
    models::{Category, Config, Page, ResponseFormat},
    pipeline::{CacheReader, SyncOrchestrator},
    storage::{DatasetStorage, LocalStorage},
};

/// vitistat - Embrapa viticulture statistics cache
#[derive(Parser, Debug)]
#[command(
    name = "vitistat",
    version,
    about = "Scrapes and serves Embrapa viticulture statistics"
)]
struct Cli {
    /// Path to storage directory containing config.toml
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API and the periodic sync
    Serve,

    /// Sync one category, or all of them
    Sync {
        /// Category to sync (default: all)
        category: Option<Category>,
    },

    /// Print a cached dataset
    Read {
        category: Category,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: ResponseFormat,

        #[arg(long)]
        offset: Option<usize>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate configuration
    Validate,

    /// Show cache entries and when they were written
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::debug!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Serve => {
            config.validate()?;
            api::serve(&config).await?;
        }

        Command::Sync { category } => {
            let orchestrator = SyncOrchestrator::from_config(&config)?;
            let reports = match category {
                Some(category) => vec![orchestrator.sync(category).await],
                None => orchestrator.sync_all().await,
            };

            let mut failed = 0;
            for report in &reports {
                match &report.error {
                    None => log::info!("✓ {}: {} rows", report.category, report.rows),
                    Some(e) => {
                        failed += 1;
                        log::error!("✗ {}: {}", report.category, e);
                    }
                }
            }
            if failed > 0 {
                log::error!("{failed} of {} syncs failed", reports.len());
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Read {
            category,
            format,
            offset,
            limit,
        } => {
            let reader = CacheReader::new(Arc::new(LocalStorage::new(config.cache.dir.clone())));
            let payload = reader
                .read(category.as_str(), format, Page::new(offset, limit))
                .await?;
            println!("{}", payload.into_body()?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} API tokens)", config.auth.tokens.len());
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Cache directory: {}", config.cache.dir.display());
            log::info!("Upstream: {}", config.crawler.base_url);

            let storage = LocalStorage::new(config.cache.dir.clone());
            for category in Category::ALL {
                match storage
                    .modified(&category.cache_name(), ResponseFormat::Json)
                    .await?
                {
                    Some(at) => log::info!("  {:<12} synced {}", category.as_str(), at.to_rfc3339()),
                    None => log::info!("  {:<12} not synced", category.as_str()),
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
