//! vacstat CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use vacstat::{
    config::load_config,
    error::Result,
    models::Config,
    pipeline,
    services::CbrRateFeed,
    storage::{CorpusStorage, LocalStorage},
};

/// vacstat - Vacancy Salary Statistics
#[derive(Parser, Debug)]
#[command(
    name = "vacstat",
    version,
    about = "Currency-normalized salary statistics for vacancy exports"
)]
struct Cli {
    /// Path to storage directory holding config and generated files
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
    /// Fetch exchange rates for the currencies of a vacancy file
    Rates {
        /// Vacancy CSV file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Normalize salaries and write year shards
    Normalize {
        /// Vacancy CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Also write per-region shards
        #[arg(long)]
        regions: bool,
    },

    /// Aggregate stored shards into statistics
    Stats {
        /// Profession name matched as a substring of the vacancy name
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        profession: String,

        /// Restrict year statistics to one region
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Run full pipeline: Rates → Normalize → Stats
    Pipeline {
        /// Vacancy CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Profession name matched as a substring of the vacancy name
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        profession: String,

        /// Restrict year statistics to one region
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Validate configuration file
    Validate,

    /// Show storage status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the configuration of a storage directory and open it.
fn open(storage_dir: &Path) -> Result<(Config, LocalStorage)> {
    let config = load_config(storage_dir)?;
    log::info!("Loaded configuration from {}", storage_dir.display());
    let storage = LocalStorage::with_paths(storage_dir, config.paths.clone());
    Ok((config, storage))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Rates { input } => {
            let (config, storage) = open(&cli.storage_dir)?;
            let feed = CbrRateFeed::new(&config.feed)?;
            pipeline::run_rates(&config, &storage, &feed, &input).await?;
        }

        Command::Normalize { input, regions } => {
            let (config, storage) = open(&cli.storage_dir)?;
            pipeline::run_normalize(&config, &storage, &input, regions).await?;
        }

        Command::Stats { profession, region } => {
            let (config, storage) = open(&cli.storage_dir)?;
            pipeline::run_statistics(&config, &storage, &profession, region.as_deref()).await?;
        }

        Command::Pipeline {
            input,
            profession,
            region,
        } => {
            let (config, storage) = open(&cli.storage_dir)?;
            let feed = CbrRateFeed::new(&config.feed)?;
            pipeline::run_pipeline(
                &config,
                &storage,
                &feed,
                &input,
                &profession,
                region.as_deref(),
            )
            .await?;
        }

        Command::Validate => {
            pipeline::run_validate(&cli.storage_dir)?;
            log::info!("All validations passed!");
        }

        Command::Info => {
            let (_, storage) = open(&cli.storage_dir)?;
            log::info!("Storage directory: {}", storage.root_dir().display());

            match storage.load_rate_table().await? {
                Some(table) => log::info!(
                    "Rate table: {} months, currencies {:?}, {} known rates",
                    table.months().count(),
                    table.currencies().collect::<Vec<_>>(),
                    table.len()
                ),
                None => log::info!("Rate table: not found"),
            }

            match storage.load_manifest().await? {
                Some(manifest) => {
                    log::info!("Manifest updated at {}", manifest.updated_at);
                    log::info!(
                        "  admitted currencies {:?} (threshold {})",
                        manifest.admitted_currencies,
                        manifest.currency_threshold
                    );
                    log::info!(
                        "  {} input, {} currency-filtered, {} without salary, {} retained",
                        manifest.stats.input,
                        manifest.stats.currency_filtered,
                        manifest.stats.without_salary,
                        manifest.stats.retained
                    );
                    for key in manifest.year_keys() {
                        log::info!("  shard {}", key);
                    }
                    let regions = manifest.regions();
                    if !regions.is_empty() {
                        log::info!("  {} regions: {:?}", regions.len(), regions);
                    }
                }
                None => log::info!("Manifest: not found"),
            }

            if let Some(report) = storage.load_report().await? {
                log::info!(
                    "Last report: '{}' generated at {}",
                    report.profession,
                    report.generated_at
                );
                for line in report.lines() {
                    log::info!("  {}", line);
                }
            }
        }
    }

    Ok(())
}
