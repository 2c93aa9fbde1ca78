//! mpsiem CLI
//!
//! Command-line interface for browsing and managing SIEM event filters

use anyhow::Context;
use clap::{Parser, Subcommand};
use mpsiem_config_file::SiemConfig;
use mpsiem_core::Error;
use mpsiem_filters::FilterCatalog;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG_PATH: &str = "~/.mpsiem/config.yaml";

#[derive(Parser)]
#[command(name = "mpsiem")]
#[command(about = "mpsiem - SIEM event filters client", long_about = None)]
struct Cli {
    /// Path to the configuration file (YAML or TOML)
    #[arg(long, short, env = "MPSIEM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all filter folders
    Folders,
    /// List all filters
    Filters,
    /// Create a filter folder
    CreateFolder {
        /// Name of the new folder
        #[arg(long)]
        name: String,

        /// ID of the parent folder
        #[arg(long)]
        parent_id: String,
    },
    /// Create a PDQL filter
    CreateFilter {
        /// Name of the new filter
        #[arg(long)]
        name: String,

        /// ID of the folder holding the filter
        #[arg(long)]
        folder_id: String,

        /// PDQL query text
        #[arg(long)]
        query: String,
    },
    /// Show a filter's details
    FilterInfo {
        /// Filter ID
        filter_id: String,

        /// Show the PDQL representation instead of the structured query
        #[arg(long, default_value = "false")]
        pdql: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_tracing(&config.logging.level)?;

    let mut catalog = FilterCatalog::new(config.connection()?);
    let result = run(cli.command, &mut catalog).await;
    catalog.close();

    result
}

fn load_config(cli: &Cli) -> anyhow::Result<SiemConfig> {
    let mut config = match &cli.config {
        Some(path) => SiemConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match SiemConfig::from_file(DEFAULT_CONFIG_PATH) {
            Ok(config) => config,
            Err(Error::ConfigNotFound) => SiemConfig::default(),
            Err(e) => return Err(e).context("Failed to load default config"),
        },
    };

    config.merge_env();
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.resolve_env_vars()?;
    config.validate()?;

    Ok(config)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}", log_level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging initialized at {}", log_level);
    Ok(())
}

async fn run(command: Commands, catalog: &mut FilterCatalog) -> anyhow::Result<()> {
    match command {
        Commands::Folders => print_json(catalog.list_folders().await?)?,
        Commands::Filters => print_json(catalog.list_filters().await?)?,
        Commands::CreateFolder { name, parent_id } => {
            let folder_id = catalog.create_folder(&name, &parent_id).await?;
            println!("{}", folder_id);
        }
        Commands::CreateFilter {
            name,
            folder_id,
            query,
        } => {
            let filter_id = catalog.create_filter(&name, &folder_id, &query).await?;
            println!("{}", filter_id);
        }
        Commands::FilterInfo { filter_id, pdql } => {
            if pdql {
                print_json(&catalog.get_filter_info_pdql(&filter_id).await?)?;
            } else {
                print_json(&catalog.get_filter_info(&filter_id).await?)?;
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
