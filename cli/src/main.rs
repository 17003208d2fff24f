//! # netrag CLI
//!
//! netrag — ask questions about your network fleet
//!
//! Fuses a vector-indexed knowledge corpus, live device records with
//! quality assessment, and an LLM into grounded answers, served over MCP
//! or the command line.
//!
//! ## Usage
//!
//! ```bash
//! # One-shot question
//! netrag query "How many FTTH OLTs are there?"
//!
//! # Serve the MCP tools over stdio
//! netrag serve
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use netrag::commands;
use netrag::config::AppConfig;

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Info);
    }
    // The MCP transport owns stdout; logs go to stderr.
    log_builder.target(env_logger::Target::Stderr);
    log_builder.init();
}

/// Main CLI structure
#[derive(Parser)]
#[command(name = "netrag")]
#[command(about = "netrag — ask questions about your network fleet", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP tools over stdio
    Serve,

    /// Answer one natural-language question and print the response
    Query {
        /// The question to answer
        #[arg(value_name = "QUERY")]
        query: String,
        /// Skip the recommendations section
        #[arg(long)]
        no_recommendations: bool,
        /// Maximum devices in listing answers
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,
    },

    /// List devices directly, with health scoring
    Devices {
        /// Device type: olt, modem, lag, team, pxc, or all
        #[arg(long, default_value = "all")]
        device_type: String,
        /// Filter by region (HOBO, GENT, ROES, ASSE)
        #[arg(long)]
        region: Option<String>,
        /// Filter by environment (PRODUCTION, UAT, TEST)
        #[arg(long)]
        environment: Option<String>,
        /// Device name prefix filter
        #[arg(long)]
        filter: Option<String>,
        /// Maximum devices to return
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Ingest knowledge documents from a JSON file
    Ingest {
        /// Path to a JSON array of documents
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => commands::serve::run(config).await,
        Commands::Query {
            query,
            no_recommendations,
            limit,
        } => commands::query::run(config, &query, no_recommendations, limit).await,
        Commands::Devices {
            device_type,
            region,
            environment,
            filter,
            limit,
        } => {
            commands::devices::run(
                config,
                &device_type,
                region.as_deref(),
                environment.as_deref(),
                filter.as_deref(),
                limit,
            )
            .await
        }
        Commands::Ingest { path } => commands::ingest::run(config, &path).await,
    }
}
