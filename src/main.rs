//! interest-miner command line
//!
//! Operator surface for the interest mining pipeline: ingest client events,
//! run the keyword aggregation job, and query user profiles.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use interest_miner::config::{Config, LogFormat, LoggingConfig};
use interest_miner::types::KeywordKind;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::OutputFormat;

#[derive(Parser)]
#[command(name = "interest-miner")]
#[command(about = "Mine user interests from tracked pages and searches")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "interest-miner.toml")]
    config: PathBuf,

    /// Data directory (overrides storage.data_dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Store the HTML of a visited page for keyword mining
    IngestHtml {
        user: String,
        url: String,
        /// File holding the page HTML
        file: PathBuf,
        /// Visit date (RFC 3339 or "YYYY-MM-DD HH:MM:SS", UTC); defaults to now
        #[arg(long)]
        date: Option<String>,
    },

    /// Log a page visit and count its domain categories
    IngestVisit {
        user: String,
        url: String,
        #[arg(long)]
        date: Option<String>,
    },

    /// Store a search query
    IngestSearch {
        user: String,
        query: String,
        #[arg(long)]
        date: Option<String>,
    },

    /// Merge unprocessed page records into user keyword profiles
    Aggregate {
        /// Repeat every N seconds until interrupted
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Repeat at the configured interval until interrupted
        #[arg(long, conflicts_with = "interval_secs")]
        watch: bool,
    },

    /// Show a user's top keywords
    Keywords {
        user: String,

        /// Keyword table
        #[arg(short, long, value_enum, default_value = "site")]
        kind: CliKeywordKind,

        /// Number of keywords (0 for all)
        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Score a user's search intentions
    Intentions {
        user: String,

        /// Lexicon name (built-in "buy", "travel", or a configured lexicon)
        #[arg(short, long, default_value = "buy")]
        lexicon: String,

        /// Look-back window in days (overrides intention.window_days)
        #[arg(short, long)]
        window_days: Option<i64>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a user's visits per category
    Categories {
        user: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show store statistics
    Stats,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliKeywordKind {
    /// Keywords from page text
    Site,
    /// Keywords from title, description and keywords metadata
    Metadata,
}

impl From<CliKeywordKind> for KeywordKind {
    fn from(kind: CliKeywordKind) -> Self {
        match kind {
            CliKeywordKind::Site => KeywordKind::Site,
            CliKeywordKind::Metadata => KeywordKind::Metadata,
        }
    }
}

fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = logging.level.raised_by(verbose);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or default config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    init_logging(&config.logging, cli.verbose)?;
    debug!("Using configuration {:?}", config);

    match cli.command {
        Commands::Init { path } => commands::init::init_config(&path),
        Commands::IngestHtml {
            user,
            url,
            file,
            date,
        } => commands::ingest::ingest_html(config, &user, &url, &file, date.as_deref()),
        Commands::IngestVisit { user, url, date } => {
            commands::ingest::ingest_visit(config, &user, &url, date.as_deref())
        }
        Commands::IngestSearch { user, query, date } => {
            commands::ingest::ingest_search(config, &user, &query, date.as_deref())
        }
        Commands::Aggregate {
            interval_secs,
            watch,
        } => {
            let interval = match (interval_secs, watch) {
                (Some(secs), _) => Some(secs),
                (None, true) => Some(config.aggregation.interval_secs),
                (None, false) => None,
            };
            commands::aggregate::run_aggregation(config, interval).await
        }
        Commands::Keywords {
            user,
            kind,
            limit,
            format,
        } => commands::profile::show_keywords(config, &user, kind.into(), limit, format),
        Commands::Intentions {
            user,
            lexicon,
            window_days,
            format,
        } => commands::profile::show_intentions(config, &user, &lexicon, window_days, format),
        Commands::Categories { user, format } => {
            commands::profile::show_categories(config, &user, format)
        }
        Commands::Stats => commands::stats::show_stats(config),
    }
}
