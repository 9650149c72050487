use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use baseball_etl::config::{Config, DEFAULT_CONFIG_PATH};
use baseball_etl::constants;
use baseball_etl::error::StorageError;
use baseball_etl::logging;
use baseball_etl::pipeline::importer::Importer;
use baseball_etl::query::{self, CannedQuery};
use baseball_etl::report::{self, ReportFilter};
use baseball_etl::scrapers::{self, HttpCellSource};
use baseball_etl::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "baseball_etl")]
#[command(about = "Baseball history scraper, cleaner and SQLite loader")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch source pages and write raw CSV files
    Scrape {
        /// Specific sources to run (comma-separated). Available: brothers, mvp_awards, awards_list, yearly
        #[arg(long)]
        sources: Option<String>,
    },
    /// Clean the raw CSV files and load them into the database
    Import,
    /// Run a canned or custom query against the database
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },
    /// Summarize MVP awards and brothers sets
    Report {
        /// First year to include
        #[arg(long)]
        from: Option<i64>,
        /// Last year to include
        #[arg(long)]
        to: Option<i64>,
        /// Leagues to include (comma-separated, e.g. AL,NL)
        #[arg(long, value_delimiter = ',')]
        leagues: Vec<String>,
        /// Brothers-set sizes to include (comma-separated)
        #[arg(long, value_delimiter = ',')]
        brothers: Vec<i64>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum QueryCommand {
    /// Events for one year
    Events { year: i64 },
    /// Players whose team contains the given text
    Players { team: String },
    /// Events joined with players (2020 onwards, first 20 rows)
    Join,
    /// Event counts per year
    Summary,
    /// Player counts per category
    PlayerStats,
    /// Events and players cross-referenced by year and category
    CrossRef,
    /// Tables with their columns and row counts
    Tables,
    /// Arbitrary SQL
    Custom { sql: String },
}

impl QueryCommand {
    fn canned(self) -> Option<CannedQuery> {
        match self {
            QueryCommand::Events { year } => Some(CannedQuery::EventsByYear(year)),
            QueryCommand::Players { team } => Some(CannedQuery::PlayersByTeam(team)),
            QueryCommand::Join => Some(CannedQuery::EventsWithPlayers),
            QueryCommand::Summary => Some(CannedQuery::YearlySummary),
            QueryCommand::PlayerStats => Some(CannedQuery::PlayerStatsSummary),
            QueryCommand::CrossRef => Some(CannedQuery::CrossReference),
            QueryCommand::Custom { sql } => Some(CannedQuery::Custom(sql)),
            QueryCommand::Tables => None,
        }
    }
}

async fn run_scrape(config: &Config, sources: Option<String>) -> anyhow::Result<ExitCode> {
    println!("🔄 Running scrapers...");
    let source_names: Vec<String> = match sources {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => constants::get_supported_sources().into_iter().map(String::from).collect(),
    };

    let source = HttpCellSource::new(&config.scrape).context("Failed to build HTTP client")?;
    let reports = scrapers::run_sources(&source, &source_names, &config.scrape, &config.import.raw_dir).await?;

    println!("\n📊 Scrape Results:");
    for report in &reports {
        match &report.output_file {
            Some(path) => println!("   {} → {}: {} rows ({})", report.source, report.table, report.rows, path.display()),
            None => println!("   {} → {}: no rows extracted", report.source, report.table),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_import(config: &Config) -> anyhow::Result<ExitCode> {
    println!("📥 Importing raw files from {}...", config.import.raw_dir.display());
    let mut store = SqliteStore::open(&config.storage.db_path)
        .with_context(|| format!("Failed to open database {}", config.storage.db_path.display()))?;

    let mut summary = Importer::new(&mut store, &config.import).run();
    summary.database = Some(config.storage.db_path.display().to_string());
    summary.print();

    if summary.succeeded() {
        println!("✅ Import completed successfully");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Import failed for at least one required table");
        println!("❌ Import failed");
        Ok(ExitCode::FAILURE)
    }
}

/// Read-only commands never create the database; a missing one is reported instead.
fn open_for_reading(config: &Config) -> anyhow::Result<Option<SqliteStore>> {
    match SqliteStore::open_existing(&config.storage.db_path) {
        Ok(store) => Ok(Some(store)),
        Err(StorageError::Unavailable(reason)) => {
            error!("{}", reason);
            println!("❌ No database at {}; run `import` first", config.storage.db_path.display());
            Ok(None)
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("Failed to open database {}", config.storage.db_path.display()))),
    }
}

fn run_query(config: &Config, command: QueryCommand) -> anyhow::Result<ExitCode> {
    let Some(store) = open_for_reading(config)? else {
        return Ok(ExitCode::FAILURE);
    };

    let Some(canned) = command.canned() else {
        let tables = query::list_tables(&store)?;
        print!("{}", query::render_tables(&tables));
        return Ok(ExitCode::SUCCESS);
    };

    let missing = query::missing_tables(&store);
    if !missing.is_empty() && !matches!(canned, CannedQuery::Custom(_)) {
        warn!("Tables not loaded yet: {}; run `import` first", missing.join(", "));
    }

    match canned.run(&store) {
        Ok(result) => {
            print!("{}", query::render_result(&canned.title(), &result));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Query failed: {}", e);
            println!("❌ Error executing query: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_report(config: &Config, filter: ReportFilter, json: bool) -> anyhow::Result<ExitCode> {
    let Some(store) = open_for_reading(config)? else {
        return Ok(ExitCode::FAILURE);
    };
    let report = report::load_report(&store, &filter)?;

    if json {
        println!("{}", report::render_json(&report)?);
    } else {
        print!("{}", report::render_text(&report));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config)?;
    info!("Database: {}", config.storage.db_path.display());

    match cli.command {
        Commands::Scrape { sources } => run_scrape(&config, sources).await,
        Commands::Import => run_import(&config),
        Commands::Query { query } => run_query(&config, query),
        Commands::Report {
            from,
            to,
            leagues,
            brothers,
            json,
        } => {
            let year_range = match (from, to) {
                (None, None) => None,
                (from, to) => Some((from.unwrap_or(i64::MIN), to.unwrap_or(i64::MAX))),
            };
            let filter = ReportFilter {
                year_range,
                leagues,
                brother_counts: brothers,
            };
            run_report(&config, filter, json)
        }
    }
}
