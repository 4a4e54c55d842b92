//! listings-etl: clean raw listing records and load them into the star schema
//!
//! Usage:
//!   # Load pages saved by the extractor into PostgreSQL
//!   listings-etl pages.json --database-url postgres://etl@localhost/airbnb
//!
//!   # Read NDJSON from stdin, DATABASE_URL taken from the environment or .env
//!   cat records.jsonl | listings-etl
//!
//!   # Clean and load into an in-memory store only, printing the summary
//!   listings-etl pages.json --dry-run

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use listings_etl::pipeline::{self, PipelineReport};
use listings_etl::source::read_records;
use listings_etl::store::{MemoryStore, Store};
use listings_etl::{NormalizeConfig, Table};
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "listings-etl")]
#[command(about = "Clean listing records and load them into relational tables", long_about = None)]
struct Args {
    /// Input file with API pages, records or NDJSON (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Connections in the pool; writes are still issued one at a time
    #[arg(long, default_value_t = 1)]
    max_connections: u32,

    /// Load into an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    /// Lower bound for minimum nights (default: 1)
    #[arg(long)]
    min_nights: Option<i32>,

    /// Upper bound for minimum nights (default: 7)
    #[arg(long)]
    max_nights: Option<i32>,

    /// Log debug output, including every dropped record
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = NormalizeConfig::default();
    if let Some(floor) = args.min_nights {
        config.min_nights_floor = floor;
    }
    if let Some(cap) = args.max_nights {
        config.min_nights_cap = cap;
    }

    let reader = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };
    let raw = read_records(reader)?;
    info!(records = raw.len(), "input read");

    let report = if args.dry_run {
        warn!("dry run: nothing is written to the database");
        run(&MemoryStore::new(), raw, &config).await?
    } else {
        let Some(database_url) = args.database_url.as_deref() else {
            bail!(
                "no database configured: pass --database-url, set DATABASE_URL, or use --dry-run"
            );
        };
        run_postgres(database_url, args.max_connections, raw, &config).await?
    };

    print_summary(&report);
    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_postgres(
    database_url: &str,
    max_connections: u32,
    raw: Vec<listings_etl::RawRecord>,
    config: &NormalizeConfig,
) -> Result<PipelineReport> {
    use listings_etl::store::{PgStore, StoreConfig};

    let store_config = StoreConfig {
        database_url: database_url.to_string(),
        max_connections,
    };
    let store = PgStore::connect(&store_config)
        .await
        .context("Failed to connect to the database")?;
    run(&store, raw, config).await
}

#[cfg(not(feature = "postgres"))]
async fn run_postgres(
    _database_url: &str,
    _max_connections: u32,
    _raw: Vec<listings_etl::RawRecord>,
    _config: &NormalizeConfig,
) -> Result<PipelineReport> {
    bail!("built without the `postgres` feature; use --dry-run")
}

async fn run<S: Store>(
    store: &S,
    raw: Vec<listings_etl::RawRecord>,
    config: &NormalizeConfig,
) -> Result<PipelineReport> {
    match pipeline::run(store, raw, config).await {
        Ok(report) => Ok(report),
        Err(err) => {
            error!(stage = %err.stage(), error = %err, "pipeline failed");
            Err(err.into())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_summary(report: &PipelineReport) {
    let transform = report.transform;
    println!(
        "records: {} received, {} kept, {} dropped",
        transform.received, transform.kept, transform.dropped
    );

    let load = &report.load;
    for (table, counts) in [
        (Table::RoomType, load.room_types),
        (Table::Availability, load.availability),
        (Table::Country, load.countries),
        (Table::City, load.cities),
        (Table::Coordinates, load.coordinates),
        (Table::Listings, load.listings),
    ] {
        println!(
            "{:<13} {} inserted, {} already present",
            table.name(), counts.inserted, counts.skipped
        );
    }
}
