use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use search_loader::{ColumnSource, Dependencies, GlueTableFile, LoaderError, Settings};
use search_loader_ingest::SourceUnit;

#[derive(Parser)]
#[command(name = "search-loader")]
#[command(about = "Load exported tables into the search cluster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every object named by a storage notification or queue event
    Load {
        /// File holding the notification or queue event JSON
        #[arg(long)]
        notification: PathBuf,
    },
    /// Load one object
    LoadObject {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        /// Target index (default: parent directory of the key)
        #[arg(long)]
        index: Option<String>,
    },
    /// Recreate the daily index of a table and print its name
    Prepare {
        #[arg(long)]
        schema: String,
        #[arg(long)]
        table: String,
        /// Read columns from a saved catalog GetTable response instead of the catalog
        #[arg(long, conflicts_with = "catalog_id")]
        catalog_file: Option<PathBuf>,
        /// Account owning the catalog (default: the caller's account)
        #[arg(long)]
        catalog_id: Option<String>,
        /// Export date, YYYY-MM-DD (default: yesterday, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Block until an index holds the expected number of documents
    Wait {
        #[arg(long)]
        index: String,
        #[arg(long)]
        expected: u64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn yesterday() -> Result<NaiveDate, LoaderError> {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| LoaderError::config("Cannot compute yesterday's date"))
}

async fn run(cli: Cli) -> Result<(), LoaderError> {
    let settings = Settings::from_env()?;
    let deps = Dependencies::new(settings).await?;

    match cli.command {
        Commands::Load { notification } => {
            let body = tokio::fs::read_to_string(&notification).await?;
            let summary = deps.unit_processor().process_notification(&body).await?;
            info!(
                units = summary.units,
                records = summary.records,
                batches = summary.batches,
                "Load complete"
            );
        }
        Commands::LoadObject { bucket, key, index } => {
            let unit = SourceUnit::new(bucket, key);
            let summary = deps
                .unit_processor()
                .process_object(&unit, index.as_deref())
                .await?;
            info!(
                records = summary.records,
                batches = summary.batches,
                "Load complete"
            );
        }
        Commands::Prepare {
            schema,
            table,
            catalog_file,
            catalog_id,
            date,
        } => {
            let date = match date {
                Some(date) => date,
                None => yesterday()?,
            };
            let catalog: Box<dyn ColumnSource> = match catalog_file {
                Some(path) => Box::new(GlueTableFile::new(path)),
                None => Box::new(deps.glue_catalog(catalog_id).await),
            };
            let index = deps
                .index_preparer()
                .prepare(catalog.as_ref(), &schema, &table, date)
                .await?;
            println!("{}", index);
        }
        Commands::Wait { index, expected } => {
            deps.index_preparer()
                .wait_for_documents(&index, expected)
                .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
