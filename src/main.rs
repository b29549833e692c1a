//! CLI entry point for the NEO explorer.
//!
//! Loads the NEO catalog and close-approach data, links them, and either
//! exports the linked approaches or inspects a single NEO.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use neo_explorer::{
    database::{NeoDatabase, limit},
    extract::{load_approaches, load_neos},
    logging::env_filter,
    write::write_results,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "neo_explorer")]
#[command(about = "Explore close approaches of near-Earth objects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input files shared by every subcommand.
#[derive(Args)]
struct DataFiles {
    /// CSV file of near-Earth objects
    #[arg(long, env = "NEO_FILE", default_value = "data/neos.csv")]
    neofile: PathBuf,

    /// JSON file of close approaches
    #[arg(long, env = "CAD_FILE", default_value = "data/cad.json")]
    cadfile: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write linked close approaches to a CSV or JSON file
    Export {
        #[command(flatten)]
        data: DataFiles,

        /// Output file; the extension (.csv or .json) selects the format
        #[arg(short, long)]
        outfile: PathBuf,

        /// Maximum number of approaches to write (0 = all)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a single NEO, looked up by designation or name
    Inspect {
        #[command(flatten)]
        data: DataFiles,

        /// Primary designation of the NEO
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        pdes: Option<String>,

        /// IAU name of the NEO
        #[arg(long)]
        name: Option<String>,

        /// Also list every close approach of the NEO
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/neo_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("neo_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            data,
            outfile,
            limit: max,
        } => {
            let db = load_database(&data);
            let rows = write_results(limit(db.approaches(), max), &outfile)?;
            info!(rows, outfile = %outfile.display(), "Export complete");
        }
        Commands::Inspect {
            data,
            pdes,
            name,
            verbose,
        } => {
            let db = load_database(&data);

            let neo = match (&pdes, &name) {
                (Some(pdes), _) => db.get_neo_by_designation(pdes),
                (None, Some(name)) => db.get_neo_by_name(name),
                (None, None) => bail!("either --pdes or --name is required"),
            };

            let Some(neo) = neo else {
                warn!(?pdes, ?name, "No matching NEO found");
                println!("No matching NEOs exist in the database.");
                return Ok(());
            };

            println!("{neo}");
            if verbose {
                for approach in db.approaches_for(neo) {
                    println!("- {approach}");
                }
            }
        }
    }

    Ok(())
}

/// Loads both data files and links approaches to their NEOs.
#[tracing::instrument(skip_all, fields(neofile = %files.neofile.display(), cadfile = %files.cadfile.display()))]
fn load_database(files: &DataFiles) -> NeoDatabase {
    let neos = load_neos(&files.neofile);
    let approaches = load_approaches(&files.cadfile);
    NeoDatabase::new(neos, approaches)
}
