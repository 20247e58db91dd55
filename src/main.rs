//! # wiki_tables
//!
//! Scrapes the data tables of a Wikipedia list page (by default
//! "List of 2021 albums"), attaches each row's article link and cover image,
//! and writes everything to one JSON file.
//!
//! ## Usage
//!
//! ```sh
//! wiki_tables                      # defaults, writes ./data.json
//! wiki_tables --skip-rows 0 -o albums.json
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly sequential pipeline:
//! 1. **Fetching**: GET the source page
//! 2. **Locating**: pick out every `<table>` carrying the marker class
//! 3. **Converting**: render each table into records, resolve one link per
//!    record, and look up one image per link (throttled)
//! 4. **Output**: write `{"bad_tables": n, "0": [...], ...}` as JSON
//!
//! A table that fails to convert is counted in `bad_tables` and left out;
//! the run carries on with the next table. Only a failed page fetch or a
//! failed write aborts the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod tables;
mod throttle;
mod utils;

use cli::Cli;
use config::{FileConfig, Settings};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("wiki_tables starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Load config ----
    let file_config = match args.config.as_deref() {
        Some(path) => {
            let conf = FileConfig::load(path)?;
            info!(config_path = path, "Loaded configuration");
            conf
        }
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file_config)?;
    info!(
        url = %settings.source_url,
        skip_rows = settings.skip_rows,
        output = %settings.output.display(),
        "Configuration resolved"
    );

    // ---- Scrape, convert, write ----
    let results = match pipeline::run(&settings).await {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        tables = results.tables.len(),
        bad_tables = results.bad_tables,
        records = results.record_count(),
        "Execution complete"
    );

    Ok(())
}
