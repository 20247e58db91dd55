//! Command-line interface definitions for wiki_tables.
//!
//! Every option is optional: running the binary with no arguments scrapes the
//! default page with the default settings. Values given here override the
//! YAML config file, which in turn overrides the built-in defaults (see
//! [`crate::config`]).

use clap::Parser;

/// Command-line arguments for the wiki_tables scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the default page into ./data.json
/// wiki_tables
///
/// # Another year, skipping no rows, with a faster throttle
/// wiki_tables --url https://en.wikipedia.org/wiki/List_of_2022_albums --skip-rows 0 --throttle-ms 250
///
/// # Settings from a file
/// wiki_tables -c scrape.yaml -o out/albums.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Wikipedia page to scrape
    #[arg(long, env = "WIKI_TABLES_URL")]
    pub url: Option<String>,

    /// Number of data rows to skip after each table's header row
    #[arg(long, env = "WIKI_TABLES_SKIP_ROWS")]
    pub skip_rows: Option<usize>,

    /// CSS class marking the tables to extract
    #[arg(long)]
    pub table_class: Option<String>,

    /// Image lookup service endpoint
    #[arg(long, env = "IMAGE_ENDPOINT")]
    pub image_endpoint: Option<String>,

    /// Pause between consecutive image lookups, in milliseconds
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Request timeout in seconds (no timeout when omitted)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output path for the JSON result
    #[arg(short, long)]
    pub output: Option<String>,

    /// Keep the successful rows of tables where some image lookups failed
    #[arg(long)]
    pub keep_partial: bool,
}
