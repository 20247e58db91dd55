//! Layered run configuration.
//!
//! Resolution order, lowest to highest precedence:
//!
//! 1. Built-in defaults (the `DEFAULT_*` constants below)
//! 2. An optional YAML file passed with `--config`
//! 3. Command-line flags and their environment variables
//!
//! # Config file
//!
//! ```yaml
//! url: https://en.wikipedia.org/wiki/List_of_2022_albums
//! skip_rows: 1
//! table_class: wikitable
//! image_endpoint: http://localhost:35351/api/image-scraper
//! throttle_ms: 1000
//! timeout_secs: 30
//! output: data.json
//! keep_partial: false
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://en.wikipedia.org/wiki/List_of_2021_albums";
pub const DEFAULT_IMAGE_ENDPOINT: &str = "http://flip3.engr.oregonstate.edu:35351/api/image-scraper";
pub const DEFAULT_TABLE_CLASS: &str = "wikitable";
pub const DEFAULT_SKIP_ROWS: usize = 1;
pub const DEFAULT_THROTTLE_MS: u64 = 1000;
pub const DEFAULT_OUTPUT: &str = "data.json";

/// Settings as read from a YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub skip_rows: Option<usize>,
    pub table_class: Option<String>,
    pub image_endpoint: Option<String>,
    pub throttle_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub output: Option<String>,
    pub keep_partial: Option<bool>,
}

impl FileConfig {
    /// Read and parse a YAML config file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to `null`, which serde_yaml rejects for structs.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Page to scrape. Relative article links are resolved against it.
    pub source_url: Url,
    /// Data rows dropped after each header row.
    pub skip_rows: usize,
    /// Class token marking data tables.
    pub table_class: String,
    /// Image lookup service endpoint.
    pub image_endpoint: Url,
    /// Pause between consecutive image lookups.
    pub throttle: Duration,
    /// Per-request timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Where the JSON result is written.
    pub output: PathBuf,
    /// Write the successful rows of partially failed tables instead of dropping them.
    pub keep_partial: bool,
}

impl Settings {
    /// Merge CLI flags over file settings over defaults, and validate the URLs.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let source_url = cli
            .url
            .clone()
            .or(file.url)
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let image_endpoint = cli
            .image_endpoint
            .clone()
            .or(file.image_endpoint)
            .unwrap_or_else(|| DEFAULT_IMAGE_ENDPOINT.to_string());

        let settings = Settings {
            source_url: parse_url("url", source_url)?,
            skip_rows: cli.skip_rows.or(file.skip_rows).unwrap_or(DEFAULT_SKIP_ROWS),
            table_class: cli
                .table_class
                .clone()
                .or(file.table_class)
                .unwrap_or_else(|| DEFAULT_TABLE_CLASS.to_string()),
            image_endpoint: parse_url("image_endpoint", image_endpoint)?,
            throttle: Duration::from_millis(
                cli.throttle_ms.or(file.throttle_ms).unwrap_or(DEFAULT_THROTTLE_MS),
            ),
            timeout: cli
                .timeout_secs
                .or(file.timeout_secs)
                .map(Duration::from_secs),
            output: PathBuf::from(
                cli.output
                    .clone()
                    .or(file.output)
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
            keep_partial: cli.keep_partial || file.keep_partial.unwrap_or(false),
        };
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

fn parse_url(field: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(&value).map_err(|source| ConfigError::Url {
        field,
        value,
        source,
    })
}
