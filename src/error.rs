//! Error types for each stage of the pipeline.
//!
//! Leaf errors are typed so that a dropped table can report *why* it was
//! dropped. The binary itself still propagates `Box<dyn Error>` at the top.

use thiserror::Error;

/// The source page could not be retrieved. Always fatal for the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A single image lookup failed.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("image service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("image service returned HTTP {status}")]
    Status { status: u16 },
    #[error("image service returned an unexpected body: {reason} (body: {body})")]
    Body { reason: String, body: String },
}

/// A table fragment could not be rendered into a rectangular grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("table has no rows")]
    Empty,
    #[error("grid row {row} has {width} cells but the header has {header_width}")]
    Ragged {
        row: usize,
        width: usize,
        header_width: usize,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid {field} {value:?}: {source}")]
    Url {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}
