//! Wikipedia page fetching and table location.
//!
//! The page is fetched once. Matching tables are copied out as owned HTML
//! fragments so the parsed document can be dropped before any image lookups
//! start.

use crate::error::FetchError;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());

/// One `<table>` whose class list contains the marker token, as outer HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFragment {
    pub html: String,
}

/// GET `url` and return the body.
///
/// Connection failures and non-2xx statuses are both errors. There is no
/// retry.
#[instrument(level = "info", skip(client))]
pub async fn fetch_document(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let transport = |source: reqwest::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let resp = client.get(url).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "Source page returned an error status");
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.map_err(transport)?;
    info!(bytes = body.len(), "Fetched source page");
    Ok(body)
}

/// Every `<table>` in `document` carrying the `class_marker` class, in
/// document order.
///
/// The marker must be a whole class token: `wikitable` matches
/// `class="wikitable sortable"` but not `class="wikitables"`.
#[instrument(level = "info", skip(document))]
pub fn locate_tables(document: &str, class_marker: &str) -> Vec<TableFragment> {
    let html = Html::parse_document(document);
    let tables: Vec<TableFragment> = html
        .select(&TABLE_SELECTOR)
        .filter(|t| t.value().classes().any(|c| c == class_marker))
        .map(|t| TableFragment { html: t.html() })
        .collect();

    info!(count = tables.len(), "Located marked tables");
    debug!(sizes = ?tables.iter().map(|t| t.html.len()).collect::<Vec<_>>(), "Table fragment sizes");
    tables
}
