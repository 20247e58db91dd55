//! Table conversion.
//!
//! - [`grid`]: span-expanded rendering of a `<table>` and row link selection
//! - [`convert`]: one fragment → [`TableOutcome`]
//!
//! [`convert_tables`] owns the [`ResultSet`] for a run and folds every
//! table's outcome into it, one table at a time.

pub mod convert;
pub mod grid;

use crate::api::ImageLookup;
use crate::config::Settings;
use crate::models::{ResultSet, TableOutcome};
use crate::scrapers::wiki::TableFragment;
use tracing::{info, instrument, warn};
use url::Url;

/// Per-run options for table conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Data rows dropped after each header.
    pub skip_rows: usize,
    /// URL that relative links are resolved against.
    pub base: Url,
    /// Keep the successful rows of partially failed tables.
    pub keep_partial: bool,
}

impl From<&Settings> for ConvertOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            skip_rows: settings.skip_rows,
            base: settings.source_url.clone(),
            keep_partial: settings.keep_partial,
        }
    }
}

/// Convert every fragment in order and collect the outcomes.
#[instrument(level = "info", skip_all, fields(tables = fragments.len()))]
pub async fn convert_tables<L: ImageLookup>(
    fragments: &[TableFragment],
    options: &ConvertOptions,
    lookup: &L,
) -> ResultSet {
    let mut results = ResultSet::default();

    for (index, fragment) in fragments.iter().enumerate() {
        let outcome = convert::convert_table(fragment, options.skip_rows, &options.base, lookup).await;
        log_outcome(index, &outcome);
        results.absorb(index, outcome, options.keep_partial);
    }

    info!(
        converted = results.tables.len(),
        bad_tables = results.bad_tables,
        records = results.record_count(),
        "Finished converting tables"
    );
    results
}

fn log_outcome(table: usize, outcome: &TableOutcome) {
    match outcome {
        TableOutcome::Complete(records) => {
            info!(table, records = records.len(), "Table converted");
        }
        TableOutcome::Partial { records, failures } => {
            for f in failures {
                warn!(table, row = f.row, link = %f.link, error = %f.error, "Image lookup failed");
            }
            warn!(
                table,
                ok = records.len(),
                failed = failures.len(),
                "Table partially converted"
            );
        }
        TableOutcome::Failed(e) => {
            warn!(table, error = %e, "Table could not be converted");
        }
    }
}
