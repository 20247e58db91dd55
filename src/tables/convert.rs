//! Conversion of one table fragment into enriched records.
//!
//! Records and their links come from the same pass over the [`Grid`], so
//! record *i* always gets the link, and therefore the image, of grid data
//! row *i*.

use crate::api::ImageLookup;
use crate::models::{IMAGES_COLUMN, LINKS_COLUMN, Record, RowFailure, RowOutcome, TableOutcome};
use crate::scrapers::wiki::TableFragment;
use crate::tables::grid::{Grid, GridCell, primary_link};
use futures::stream::{self, StreamExt};
use tracing::{debug, instrument};
use url::Url;

/// Render `fragment`, build one record per data row, and attach each row's
/// article link and image.
///
/// Lookups run one at a time in row order. Rows without a link get `null`
/// for both derived columns and cost no lookup.
#[instrument(level = "info", skip_all, fields(skip_rows = skip_rows, bytes = fragment.html.len()))]
pub async fn convert_table<L: ImageLookup>(
    fragment: &TableFragment,
    skip_rows: usize,
    base: &Url,
    lookup: &L,
) -> TableOutcome {
    let grid = match Grid::parse(&fragment.html) {
        Ok(grid) => grid,
        Err(e) => return TableOutcome::Failed(e),
    };
    let header = grid.header();
    debug!(?header, height = grid.height(), width = grid.width(), "Rendered table grid");

    let rows: Vec<(Record, Option<String>)> = grid
        .data_rows(skip_rows)
        .map(|cells| {
            let link = primary_link(cells).and_then(|href| absolute_link(base, href));
            (record_from_cells(&header, cells), link)
        })
        .collect();

    let outcomes: Vec<RowOutcome> = stream::iter(rows.into_iter().enumerate())
        .then(|(row, (record, link))| enrich_row(row, record, link, lookup))
        .collect()
        .await;

    TableOutcome::from_rows(outcomes)
}

/// Resolve a cell's `href` against the page URL.
pub fn absolute_link(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}

/// Zip header names with cell values. Empty cells become null.
pub fn record_from_cells(header: &[String], cells: &[GridCell]) -> Record {
    let mut record = Record::new();
    for (name, cell) in header.iter().zip(cells) {
        record.insert(name.as_str(), cell.text.clone());
    }
    record
}

async fn enrich_row<L: ImageLookup>(
    row: usize,
    mut record: Record,
    link: Option<String>,
    lookup: &L,
) -> RowOutcome {
    let image = match &link {
        Some(link) => Some(lookup.lookup(link).await.map_err(|error| RowFailure {
            row,
            link: link.clone(),
            error,
        })?),
        None => None,
    };
    record.insert(LINKS_COLUMN, link);
    record.insert(IMAGES_COLUMN, image);
    Ok(record)
}
