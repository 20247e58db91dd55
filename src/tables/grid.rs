//! Rectangular rendering of HTML tables.
//!
//! A [`Grid`] is what a browser shows: every `rowspan`/`colspan` cell is
//! copied into each position it covers, so every logical row can be read
//! column by column. Cells keep the first hyperlink found inside them, which
//! lets article links be derived from the same traversal that produces the
//! records.

use crate::error::GridError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

// Selector strings are constants; parse cannot fail.
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Upper bounds from the HTML table model.
const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

/// One position of the rendered grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCell {
    /// Whitespace-normalized text, `None` when the cell is empty.
    pub text: Option<String>,
    /// `href` of the first link inside the cell.
    pub href: Option<String>,
    /// The source cell was a `<th>`.
    pub is_header: bool,
}

impl GridCell {
    fn from_element(cell: ElementRef<'_>) -> Self {
        let text = normalize_ws(&cell.text().collect::<String>());
        let href = cell
            .select(&LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|h| !h.is_empty())
            .map(str::to_string);
        GridCell {
            text: (!text.is_empty()).then_some(text),
            href,
            is_header: cell.value().name() == "th",
        }
    }
}

/// A span-expanded table. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<GridCell>>,
}

impl Grid {
    /// Parse the first `<table>` in `html` and render it.
    pub fn parse(html: &str) -> Result<Self, GridError> {
        let fragment = Html::parse_fragment(html);
        let table = fragment.select(&TABLE_SELECTOR).next().ok_or(GridError::Empty)?;
        Self::from_table(table)
    }

    /// Render a `<table>` element. Rows of nested tables are not included.
    ///
    /// Rows narrower than the header are padded with empty cells; a row wider
    /// than the header is an error.
    pub fn from_table(table: ElementRef<'_>) -> Result<Self, GridError> {
        let trs = own_rows(table);
        if trs.is_empty() {
            return Err(GridError::Empty);
        }

        let mut slots: Vec<Vec<Option<GridCell>>> = vec![Vec::new(); trs.len()];
        for (r, tr) in trs.iter().enumerate() {
            let mut col = 0usize;
            for cell in row_cells(*tr) {
                while slots[r].get(col).is_some_and(Option::is_some) {
                    col += 1;
                }
                let rowspan = span(cell, "rowspan", MAX_ROWSPAN).min(trs.len() - r);
                let colspan = span(cell, "colspan", MAX_COLSPAN);
                let value = GridCell::from_element(cell);

                for row in &mut slots[r..r + rowspan] {
                    if row.len() < col + colspan {
                        row.resize(col + colspan, None);
                    }
                    for slot in &mut row[col..col + colspan] {
                        *slot = Some(value.clone());
                    }
                }
                col += colspan;
            }
        }

        let header_width = slots[0].len();
        let mut rows = Vec::with_capacity(slots.len());
        for (r, row) in slots.into_iter().enumerate() {
            if row.len() > header_width {
                return Err(GridError::Ragged {
                    row: r,
                    width: row.len(),
                    header_width,
                });
            }
            let mut row: Vec<GridCell> = row.into_iter().map(Option::unwrap_or_default).collect();
            row.resize(header_width, GridCell::default());
            rows.push(row);
        }
        Ok(Grid { rows })
    }

    /// Column names taken from row 0.
    ///
    /// Empty headers become `Unnamed: <col>` and repeats get `.1`, `.2`, …
    pub fn header(&self) -> Vec<String> {
        let mut used = HashSet::new();
        self.rows[0]
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let base = cell
                    .text
                    .clone()
                    .unwrap_or_else(|| format!("Unnamed: {i}"));
                let mut name = base.clone();
                let mut n = 0;
                while !used.insert(name.clone()) {
                    n += 1;
                    name = format!("{base}.{n}");
                }
                name
            })
            .collect()
    }

    /// Rows after the header, minus the first `skip` of them.
    pub fn data_rows(&self, skip: usize) -> impl Iterator<Item = &[GridCell]> {
        self.rows.iter().skip(1 + skip).map(Vec::as_slice)
    }

    /// Total rows including the header.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }
}

/// The link that represents a row: the second data cell's link (title) if
/// present, otherwise the first data cell's (artist).
///
/// Header cells (row labels such as a spanned release date) are not data
/// cells and are skipped. Data cells after the second are ignored.
pub fn primary_link(row: &[GridCell]) -> Option<&str> {
    let mut data = row.iter().filter(|c| !c.is_header);
    let artist = data.next().and_then(|c| c.href.as_deref());
    let title = data.next().and_then(|c| c.href.as_deref());
    title.or(artist)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// `<tr>` elements belonging to `table` itself, in order.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells(tr: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
}

/// Parse a span attribute. Missing, zero or invalid values count as 1.
fn span(cell: ElementRef<'_>, attr: &str, max: usize) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .map_or(1, |n| n.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(grid: &Grid) -> Vec<Vec<Option<&str>>> {
        grid.rows
            .iter()
            .map(|r| r.iter().map(|c| c.text.as_deref()).collect())
            .collect()
    }

    #[test]
    fn test_plain_table() {
        let grid = Grid::parse(
            "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap();

        assert_eq!(grid.header(), vec!["A", "B"]);
        assert_eq!(texts(&grid)[1], vec![Some("1"), Some("2")]);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 2);
    }

    #[test]
    fn test_rowspan_is_replicated() {
        let grid = Grid::parse(
            r#"<table>
                <tr><th>Date</th><th>Artist</th><th>Album</th></tr>
                <tr><td rowspan="3">January 8</td><td>A1</td><td>T1</td></tr>
                <tr><td>A2</td><td>T2</td></tr>
                <tr><td>A3</td><td>T3</td></tr>
            </table>"#,
        )
        .unwrap();

        let t = texts(&grid);
        assert_eq!(t[2], vec![Some("January 8"), Some("A2"), Some("T2")]);
        assert_eq!(t[3], vec![Some("January 8"), Some("A3"), Some("T3")]);
    }

    #[test]
    fn test_colspan_and_rowspan_together() {
        let grid = Grid::parse(
            r#"<table>
                <tr><th>a</th><th>b</th><th>c</th></tr>
                <tr><td colspan="2" rowspan="2">X</td><td>1</td></tr>
                <tr><td>2</td></tr>
            </table>"#,
        )
        .unwrap();

        let t = texts(&grid);
        assert_eq!(t[1], vec![Some("X"), Some("X"), Some("1")]);
        assert_eq!(t[2], vec![Some("X"), Some("X"), Some("2")]);
    }

    #[test]
    fn test_spanned_link_is_replicated() {
        let grid = Grid::parse(
            r#"<table>
                <tr><th>Artist</th><th>Album</th></tr>
                <tr><td rowspan="2"><a href="/wiki/Band">Band</a></td><td><a href="/wiki/First">First</a></td></tr>
                <tr><td>Second</td></tr>
            </table>"#,
        )
        .unwrap();

        let rows: Vec<_> = grid.data_rows(0).collect();
        assert_eq!(primary_link(rows[0]), Some("/wiki/First"));
        assert_eq!(primary_link(rows[1]), Some("/wiki/Band"));
    }

    #[test]
    fn test_rowspan_past_last_row_is_clipped() {
        let grid = Grid::parse(
            r#"<table><tr><th>a</th><th>b</th></tr><tr><td rowspan="9">x</td><td>y</td></tr></table>"#,
        )
        .unwrap();
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let grid = Grid::parse(
            "<table><tr><th>a</th><th>b</th><th>c</th></tr><tr><td>1</td></tr></table>",
        )
        .unwrap();
        assert_eq!(texts(&grid)[1], vec![Some("1"), None, None]);
    }

    #[test]
    fn test_wide_row_is_ragged() {
        let err = Grid::parse(
            "<table><tr><th>a</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap_err();

        assert_eq!(
            err,
            GridError::Ragged {
                row: 1,
                width: 2,
                header_width: 1
            }
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(Grid::parse("<table></table>").unwrap_err(), GridError::Empty);
        assert_eq!(Grid::parse("<p>no table</p>").unwrap_err(), GridError::Empty);
    }

    #[test]
    fn test_nested_table_rows_are_excluded() {
        let grid = Grid::parse(
            r#"<table>
                <tr><th>a</th></tr>
                <tr><td><table><tr><td>inner</td></tr><tr><td>inner2</td></tr></table></td></tr>
            </table>"#,
        )
        .unwrap();
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn test_header_names() {
        let grid = Grid::parse(
            "<table><tr><th>Ref.</th><th></th><th>Ref.</th><th>Ref.</th></tr></table>",
        )
        .unwrap();
        assert_eq!(grid.header(), vec!["Ref.", "Unnamed: 1", "Ref..1", "Ref..2"]);
    }

    #[test]
    fn test_invalid_spans_count_as_one() {
        let grid = Grid::parse(
            r#"<table><tr><th colspan="0">a</th><th colspan="x">b</th></tr></table>"#,
        )
        .unwrap();
        assert_eq!(grid.width(), 2);
    }

    fn cell(text: &str, href: Option<&str>) -> GridCell {
        GridCell {
            text: Some(text.into()),
            href: href.map(Into::into),
            is_header: false,
        }
    }

    #[test]
    fn test_primary_link_prefers_title() {
        let artist = cell("A", Some("/wiki/Artist"));
        let title = cell("T", Some("/wiki/Title"));
        let plain = cell("x", None);
        let third = cell("G", Some("/wiki/Genre"));

        assert_eq!(primary_link(&[artist.clone(), title.clone()]), Some("/wiki/Title"));
        assert_eq!(primary_link(&[artist.clone(), plain.clone()]), Some("/wiki/Artist"));
        assert_eq!(primary_link(&[plain.clone(), title]), Some("/wiki/Title"));
        assert_eq!(primary_link(&[plain.clone(), plain.clone(), third]), None);
        assert_eq!(primary_link(&[]), None);
    }

    #[test]
    fn test_primary_link_skips_row_header_cells() {
        let grid = Grid::parse(
            r#"<table>
                <tr><th>Release date</th><th>Artist</th><th>Album</th></tr>
                <tr><th rowspan="2"><a href="/wiki/January_8">January 8</a></th><td><a href="/wiki/Artist_One">Artist One</a></td><td><a href="/wiki/Album_One">Album One</a></td></tr>
                <tr><td><a href="/wiki/Artist_Two">Artist Two</a></td><td>Untitled</td></tr>
            </table>"#,
        )
        .unwrap();

        let rows: Vec<_> = grid.data_rows(0).collect();
        assert!(rows[1][0].is_header);
        assert_eq!(rows[1][0].text.as_deref(), Some("January 8"));
        assert_eq!(primary_link(rows[0]), Some("/wiki/Album_One"));
        assert_eq!(primary_link(rows[1]), Some("/wiki/Artist_Two"));
    }

    #[test]
    fn test_cell_text_is_normalized() {
        let grid = Grid::parse(
            "<table><tr><th>  Release\n   date </th></tr><tr><td>   </td></tr></table>",
        )
        .unwrap();
        assert_eq!(grid.header(), vec!["Release date"]);
        assert_eq!(texts(&grid)[1], vec![None]);
    }
}
