//! Data models for extracted table rows and the run result.
//!
//! - [`Record`]: one logical table row, column header → cell value
//! - [`RowFailure`] / [`RowOutcome`]: the result of enriching one row
//! - [`TableOutcome`]: per-table aggregate of row outcomes
//! - [`ResultSet`]: the accumulated output of a run, serialized to JSON
//!
//! `Record` and `ResultSet` implement `Serialize` by hand so that column order
//! and the `{"bad_tables": n, "0": [...], ...}` layout are preserved exactly.

use crate::error::{GridError, LookupError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Column name for the article link appended to every record.
pub const LINKS_COLUMN: &str = "links";
/// Column name for the cover image appended to every record.
pub const IMAGES_COLUMN: &str = "images";

/// One row of a rendered table.
///
/// Keys keep insertion order, which is the header's column order followed by
/// the derived `links` and `images` columns. A `None` value serializes as
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// The value under `key`, or `None` when the key is absent or the value is null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A data row whose image lookup failed.
#[derive(Debug)]
pub struct RowFailure {
    /// Zero-based position among the table's data rows.
    pub row: usize,
    /// The absolute article link that was looked up.
    pub link: String,
    pub error: LookupError,
}

/// Result of enriching a single data row.
pub type RowOutcome = Result<Record, RowFailure>;

/// Result of converting one table fragment.
#[derive(Debug)]
pub enum TableOutcome {
    /// Every row was enriched.
    Complete(Vec<Record>),
    /// Some rows failed their image lookup.
    Partial {
        records: Vec<Record>,
        failures: Vec<RowFailure>,
    },
    /// The table could not be rendered at all.
    Failed(GridError),
}

impl TableOutcome {
    /// Fold per-row outcomes into a table outcome.
    pub fn from_rows(rows: Vec<RowOutcome>) -> Self {
        let (records, failures): (Vec<_>, Vec<_>) = rows.into_iter().partition(Result::is_ok);
        let records: Vec<Record> = records.into_iter().flatten().collect();
        let failures: Vec<RowFailure> = failures.into_iter().filter_map(Result::err).collect();

        if failures.is_empty() {
            TableOutcome::Complete(records)
        } else {
            TableOutcome::Partial { records, failures }
        }
    }
}

/// Accumulated output of a run.
///
/// Serializes as `{"bad_tables": n, "<index>": [records], ...}` with table
/// indices in ascending order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Tables that produced no output entry.
    pub bad_tables: usize,
    /// Records per table index.
    pub tables: BTreeMap<usize, Vec<Record>>,
}

impl ResultSet {
    /// Record the outcome of table `index`.
    ///
    /// `Complete` tables are stored and `Failed` tables are counted. `Partial`
    /// tables are counted as bad unless `keep_partial` is set, in which case
    /// their successful records are stored.
    pub fn absorb(&mut self, index: usize, outcome: TableOutcome, keep_partial: bool) {
        match outcome {
            TableOutcome::Complete(records) => {
                self.tables.insert(index, records);
            }
            TableOutcome::Partial { records, .. } if keep_partial => {
                self.tables.insert(index, records);
            }
            TableOutcome::Partial { .. } | TableOutcome::Failed(_) => {
                self.bad_tables += 1;
            }
        }
    }

    /// Total number of records across all stored tables.
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len() + 1))?;
        map.serialize_entry("bad_tables", &self.bad_tables)?;
        for (index, records) in &self.tables {
            map.serialize_entry(&index.to_string(), records)?;
        }
        map.end()
    }
}
