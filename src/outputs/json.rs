//! JSON output of the run result.
//!
//! # Output Structure
//!
//! ```text
//! {"bad_tables": 1, "0": [{"Artist": "...", ..., "links": "...", "images": "..."}], "2": [...]}
//! ```
//!
//! The file is overwritten on every run.

use crate::models::ResultSet;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `results` and write it to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_result_set(results: &ResultSet, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(results)?;

    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create output directory");
        return Err(e);
    }

    fs::write(path, json).await?;
    info!(
        tables = results.tables.len(),
        bad_tables = results.bad_tables,
        "Wrote JSON result"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, TableOutcome};

    #[tokio::test]
    async fn test_write_result_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data.json");

        let mut record = Record::new();
        record.insert("Album", Some("Foo".to_string()));
        record.insert("links", None);
        let mut results = ResultSet::default();
        results.absorb(0, TableOutcome::Complete(vec![record]), false);

        write_result_set(&results, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, r#"{"bad_tables":0,"0":[{"Album":"Foo","links":null}]}"#);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "old contents that are longer than the new ones").unwrap();

        write_result_set(&ResultSet::default(), &path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"bad_tables":0}"#);
    }
}
