//! Output writers.
//!
//! - [`json`]: writes the [`crate::models::ResultSet`] as a single JSON file

pub mod json;
