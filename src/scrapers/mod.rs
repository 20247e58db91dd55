//! Source page scrapers.
//!
//! - [`wiki`]: fetch a Wikipedia page and locate its data tables
//!
//! Scrapers only deal with getting HTML and cutting it into table fragments.
//! Turning fragments into records is done by [`crate::tables`].

pub mod wiki;
