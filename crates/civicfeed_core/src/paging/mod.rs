//! Offset-based paginated aggregation.
//!
//! # Responsibility
//! - Define the page-source seam over paged REST collections.
//! - Merge fetched pages into one deduplicated, insertion-ordered list.
//! - Detect end-of-collection from short pages.
//!
//! # Invariants
//! - Page fetches are strictly sequential per aggregation state.
//! - `offset` advances by exactly `limit` per applied page.
//! - Results of fetches issued before a `reset()` are discarded.

pub mod aggregator;
pub mod http;
pub mod source;
