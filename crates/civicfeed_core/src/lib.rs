//! Core feed logic for CivicFeed.
//! This crate is the single source of truth for paging and shuffle invariants.

pub mod cache;
pub mod config;
pub mod contacts;
pub mod db;
pub mod logging;
pub mod model;
pub mod paging;
pub mod service;
pub mod shuffle;

pub use cache::{
    coordinate_key, get_or_fetch, CacheError, CacheResult, CacheStore, MemoryCacheStore,
    SqliteCacheStore,
};
pub use config::{ConfigError, FeedConfig};
pub use contacts::{contact_key, parse_csv, ContactDirectory, ContactsError};
pub use logging::{default_log_level, init_logging, logging_status, resolve_level};
pub use model::list_item::{ItemIdentity, ListItem, ListItemValidationError, Titled};
pub use model::page::{Page, PageRequest, PageRequestError, DEFAULT_PAGE_LIMIT};
pub use paging::aggregator::{
    AggregationSnapshot, AggregationState, Aggregator, FetchOutcome, PendingFetch, SkipReason,
};
pub use paging::http::{decode_page, EndpointConfig, HttpPageSource};
pub use paging::source::{FetchError, FetchResult, PageSource};
pub use service::feed_service::FeedService;
pub use shuffle::{compute_seed, key_token, shuffle, shuffle_in_place, shuffled_order};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
