//! Feed use-case service.
//!
//! # Responsibility
//! - Drive one aggregation session against one page source.
//! - Offer refresh / load-more entry points for pull-to-refresh and
//!   infinite-scroll callers.
//! - Expose the aggregated list in deterministic shuffled order.
//!
//! # Invariants
//! - `refresh()` always restarts from offset 0.
//! - Service APIs never bypass the aggregator's loading guard.

use crate::model::list_item::ListItem;
use crate::model::page::PageRequestError;
use crate::paging::aggregator::{AggregationSnapshot, Aggregator, FetchOutcome};
use crate::paging::source::{FetchResult, PageSource};
use crate::shuffle::shuffle;

/// Use-case service wrapping one aggregator and its page source.
pub struct FeedService<S: PageSource> {
    source: S,
    aggregator: Aggregator,
}

impl<S: PageSource> FeedService<S> {
    /// Creates a service paging `source` in windows of `limit` records.
    pub fn new(source: S, limit: u32) -> Result<Self, PageRequestError> {
        Ok(Self {
            source,
            aggregator: Aggregator::new(limit)?,
        })
    }

    /// Resets the session and fetches the first page.
    pub async fn refresh(&self) -> FetchResult<FetchOutcome> {
        self.aggregator.reset();
        self.aggregator.fetch_next_page(&self.source).await
    }

    /// Fetches the next page if one may exist and none is in flight.
    pub async fn load_more(&self) -> FetchResult<FetchOutcome> {
        self.aggregator.fetch_next_page(&self.source).await
    }

    /// Clears the session without fetching, e.g. on a filter change.
    pub fn reset(&self) {
        self.aggregator.reset();
    }

    pub fn snapshot(&self) -> AggregationSnapshot {
        self.aggregator.snapshot()
    }

    /// Current items in content-derived shuffled order.
    pub fn shuffled_items(&self) -> Vec<ListItem> {
        shuffle(self.aggregator.snapshot().items)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}
