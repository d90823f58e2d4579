//! Paginated aggregation state machine.
//!
//! # Responsibility
//! - Track offset, dedup index and end-of-collection for one session.
//! - Apply fetched pages in order, dropping stale results after `reset()`.
//!
//! # Invariants
//! - `is_loading` is the single-writer guard: at most one fetch in flight.
//! - `identity` values in `items` are unique.
//! - `offset` advances by `limit` per applied page, regardless of how many
//!   items survived dedup.
//! - A failed fetch leaves `offset`, `items` and `can_load_more` unchanged.
//! - A fetch future dropped before completion releases `is_loading` and
//!   leaves everything else unchanged.

use crate::model::list_item::{ItemIdentity, ListItem};
use crate::model::page::{Page, PageRequest, PageRequestError};
use crate::paging::source::{FetchError, FetchResult, PageSource};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use uuid::Uuid;

/// Why a fetch request did not issue a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is still in flight.
    Loading,
    /// The last applied page was short.
    Exhausted,
}

/// Result of one `fetch_next_page` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Skipped(SkipReason),
    Applied {
        appended: usize,
        duplicates: usize,
        rejected: usize,
    },
    /// The state was reset while the fetch was in flight.
    Discarded,
}

/// Ticket for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFetch {
    pub request: PageRequest,
    generation: u64,
}

/// Point-in-time copy of aggregation state for callers.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSnapshot {
    pub items: Vec<ListItem>,
    pub offset: u32,
    pub can_load_more: bool,
    pub is_loading: bool,
    pub last_error: Option<FetchError>,
}

/// Synchronous aggregation state.
///
/// Split into `begin_fetch`/`complete_fetch` so the network round-trip can
/// happen without holding any borrow of the state.
#[derive(Debug, Clone)]
pub struct AggregationState {
    items: Vec<ListItem>,
    seen: HashSet<ItemIdentity>,
    offset: u32,
    limit: u32,
    can_load_more: bool,
    is_loading: bool,
    last_error: Option<FetchError>,
    generation: u64,
}

impl AggregationState {
    pub fn new(limit: u32) -> Result<Self, PageRequestError> {
        PageRequest::new(0, limit)?;
        Ok(Self {
            items: Vec::new(),
            seen: HashSet::new(),
            offset: 0,
            limit,
            can_load_more: true,
            is_loading: false,
            last_error: None,
            generation: 0,
        })
    }

    /// Clears items and restarts from offset 0.
    ///
    /// Any fetch issued before this call completes as `Discarded`.
    pub fn reset(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.offset = 0;
        self.can_load_more = true;
        self.is_loading = false;
        self.last_error = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Checks the guard and marks the state as loading.
    pub fn begin_fetch(&mut self) -> Result<PendingFetch, SkipReason> {
        if self.is_loading {
            return Err(SkipReason::Loading);
        }
        if !self.can_load_more {
            return Err(SkipReason::Exhausted);
        }

        self.is_loading = true;
        Ok(PendingFetch {
            request: PageRequest {
                offset: self.offset,
                limit: self.limit,
            },
            generation: self.generation,
        })
    }

    /// Applies the result of a fetch started by `begin_fetch`.
    pub fn complete_fetch(
        &mut self,
        pending: PendingFetch,
        result: FetchResult<Page>,
    ) -> FetchResult<FetchOutcome> {
        if pending.generation != self.generation {
            return Ok(FetchOutcome::Discarded);
        }

        self.is_loading = false;
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let can_load_more = page.is_full(pending.request.limit);
        let mut appended = 0;
        let mut duplicates = 0;
        let mut rejected = 0;
        for item in page.items {
            if item.validate().is_err() {
                rejected += 1;
                continue;
            }
            if !self.seen.insert(item.identity.clone()) {
                duplicates += 1;
                continue;
            }
            self.items.push(item);
            appended += 1;
        }

        match pending.request.next() {
            Some(next) => {
                self.can_load_more = can_load_more;
                self.offset = next.offset;
            }
            None => {
                self.can_load_more = false;
                self.offset = u32::MAX;
            }
        }
        self.last_error = None;

        Ok(FetchOutcome::Applied {
            appended,
            duplicates,
            rejected,
        })
    }

    /// Releases the loading guard for a fetch that will never complete.
    ///
    /// Returns whether the guard was released; stale tickets are ignored.
    pub fn abandon_fetch(&mut self, pending: PendingFetch) -> bool {
        if pending.generation != self.generation || !self.is_loading {
            return false;
        }
        self.is_loading = false;
        true
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn can_load_more(&self) -> bool {
        self.can_load_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> AggregationSnapshot {
        AggregationSnapshot {
            items: self.items.clone(),
            offset: self.offset,
            can_load_more: self.can_load_more,
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
        }
    }
}

/// Shareable aggregation session driving one `AggregationState`.
///
/// The inner lock is only held for bookkeeping, never across an `.await`.
#[derive(Debug)]
pub struct Aggregator {
    session_id: Uuid,
    state: Mutex<AggregationState>,
}

impl Aggregator {
    pub fn new(limit: u32) -> Result<Self, PageRequestError> {
        Ok(Self {
            session_id: Uuid::new_v4(),
            state: Mutex::new(AggregationState::new(limit)?),
        })
    }

    /// Identifier attached to this session's log events.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.reset();
        info!(
            "event=aggregation_reset module=paging status=ok session={} generation={}",
            self.session_id,
            state.generation()
        );
    }

    /// Fetches and applies the next page from `source`.
    ///
    /// Returns `Skipped` without touching the network when a fetch is in
    /// flight or the collection is exhausted.
    ///
    /// # Errors
    /// - Returns the source's `FetchError` unchanged; it is also kept as
    ///   `last_error` until the next successful page or reset.
    pub async fn fetch_next_page<S>(&self, source: &S) -> FetchResult<FetchOutcome>
    where
        S: PageSource + ?Sized,
    {
        let begin = self.lock().begin_fetch();
        let pending = match begin {
            Ok(pending) => pending,
            Err(reason) => return Ok(FetchOutcome::Skipped(reason)),
        };

        let started_at = Instant::now();
        info!(
            "event=page_fetch module=paging status=start session={} offset={} limit={}",
            self.session_id, pending.request.offset, pending.request.limit
        );

        let mut in_flight = InFlight {
            state: &self.state,
            session_id: self.session_id,
            pending: Some(pending),
        };
        let result = source.fetch_page(pending.request).await;
        in_flight.disarm();
        let raw_count = result.as_ref().map_or(0, |page| page.raw_count);
        let outcome = self.lock().complete_fetch(pending, result);
        let duration_ms = started_at.elapsed().as_millis();

        match &outcome {
            Ok(FetchOutcome::Applied {
                appended,
                duplicates,
                rejected,
            }) => info!(
                "event=page_fetch module=paging status=ok session={} offset={} raw_count={} appended={} duplicates={} rejected={} duration_ms={}",
                self.session_id,
                pending.request.offset,
                raw_count,
                appended,
                duplicates,
                rejected,
                duration_ms
            ),
            Ok(FetchOutcome::Discarded) => info!(
                "event=page_fetch module=paging status=discarded session={} offset={} duration_ms={}",
                self.session_id, pending.request.offset, duration_ms
            ),
            Ok(FetchOutcome::Skipped(_)) => {}
            Err(err) => warn!(
                "event=page_fetch module=paging status=error session={} offset={} error_code={} duration_ms={} error={}",
                self.session_id,
                pending.request.offset,
                err.code(),
                duration_ms,
                err
            ),
        }

        outcome
    }

    pub fn snapshot(&self) -> AggregationSnapshot {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, AggregationState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<AggregationState>) -> MutexGuard<'_, AggregationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the loading guard if the fetch future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a Mutex<AggregationState>,
    session_id: Uuid,
    pending: Option<PendingFetch>,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.pending = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if lock_state(self.state).abandon_fetch(pending) {
            warn!(
                "event=page_fetch module=paging status=cancelled session={} offset={}",
                self.session_id, pending.request.offset
            );
        }
    }
}
