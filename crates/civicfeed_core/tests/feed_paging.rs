use async_trait::async_trait;
use civicfeed_core::{
    Aggregator, FeedService, FetchError, FetchOutcome, FetchResult, ItemIdentity, ListItem, Page,
    PageRequest, PageSource, SkipReason,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Serves a fixed collection, optionally overlapping page boundaries.
struct MockCollection {
    records: Vec<ListItem>,
    overlap: usize,
    failures: Mutex<VecDeque<FetchError>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockCollection {
    fn new(total: usize) -> Self {
        Self {
            records: (0..total).map(bill).collect(),
            overlap: 0,
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    fn fail_next(&self, err: FetchError) {
        self.failures.lock().unwrap().push_back(err);
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockCollection {
    async fn fetch_page(&self, request: PageRequest) -> FetchResult<Page> {
        self.requests.lock().unwrap().push(request);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let start = (request.offset as usize)
            .saturating_sub(if request.offset > 0 { self.overlap } else { 0 })
            .min(self.records.len());
        let end = (start + request.limit as usize).min(self.records.len());
        Ok(Page::from_items(self.records[start..end].to_vec()))
    }
}

/// Blocks its first fetch until released.
struct GatedSource {
    started: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl PageSource for GatedSource {
    async fn fetch_page(&self, _request: PageRequest) -> FetchResult<Page> {
        let started = self.started.lock().unwrap().take();
        if let Some(started) = started {
            let _ = started.send(());
        }
        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            let _ = release.await;
        }
        Ok(Page::from_items((0..20).map(bill).collect()))
    }
}

/// Never answers.
struct StalledSource;

#[async_trait]
impl PageSource for StalledSource {
    async fn fetch_page(&self, _request: PageRequest) -> FetchResult<Page> {
        std::future::pending().await
    }
}

fn bill(n: usize) -> ListItem {
    let number = n.to_string();
    ListItem::new(
        ItemIdentity::composite(["118", "hr", number.as_str()]),
        format!("H.R. {n} Appropriations Act"),
    )
}

#[tokio::test]
async fn walks_collection_until_short_page() {
    let source = MockCollection::new(45);
    let aggregator = Aggregator::new(20).unwrap();

    for _ in 0..3 {
        let outcome = aggregator.fetch_next_page(&source).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Applied { .. }));
    }

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.items.len(), 45);
    assert!(!snapshot.can_load_more);
    assert_eq!(snapshot.offset, 60);
    assert!(!snapshot.is_loading);

    let outcome = aggregator.fetch_next_page(&source).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::Exhausted));
    assert_eq!(source.requests().len(), 3);
}

#[tokio::test]
async fn exactly_full_last_page_needs_one_more_empty_fetch() {
    let source = MockCollection::new(40);
    let aggregator = Aggregator::new(20).unwrap();

    aggregator.fetch_next_page(&source).await.unwrap();
    aggregator.fetch_next_page(&source).await.unwrap();
    assert!(aggregator.snapshot().can_load_more);

    let outcome = aggregator.fetch_next_page(&source).await.unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Applied {
            appended: 0,
            duplicates: 0,
            rejected: 0,
        }
    );
    assert!(!aggregator.snapshot().can_load_more);
}

#[tokio::test]
async fn overlapping_pages_are_deduplicated_but_offset_advances() {
    let source = MockCollection::new(100).with_overlap(3);
    let aggregator = Aggregator::new(20).unwrap();

    aggregator.fetch_next_page(&source).await.unwrap();
    let outcome = aggregator.fetch_next_page(&source).await.unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Applied {
            appended: 17,
            duplicates: 3,
            rejected: 0,
        }
    );

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.items.len(), 37);
    assert_eq!(snapshot.offset, 40);

    let mut identities = snapshot
        .items
        .iter()
        .map(|item| item.identity.clone())
        .collect::<Vec<_>>();
    identities.sort();
    identities.dedup();
    assert_eq!(identities.len(), 37);
}

#[tokio::test]
async fn reset_restarts_from_offset_zero() {
    let source = MockCollection::new(45);
    let aggregator = Aggregator::new(20).unwrap();
    aggregator.fetch_next_page(&source).await.unwrap();
    aggregator.fetch_next_page(&source).await.unwrap();

    aggregator.reset();
    let snapshot = aggregator.snapshot();
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.offset, 0);
    assert!(snapshot.can_load_more);

    aggregator.fetch_next_page(&source).await.unwrap();
    let requests = source.requests();
    assert_eq!(requests.last().unwrap().offset, 0);
    assert_eq!(aggregator.len(), 20);
}

#[tokio::test]
async fn network_failure_keeps_state_and_retry_reissues_same_page() {
    let source = MockCollection::new(45);
    let aggregator = Aggregator::new(20).unwrap();
    aggregator.fetch_next_page(&source).await.unwrap();

    source.fail_next(FetchError::status(502, "bad gateway"));
    let err = aggregator.fetch_next_page(&source).await.unwrap_err();
    assert!(matches!(err, FetchError::Network { status: Some(502), .. }));

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.items.len(), 20);
    assert_eq!(snapshot.offset, 20);
    assert!(snapshot.can_load_more);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.last_error, Some(err));

    aggregator.fetch_next_page(&source).await.unwrap();
    let requests = source.requests();
    assert_eq!(requests[1], requests[2]);
    assert_eq!(requests[2], PageRequest::new(20, 20).unwrap());
    assert!(aggregator.snapshot().last_error.is_none());
}

#[tokio::test]
async fn decode_failure_is_reported_to_caller() {
    let source = MockCollection::new(5);
    source.fail_next(FetchError::decode("expected value at line 1"));
    let aggregator = Aggregator::new(20).unwrap();

    let err = aggregator.fetch_next_page(&source).await.unwrap_err();
    assert_eq!(err.code(), "decode_error");
    assert_eq!(aggregator.snapshot().offset, 0);
}

#[tokio::test]
async fn in_flight_fetch_blocks_overlap_and_is_discarded_after_reset() {
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    let gated = Arc::new(GatedSource {
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(Some(release_rx)),
    });
    let aggregator = Arc::new(Aggregator::new(20).unwrap());

    let task = {
        let aggregator = Arc::clone(&aggregator);
        let gated = Arc::clone(&gated);
        tokio::spawn(async move { aggregator.fetch_next_page(gated.as_ref()).await })
    };
    started_rx.await.unwrap();
    assert!(aggregator.snapshot().is_loading);

    let idle = MockCollection::new(45);
    let overlap = aggregator.fetch_next_page(&idle).await.unwrap();
    assert_eq!(overlap, FetchOutcome::Skipped(SkipReason::Loading));
    assert!(idle.requests().is_empty());

    aggregator.reset();
    aggregator.fetch_next_page(&idle).await.unwrap();
    release_tx.send(()).unwrap();

    let stale = task.await.unwrap().unwrap();
    assert_eq!(stale, FetchOutcome::Discarded);
    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.items.len(), 20);
    assert_eq!(snapshot.offset, 20);
    assert_eq!(snapshot.items[0].identity.as_str(), "118:hr:0");
}

#[tokio::test]
async fn cancelled_fetch_releases_loading_guard() {
    let source = MockCollection::new(45);
    let aggregator = Aggregator::new(20).unwrap();
    aggregator.fetch_next_page(&source).await.unwrap();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        aggregator.fetch_next_page(&StalledSource),
    )
    .await;
    assert!(timed_out.is_err());

    let snapshot = aggregator.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.offset, 20);
    assert_eq!(snapshot.items.len(), 20);
    assert!(snapshot.last_error.is_none());

    let outcome = aggregator.fetch_next_page(&source).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Applied { appended: 20, .. }));
    let offsets = source
        .requests()
        .iter()
        .map(|request| request.offset)
        .collect::<Vec<_>>();
    assert_eq!(offsets, vec![0, 20]);
}

#[tokio::test]
async fn feed_service_refresh_and_shuffle() {
    let service = FeedService::new(MockCollection::new(25), 10).unwrap();
    service.refresh().await.unwrap();
    service.load_more().await.unwrap();
    assert_eq!(service.snapshot().items.len(), 20);

    service.refresh().await.unwrap();
    assert_eq!(service.snapshot().items.len(), 10);
    let offsets = service
        .source()
        .requests()
        .iter()
        .map(|request| request.offset)
        .collect::<Vec<_>>();
    assert_eq!(offsets, vec![0, 10, 0]);

    let shuffled = service.shuffled_items();
    assert_eq!(shuffled, service.shuffled_items());
    assert_eq!(shuffled.len(), 10);

    service.reset();
    assert!(service.snapshot().items.is_empty());
    assert!(service.shuffled_items().is_empty());
}
