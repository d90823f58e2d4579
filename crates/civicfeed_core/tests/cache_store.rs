use civicfeed_core::{
    coordinate_key, get_or_fetch, CacheError, CacheStore, MemoryCacheStore, SqliteCacheStore,
};
use std::cell::Cell;

#[derive(Debug)]
enum LookupError {
    Upstream(String),
    Cache(CacheError),
}

impl From<CacheError> for LookupError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let key = coordinate_key(38.8977, -77.0365).unwrap();

    let store = SqliteCacheStore::open(&path).unwrap();
    store.put(&key, r#"{"district":"DC-AL"}"#).unwrap();
    store.put(&key, r#"{"district":"DC-00"}"#).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    drop(store);

    let reopened = SqliteCacheStore::open(&path).unwrap();
    assert_eq!(
        reopened.get(&key).unwrap().as_deref(),
        Some(r#"{"district":"DC-00"}"#)
    );
}

#[test]
fn sqlite_store_clears_by_namespace() {
    let store = SqliteCacheStore::open_in_memory().unwrap();
    store.put("geo:1.00:2.00", "{}").unwrap();
    store.put("contact:A000360", "office@senate.example").unwrap();

    assert_eq!(store.clear_namespace("geo").unwrap(), 1);
    assert!(store.get("geo:1.00:2.00").unwrap().is_none());
    assert!(store.remove("contact:A000360").unwrap());
    assert!(store.is_empty().unwrap());
    assert_eq!(store.clear().unwrap(), 0);
}

#[tokio::test]
async fn get_or_fetch_uses_cache_until_forced() {
    let store = MemoryCacheStore::new();
    let key = coordinate_key(40.7128, -74.0060).unwrap();
    let calls = Cell::new(0);

    for _ in 0..2 {
        let value = get_or_fetch(&store, &key, false, || async {
            calls.set(calls.get() + 1);
            Ok::<_, LookupError>("NY-10".to_string())
        })
        .await
        .unwrap();
        assert_eq!(value, "NY-10");
    }
    assert_eq!(calls.get(), 1);

    let refreshed = get_or_fetch(&store, &key, true, || async {
        calls.set(calls.get() + 1);
        Ok::<_, LookupError>("NY-12".to_string())
    })
    .await
    .unwrap();
    assert_eq!(refreshed, "NY-12");
    assert_eq!(calls.get(), 2);
    assert_eq!(store.get(&key).unwrap().as_deref(), Some("NY-12"));
}

#[tokio::test]
async fn failed_fetch_stores_nothing() {
    let store = MemoryCacheStore::new();
    let err = get_or_fetch(&store, "geo:0.00:0.00", false, || async {
        Err::<String, _>(LookupError::Upstream("lookup service unavailable".to_string()))
    })
    .await
    .unwrap_err();

    match err {
        LookupError::Upstream(message) => assert!(message.contains("unavailable")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn blank_key_surfaces_cache_error() {
    let store = MemoryCacheStore::new();
    let err = get_or_fetch(&store, " ", false, || async {
        Ok::<_, LookupError>("unused".to_string())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, LookupError::Cache(CacheError::InvalidKey(_))));
}
