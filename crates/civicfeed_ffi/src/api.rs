//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Let the host keep its own item structs: shuffle calls work on titles
//!   and return indices or titles only.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Identical title lists yield identical results on every platform.

use civicfeed_core::{
    compute_seed, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, shuffle, shuffled_order, ContactDirectory,
};
use log::warn;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Shuffle seed derived from `titles`.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_seed(titles: Vec<String>) -> u64 {
    compute_seed(&titles)
}

/// Shuffle permutation for `titles` as source indices.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - `result[k]` is the index in `titles` of the item shown at position `k`.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_shuffle_order(titles: Vec<String>) -> Vec<u32> {
    shuffled_order(&titles)
        .into_iter()
        .map(|index| u32::try_from(index).unwrap_or(u32::MAX))
        .collect()
}

/// `titles` in shuffled order.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_shuffle_titles(titles: Vec<String>) -> Vec<String> {
    shuffle(titles)
}

/// Looks up a member's contact email in headed `id,email` CSV text.
///
/// # FFI contract
/// - Sync call, pure computation over the given text.
/// - Never panics; malformed CSV and unknown members both yield `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_lookup(csv_text: String, member_id: String) -> Option<String> {
    let directory = match ContactDirectory::from_csv(&csv_text) {
        Ok(directory) => directory,
        Err(err) => {
            warn!("event=contact_lookup module=ffi status=error error={err}");
            return None;
        }
    };
    directory.lookup(&member_id).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::{
        contact_lookup, core_version, feed_seed, feed_shuffle_order, feed_shuffle_titles,
        init_logging, ping,
    };

    fn titles(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn shuffle_order_matches_shuffled_titles() {
        let input = titles(&[
            "House passes budget",
            "Senate confirms nominee",
            "Governor signs order",
            "Court hears appeal",
            "Council debates zoning",
        ]);
        let order = feed_shuffle_order(input.clone());
        let shuffled = feed_shuffle_titles(input.clone());
        let by_index = order
            .iter()
            .map(|index| input[*index as usize].clone())
            .collect::<Vec<_>>();
        assert_eq!(by_index, shuffled);
    }

    #[test]
    fn two_titles_swap() {
        assert_eq!(feed_seed(titles(&["Bill A", "Act Z"])), 25);
        assert_eq!(feed_shuffle_order(titles(&["Bill A", "Act Z"])), vec![1, 0]);
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(feed_shuffle_order(Vec::new()).is_empty());
        assert!(feed_shuffle_titles(Vec::new()).is_empty());
    }

    #[test]
    fn contact_lookup_finds_member() {
        let csv = "id,email\nA000360,senator@example.gov\n".to_string();
        assert_eq!(
            contact_lookup(csv.clone(), " A000360 ".to_string()).as_deref(),
            Some("senator@example.gov")
        );
        assert_eq!(contact_lookup(csv, "B000001".to_string()), None);
    }

    #[test]
    fn contact_lookup_tolerates_malformed_csv() {
        assert_eq!(
            contact_lookup("id,email\nA1,\"open".to_string(), "A1".to_string()),
            None
        );
    }
}
