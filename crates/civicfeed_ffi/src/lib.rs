//! Flutter-facing bindings for `civicfeed_core`.

pub mod api;
